//! Priority job intake queue and live job-state tracker.
//!
//! This crate provides:
//! - `JobQueue`: priority-then-sequence ordered intake with atomic
//!   sequence assignment and a bounded-wait dequeue for the worker
//! - `JobStateTracker`: concurrency-safe map of live job state serving
//!   pollers while the worker writes per-unit progress

pub mod queue;
pub mod tracker;

pub use queue::{JobQueue, QueuedJob};
pub use tracker::JobStateTracker;
