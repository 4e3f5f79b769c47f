//! Single-concurrency job execution loop.
//!
//! This crate provides:
//! - `Worker`: the one execution loop that dequeues in priority order
//!   and reacts to shutdown between jobs
//! - `processor`: per-job transform driving with unit-grained progress
//! - `UnitErrorPolicy`: the single decision point for per-unit errors

pub mod config;
pub mod error;
pub mod executor;
pub mod processor;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::{Worker, WorkerHandle};
pub use processor::{ProcessingContext, UnitErrorPolicy};
