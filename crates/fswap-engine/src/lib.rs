//! Frame-transform boundary for the FaceSwap backend.
//!
//! This crate defines the seam between the scheduler/worker core and the
//! vision library that performs the actual face swap:
//! - `SwapEngine` opens a job's input and probes images for faces
//! - `TransformSession` drives one job unit-by-unit
//! - `scripted` provides a scripted engine for workspace tests and
//!   dev-mode runs
//!
//! The worker treats every call as synchronous and potentially slow, so
//! sessions run inside `spawn_blocking`.

pub mod engine;
pub mod error;
pub mod scripted;

pub use engine::{SwapEngine, TransformOutput, TransformSession, UnitProgress};
pub use error::{EngineError, EngineResult};
