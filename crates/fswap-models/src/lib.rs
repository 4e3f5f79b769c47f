//! Shared data models for the FaceSwap backend.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs, job inputs and swap options
//! - Live job state for progress tracking
//! - Durable job records
//! - Caller tiers, limits and admission decisions

pub mod admission;
pub mod job;
pub mod job_state;
pub mod tier;

// Re-export common types
pub use admission::{AdmissionDecision, Admitted, RejectReason, QUOTA_RETRY_AFTER_SECS};
pub use job::{JobId, JobInput, JobKind, JobRecord, SwapOptions};
pub use job_state::{JobState, JobStateUpdate, JobStatus};
pub use tier::{CallerIdentity, CallerKey, Tier, TierLimits, MAX_IMAGE_BYTES, UNLIMITED};
