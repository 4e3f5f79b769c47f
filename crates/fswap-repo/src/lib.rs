//! Durable boundaries for the FaceSwap backend.
//!
//! This crate defines the traits the core talks to its external
//! collaborators through:
//! - `JobRepo`: durable job records (authoritative after reaping)
//! - `UsageLedger`: per-caller admission counting
//! - `UserDirectory`: bearer token to user/tier resolution
//!
//! The `Memory*` implementations back tests and local runs; production
//! deployments put a relational store behind the same traits.

pub mod error;
pub mod job_repo;
pub mod usage;
pub mod users;

pub use error::{RepoError, RepoResult};
pub use job_repo::{JobRepo, MemoryJobRepo};
pub use usage::{MemoryUsageLedger, UsageLedger};
pub use users::{MemoryUserDirectory, UserDirectory, UserProfile};
