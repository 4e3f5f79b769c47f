//! Local filesystem result store.
//!
//! This crate provides:
//! - Result blob write/read/delete keyed by job id
//! - Existence checks and path resolution
//! - TTL-based cleanup of expired results

pub mod error;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use store::{ResultStore, StoreConfig};
