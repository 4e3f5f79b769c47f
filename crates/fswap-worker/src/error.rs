//! Worker error types.

use thiserror::Error;

/// Result type for worker operations.
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors terminal for a single job. None of these ever terminates the
/// worker loop itself.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("{0}")]
    Engine(#[from] fswap_engine::EngineError),

    #[error("Storage error: {0}")]
    Storage(#[from] fswap_storage::StorageError),

    #[error("Repository error: {0}")]
    Repo(#[from] fswap_repo::RepoError),

    /// Zero units processed is failure even without an exception.
    #[error("Video contained no readable frames")]
    EmptyInput,

    #[error("Transform task panicked: {0}")]
    TaskPanic(String),
}
