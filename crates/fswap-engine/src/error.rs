//! Engine error types.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors signalled by the frame-transform boundary.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No face detected in an image probe.
    ///
    /// For a single-image job this is a hard rejection before any
    /// queuing occurs; for video frames the engine passes the frame
    /// through instead of raising this.
    #[error("No face detected in {0} image")]
    NoFaceFound(String),

    #[error("Could not decode {0} image")]
    DecodeFailed(String),

    #[error("Could not open target media: {0}")]
    OpenFailed(String),

    #[error("Failed to create output sink: {0}")]
    SinkFailed(String),

    #[error("Frame {index} failed: {message}")]
    Frame { index: u64, message: String },

    #[error("Failed to encode result: {0}")]
    EncodeFailed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub fn no_face(label: impl Into<String>) -> Self {
        Self::NoFaceFound(label.into())
    }

    pub fn open_failed(msg: impl Into<String>) -> Self {
        Self::OpenFailed(msg.into())
    }

    pub fn frame(index: u64, message: impl Into<String>) -> Self {
        Self::Frame {
            index,
            message: message.into(),
        }
    }
}
