//! Swap engine traits.

use fswap_models::JobInput;

use crate::error::EngineResult;

/// Outcome of advancing a session by one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitProgress {
    /// One unit was transformed and written to the sink
    Processed,
    /// The input is exhausted; call `finish`
    Exhausted,
}

/// Accumulated output of a finished session.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// Encoded result bytes
    pub bytes: Vec<u8>,
    /// File extension for the result, including the dot (".mp4", ".jpg")
    pub extension: String,
}

/// One in-flight transform over a single job's input.
///
/// Created by `SwapEngine::begin`; the worker calls `advance` once per
/// unit and `finish` after exhaustion. Dropping a session without
/// finishing must release any handles it opened.
pub trait TransformSession: Send {
    /// Total unit count, 0 when not known upfront.
    fn total_frames(&self) -> u64;

    /// Transform the next unit. Per-unit errors are recoverable at the
    /// caller's discretion; the session stays usable after one.
    fn advance(&mut self) -> EngineResult<UnitProgress>;

    /// Close the sink and return the encoded result.
    fn finish(self: Box<Self>) -> EngineResult<TransformOutput>;
}

/// The opaque face-swap computation supplied by a vision library.
pub trait SwapEngine: Send + Sync + 'static {
    /// Count faces in an encoded image.
    ///
    /// Returns `EngineError::NoFaceFound` when none is detected; with
    /// `many` set, counts every detected face instead of stopping at
    /// the most prominent one.
    fn probe_faces(&self, image: &[u8], label: &str, many: bool) -> EngineResult<usize>;

    /// Open a job's input and output sink.
    ///
    /// Any error here is terminal for the job and must not leak a
    /// partially opened handle.
    fn begin(&self, input: &JobInput) -> EngineResult<Box<dyn TransformSession>>;
}
