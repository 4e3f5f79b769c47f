//! Job definitions for queue processing.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::job_state::JobStatus;
use crate::tier::CallerKey;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of swap job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Single-image swap (one unit of work)
    Image,
    /// Frame-by-frame video swap
    Video,
}

impl JobKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Image => "image",
            JobKind::Video => "video",
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-job transform options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOptions {
    /// Swap every detected face instead of the most prominent one
    #[serde(default)]
    pub many_faces: bool,
    /// Run the premium face enhancement pass on the output
    #[serde(default)]
    pub enhance: bool,
}

/// Opaque input payload handed to the swap engine.
///
/// The temp files referenced here are owned by the job and must be
/// released after it reaches a terminal state, whatever the outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobInput {
    /// Kind of media behind `target_path`
    pub kind: JobKind,
    /// Temp file holding the source-face image
    pub source_path: PathBuf,
    /// Temp file holding the target image or video
    pub target_path: PathBuf,
    /// Transform options
    pub options: SwapOptions,
}

/// Durable job record persisted through the job repository.
///
/// This mirrors the live tracker state and becomes the authoritative
/// answer for status queries once the in-memory entry is reaped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Unique job ID
    pub id: JobId,
    /// Ledger key of the submitting caller, if it had one
    pub caller: Option<CallerKey>,
    /// Kind of job
    pub kind: JobKind,
    /// Current status
    pub status: JobStatus,
    /// Scheduling priority (0 = premium, 1 = standard/anonymous)
    pub priority: u8,
    /// Total frame count (0 until known)
    pub total_frames: u64,
    /// Frames processed so far
    pub processed_frames: u64,
    /// Error message if the job failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Path of the stored result, present once done
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_path: Option<String>,
    /// Options the job was submitted with
    pub options: SwapOptions,
    /// When the job was admitted
    pub created_at: DateTime<Utc>,
    /// When the job reached a terminal state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    /// Create a freshly admitted record in `queued` status.
    pub fn new(id: JobId, caller: Option<CallerKey>, kind: JobKind, priority: u8, options: SwapOptions) -> Self {
        Self {
            id,
            caller,
            kind,
            status: JobStatus::Queued,
            priority,
            total_frames: 0,
            processed_frames: 0,
            error: None,
            result_path: None,
            options,
            created_at: Utc::now(),
            finished_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_unique_and_opaque() {
        let a = JobId::new();
        let b = JobId::new();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 32);
    }

    #[test]
    fn test_job_kind_serde() {
        assert_eq!(serde_json::to_string(&JobKind::Video).unwrap(), "\"video\"");
        let kind: JobKind = serde_json::from_str("\"image\"").unwrap();
        assert_eq!(kind, JobKind::Image);
    }

    #[test]
    fn test_new_record_is_queued() {
        let record = JobRecord::new(JobId::new(), None, JobKind::Video, 1, SwapOptions::default());
        assert_eq!(record.status, JobStatus::Queued);
        assert_eq!(record.total_frames, 0);
        assert!(record.finished_at.is_none());
    }
}
