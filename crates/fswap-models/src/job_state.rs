//! Live job state for progress tracking and polling.
//!
//! `JobState` is the record the in-memory tracker owns while a job is
//! active. Pollers read snapshots of it; the worker mutates it through
//! `JobStateUpdate` merges.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Job processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is queued waiting for the worker
    #[default]
    Queued,
    /// Job is actively being processed
    Processing,
    /// Job completed successfully
    Done,
    /// Job failed with an error
    Failed,
}

impl JobStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Done => "done",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Live, mutable state of an in-flight job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobState {
    /// Current status
    pub status: JobStatus,
    /// Total frame count (0 until known)
    pub total_frames: u64,
    /// Frames processed so far
    pub processed_frames: u64,
    /// Error message, present only when failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Stored result path, present only when done
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_path: Option<String>,
    /// When the state was last updated
    pub updated_at: DateTime<Utc>,
}

impl JobState {
    /// Create a fresh state in `queued` status.
    pub fn queued() -> Self {
        Self {
            status: JobStatus::Queued,
            total_frames: 0,
            processed_frames: 0,
            error: None,
            result_path: None,
            updated_at: Utc::now(),
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply a partial update as an atomic field merge.
    ///
    /// A terminal status is write-once: further merges are dropped
    /// entirely, so a late worker write can never resurrect a job.
    pub fn apply(&mut self, update: JobStateUpdate) {
        if self.is_terminal() {
            return;
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(total) = update.total_frames {
            self.total_frames = total;
        }
        if let Some(processed) = update.processed_frames {
            // Progress only moves forward
            self.processed_frames = self.processed_frames.max(processed);
        }
        if let Some(error) = update.error {
            self.error = Some(error);
        }
        if let Some(path) = update.result_path {
            self.result_path = Some(path);
        }
        self.updated_at = Utc::now();
    }
}

impl Default for JobState {
    fn default() -> Self {
        Self::queued()
    }
}

/// Partial update merged into a `JobState`.
#[derive(Debug, Clone, Default)]
pub struct JobStateUpdate {
    pub status: Option<JobStatus>,
    pub total_frames: Option<u64>,
    pub processed_frames: Option<u64>,
    pub error: Option<String>,
    pub result_path: Option<String>,
}

impl JobStateUpdate {
    /// Transition to `processing`.
    pub fn processing() -> Self {
        Self {
            status: Some(JobStatus::Processing),
            ..Self::default()
        }
    }

    /// Record the total frame count once known.
    pub fn total_frames(total: u64) -> Self {
        Self {
            total_frames: Some(total),
            ..Self::default()
        }
    }

    /// Bump the processed-frame counter.
    pub fn progress(processed: u64) -> Self {
        Self {
            processed_frames: Some(processed),
            ..Self::default()
        }
    }

    /// Terminal success with the stored result path.
    pub fn done(processed: u64, result_path: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Done),
            processed_frames: Some(processed),
            result_path: Some(result_path.into()),
            ..Self::default()
        }
    }

    /// Terminal failure with a human-readable message.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_state_is_queued() {
        let state = JobState::queued();
        assert_eq!(state.status, JobStatus::Queued);
        assert_eq!(state.total_frames, 0);
        assert!(!state.is_terminal());
    }

    #[test]
    fn test_lifecycle_merges() {
        let mut state = JobState::queued();

        state.apply(JobStateUpdate::processing());
        assert_eq!(state.status, JobStatus::Processing);

        state.apply(JobStateUpdate::total_frames(10));
        assert_eq!(state.total_frames, 10);

        state.apply(JobStateUpdate::progress(3));
        assert_eq!(state.processed_frames, 3);
        // Status was not part of the merge
        assert_eq!(state.status, JobStatus::Processing);

        state.apply(JobStateUpdate::done(10, "/results/x.mp4"));
        assert_eq!(state.status, JobStatus::Done);
        assert_eq!(state.result_path.as_deref(), Some("/results/x.mp4"));
    }

    #[test]
    fn test_progress_never_decreases() {
        let mut state = JobState::queued();
        state.apply(JobStateUpdate::processing());
        state.apply(JobStateUpdate::progress(5));
        state.apply(JobStateUpdate::progress(3));
        assert_eq!(state.processed_frames, 5);
    }

    #[test]
    fn test_terminal_status_is_write_once() {
        let mut state = JobState::queued();
        state.apply(JobStateUpdate::failed("no readable frames"));
        assert_eq!(state.status, JobStatus::Failed);

        state.apply(JobStateUpdate::processing());
        assert_eq!(state.status, JobStatus::Failed);
        assert_eq!(state.error.as_deref(), Some("no readable frames"));
    }
}
