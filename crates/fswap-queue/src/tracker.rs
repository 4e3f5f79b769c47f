//! Live job-state tracker.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{Duration, Utc};
use tracing::debug;

use fswap_models::{JobId, JobState, JobStateUpdate};

/// Concurrency-safe map of live job state.
///
/// The single source of truth while a job is in memory. The worker
/// writes once per processed unit; any number of pollers read
/// concurrently. Every operation holds the lock for O(1) work (a map
/// lookup or a field merge), never anything proportional to job size.
pub struct JobStateTracker {
    states: Mutex<HashMap<JobId, JobState>>,
}

impl JobStateTracker {
    pub fn new() -> Self {
        Self {
            states: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<JobId, JobState>> {
        // Merges cannot leave a record half-written, so a poisoned lock
        // still guards a consistent map.
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a job in `queued` state. Called at admission, before
    /// the worker ever sees the job.
    pub fn create(&self, id: &JobId) {
        self.lock().insert(id.clone(), JobState::queued());
    }

    /// Merge a partial update into a job's state.
    ///
    /// An absent id is a no-op: a cleanup may remove a job the worker
    /// is still about to touch during shutdown, and that race is
    /// benign.
    pub fn update(&self, id: &JobId, update: JobStateUpdate) {
        if let Some(state) = self.lock().get_mut(id) {
            state.apply(update);
        }
    }

    /// Snapshot a job's current state.
    pub fn get(&self, id: &JobId) -> Option<JobState> {
        self.lock().get(id).cloned()
    }

    /// Remove a job's state, returning it if present.
    pub fn remove(&self, id: &JobId) -> Option<JobState> {
        let removed = self.lock().remove(id);
        if removed.is_some() {
            debug!(job_id = %id, "Removed tracked job state");
        }
        removed
    }

    /// Remove terminal entries older than the retention window.
    ///
    /// Live jobs are never reaped; their truth has not yet handed over
    /// to the durable record.
    pub fn reap_terminal(&self, retention: Duration) -> usize {
        let cutoff = Utc::now() - retention;
        let mut states = self.lock();
        let before = states.len();
        states.retain(|_, state| !(state.is_terminal() && state.updated_at < cutoff));
        before - states.len()
    }

    /// Number of tracked jobs.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for JobStateTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fswap_models::JobStatus;

    #[test]
    fn test_create_then_get() {
        let tracker = JobStateTracker::new();
        let id = JobId::new();
        tracker.create(&id);

        let state = tracker.get(&id).unwrap();
        assert_eq!(state.status, JobStatus::Queued);
        assert!(tracker.get(&JobId::new()).is_none());
    }

    #[test]
    fn test_update_absent_id_is_noop() {
        let tracker = JobStateTracker::new();
        tracker.update(&JobId::new(), JobStateUpdate::progress(5));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_merge_preserves_unmentioned_fields() {
        let tracker = JobStateTracker::new();
        let id = JobId::new();
        tracker.create(&id);

        tracker.update(&id, JobStateUpdate::processing());
        tracker.update(&id, JobStateUpdate::total_frames(7));
        tracker.update(&id, JobStateUpdate::progress(2));

        let state = tracker.get(&id).unwrap();
        assert_eq!(state.status, JobStatus::Processing);
        assert_eq!(state.total_frames, 7);
        assert_eq!(state.processed_frames, 2);
    }

    #[test]
    fn test_reap_only_takes_old_terminal_entries() {
        let tracker = JobStateTracker::new();
        let live = JobId::new();
        let done = JobId::new();
        tracker.create(&live);
        tracker.update(&live, JobStateUpdate::processing());
        tracker.create(&done);
        tracker.update(&done, JobStateUpdate::done(3, "/results/r.mp4"));

        // Nothing is old enough yet
        assert_eq!(tracker.reap_terminal(Duration::hours(1)), 0);

        // With zero retention the terminal entry goes, the live one stays
        assert_eq!(tracker.reap_terminal(Duration::zero()), 1);
        assert!(tracker.get(&done).is_none());
        assert!(tracker.get(&live).is_some());
    }

    #[test]
    fn test_concurrent_readers_see_monotonic_progress() {
        use std::sync::Arc;

        let tracker = Arc::new(JobStateTracker::new());
        let id = JobId::new();
        tracker.create(&id);
        tracker.update(&id, JobStateUpdate::processing());

        let writer = {
            let tracker = Arc::clone(&tracker);
            let id = id.clone();
            std::thread::spawn(move || {
                for processed in 1..=500u64 {
                    tracker.update(&id, JobStateUpdate::progress(processed));
                }
            })
        };

        let mut last = 0;
        for _ in 0..200 {
            let state = tracker.get(&id).unwrap();
            assert!(state.processed_frames >= last);
            last = state.processed_frames;
        }
        writer.join().unwrap();
        assert_eq!(tracker.get(&id).unwrap().processed_frames, 500);
    }
}
