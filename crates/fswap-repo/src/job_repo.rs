//! Durable job records.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use fswap_models::{JobId, JobRecord, JobStatus};

use crate::error::{RepoError, RepoResult};

/// Durable job record store.
///
/// The worker's terminal write here is the handover point: until it
/// lands, the in-memory tracker is authoritative for the job; after
/// it, this record answers status queries for reaped jobs.
#[async_trait]
pub trait JobRepo: Send + Sync {
    /// Persist a freshly admitted job record.
    async fn insert(&self, record: JobRecord) -> RepoResult<()>;

    /// Fetch a record by id.
    async fn fetch(&self, id: &JobId) -> RepoResult<Option<JobRecord>>;

    /// Record terminal success.
    async fn complete(
        &self,
        id: &JobId,
        total_frames: u64,
        processed_frames: u64,
        result_path: String,
    ) -> RepoResult<()>;

    /// Record terminal failure.
    async fn fail(
        &self,
        id: &JobId,
        total_frames: u64,
        processed_frames: u64,
        error: String,
    ) -> RepoResult<()>;
}

/// In-memory `JobRepo` for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryJobRepo {
    records: Arc<Mutex<HashMap<JobId, JobRecord>>>,
}

impl MemoryJobRepo {
    pub fn new() -> Self {
        Self::default()
    }

    async fn update<F>(&self, id: &JobId, mutate: F) -> RepoResult<()>
    where
        F: FnOnce(&mut JobRecord),
    {
        let mut records = self.records.lock().await;
        let record = records
            .get_mut(id)
            .ok_or_else(|| RepoError::not_found(id.as_str()))?;
        mutate(record);
        Ok(())
    }
}

#[async_trait]
impl JobRepo for MemoryJobRepo {
    async fn insert(&self, record: JobRecord) -> RepoResult<()> {
        debug!(job_id = %record.id, kind = %record.kind, "Persisting job record");
        self.records.lock().await.insert(record.id.clone(), record);
        Ok(())
    }

    async fn fetch(&self, id: &JobId) -> RepoResult<Option<JobRecord>> {
        Ok(self.records.lock().await.get(id).cloned())
    }

    async fn complete(
        &self,
        id: &JobId,
        total_frames: u64,
        processed_frames: u64,
        result_path: String,
    ) -> RepoResult<()> {
        self.update(id, |record| {
            record.status = JobStatus::Done;
            record.total_frames = total_frames;
            record.processed_frames = processed_frames;
            record.result_path = Some(result_path);
            record.finished_at = Some(Utc::now());
        })
        .await
    }

    async fn fail(
        &self,
        id: &JobId,
        total_frames: u64,
        processed_frames: u64,
        error: String,
    ) -> RepoResult<()> {
        self.update(id, |record| {
            record.status = JobStatus::Failed;
            record.total_frames = total_frames;
            record.processed_frames = processed_frames;
            record.error = Some(error);
            record.finished_at = Some(Utc::now());
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fswap_models::{JobKind, SwapOptions};

    fn record(id: &JobId) -> JobRecord {
        JobRecord::new(id.clone(), None, JobKind::Video, 1, SwapOptions::default())
    }

    #[tokio::test]
    async fn test_insert_fetch_complete() {
        let repo = MemoryJobRepo::new();
        let id = JobId::new();
        repo.insert(record(&id)).await.unwrap();

        let fetched = repo.fetch(&id).await.unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Queued);

        repo.complete(&id, 10, 10, "/results/r.mp4".into()).await.unwrap();
        let fetched = repo.fetch(&id).await.unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Done);
        assert_eq!(fetched.result_path.as_deref(), Some("/results/r.mp4"));
        assert!(fetched.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_fail_records_error() {
        let repo = MemoryJobRepo::new();
        let id = JobId::new();
        repo.insert(record(&id)).await.unwrap();

        repo.fail(&id, 10, 3, "frame 3 failed".into()).await.unwrap();
        let fetched = repo.fetch(&id).await.unwrap().unwrap();
        assert_eq!(fetched.status, JobStatus::Failed);
        assert_eq!(fetched.error.as_deref(), Some("frame 3 failed"));
        assert_eq!(fetched.processed_frames, 3);
    }

    #[tokio::test]
    async fn test_terminal_update_on_unknown_id_errors() {
        let repo = MemoryJobRepo::new();
        let err = repo
            .complete(&JobId::new(), 1, 1, "/x".into())
            .await
            .unwrap_err();
        assert!(matches!(err, RepoError::NotFound(_)));
    }
}
