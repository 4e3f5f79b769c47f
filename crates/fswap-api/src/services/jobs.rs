//! Job facade: submission, status, result retrieval.
//!
//! This is the one place the admission gate, queue, tracker, store and
//! repo meet. Handlers stay thin; everything order-sensitive (probe
//! before spill, charge the ledger only after admission, create the
//! tracker entry before enqueue) lives here.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use fswap_engine::SwapEngine;
use fswap_models::{
    CallerIdentity, JobId, JobInput, JobKind, JobRecord, JobStatus, SwapOptions, MAX_IMAGE_BYTES,
    RejectReason,
};
use fswap_queue::{JobQueue, JobStateTracker};
use fswap_repo::{JobRepo, UsageLedger};
use fswap_storage::{ResultStore, StorageError};

use crate::error::{ApiError, ApiResult};

/// An uploaded media pair, already read out of the multipart body.
#[derive(Debug)]
pub struct SwapUpload {
    /// Source-face image bytes
    pub source: Vec<u8>,
    /// Target media bytes
    pub target: Vec<u8>,
    /// Original filename of the target, used for the temp extension
    pub target_name: Option<String>,
}

/// Point-in-time view of a job, from the tracker while the job is
/// live and from the durable record after the tracker entry is gone.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub id: JobId,
    pub status: JobStatus,
    pub total_frames: u64,
    pub processed_frames: u64,
    pub error: Option<String>,
    pub result_path: Option<String>,
}

/// A result payload ready to stream back to the caller.
pub struct ResultDownload {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
}

/// Facade over the submission pipeline and job queries.
#[derive(Clone)]
pub struct JobService {
    gate: super::AdmissionGate,
    queue: Arc<JobQueue>,
    tracker: Arc<JobStateTracker>,
    store: ResultStore,
    repo: Arc<dyn JobRepo>,
    ledger: Arc<dyn UsageLedger>,
    engine: Arc<dyn SwapEngine>,
    work_dir: PathBuf,
}

impl JobService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        gate: super::AdmissionGate,
        queue: Arc<JobQueue>,
        tracker: Arc<JobStateTracker>,
        store: ResultStore,
        repo: Arc<dyn JobRepo>,
        ledger: Arc<dyn UsageLedger>,
        engine: Arc<dyn SwapEngine>,
        work_dir: PathBuf,
    ) -> Self {
        Self {
            gate,
            queue,
            tracker,
            store,
            repo,
            ledger,
            engine,
            work_dir,
        }
    }

    /// Admit and enqueue one swap job. Returns the id the caller polls.
    pub async fn submit(
        &self,
        caller: &CallerIdentity,
        kind: JobKind,
        upload: SwapUpload,
        options: SwapOptions,
    ) -> ApiResult<JobId> {
        // The source is always an image and has a fixed ceiling,
        // independent of the target's tier limit.
        if upload.source.len() as u64 > MAX_IMAGE_BYTES {
            return Err(ApiError::Admission(RejectReason::PayloadTooLarge {
                max_bytes: MAX_IMAGE_BYTES,
            }));
        }

        let admitted = self
            .gate
            .decide(caller, kind, upload.target.len() as u64, &options)
            .await?
            .into_result()
            .map_err(ApiError::Admission)?;

        // Probe before spilling anything to disk. A source without a
        // face can never produce a result, and for single-image jobs
        // the same holds for the target.
        self.engine.probe_faces(&upload.source, "source", false)?;
        if kind == JobKind::Image {
            self.engine
                .probe_faces(&upload.target, "target", options.many_faces)?;
        }

        let id = JobId::new();
        let input = self.spill_upload(&id, kind, &upload, options).await?;

        if let Some(key) = caller.ledger_key() {
            self.ledger.record(&key, kind, Utc::now()).await?;
        }
        self.repo
            .insert(JobRecord::new(
                id.clone(),
                caller.ledger_key(),
                kind,
                admitted.priority,
                options,
            ))
            .await?;

        // Tracker entry must exist before the worker can pick the job
        // up, or an early progress write would be dropped.
        self.tracker.create(&id);
        let seq = self.queue.enqueue(id.clone(), admitted.priority, input);

        info!(job_id = %id, kind = %kind, priority = admitted.priority, seq, "job admitted");
        Ok(id)
    }

    /// Jobs currently waiting in the intake queue.
    pub fn queue_depth(&self) -> usize {
        self.queue.len()
    }

    /// Current view of a job, preferring the live tracker entry.
    pub async fn snapshot(&self, id: &JobId) -> ApiResult<JobSnapshot> {
        if let Some(state) = self.tracker.get(id) {
            return Ok(JobSnapshot {
                id: id.clone(),
                status: state.status,
                total_frames: state.total_frames,
                processed_frames: state.processed_frames,
                error: state.error,
                result_path: state.result_path,
            });
        }

        match self.repo.fetch(id).await? {
            Some(record) => Ok(JobSnapshot {
                id: record.id,
                status: record.status,
                total_frames: record.total_frames,
                processed_frames: record.processed_frames,
                error: record.error,
                result_path: record.result_path,
            }),
            None => Err(ApiError::not_found(format!("Job {id} not found"))),
        }
    }

    /// Fetch a finished job's result for download.
    ///
    /// Only `done` jobs have a result; polling clients that race the
    /// worker get a conflict, not a partial file. A successful download
    /// retires the tracker entry, after which status queries fall
    /// through to the durable record.
    pub async fn fetch_result(&self, id: &JobId) -> ApiResult<ResultDownload> {
        let snapshot = self.snapshot(id).await?;
        if snapshot.status != JobStatus::Done {
            return Err(ApiError::conflict(format!(
                "Job is not done (status: {})",
                snapshot.status
            )));
        }

        let path = snapshot
            .result_path
            .ok_or_else(|| ApiError::internal(format!("Done job {id} has no result path")))?;

        let bytes = match self.store.read(&path).await {
            Ok(bytes) => bytes,
            // Done but missing on disk means the TTL sweep got there first
            Err(StorageError::NotFound(_)) => {
                return Err(ApiError::not_found(format!("Result for job {id} expired")));
            }
            Err(e) => return Err(e.into()),
        };

        let extension = Path::new(&path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("jpg");
        let content_type = match extension {
            "mp4" => "video/mp4",
            "png" => "image/png",
            _ => "image/jpeg",
        };

        self.tracker.remove(id);

        Ok(ResultDownload {
            bytes,
            content_type,
            filename: format!("result.{extension}"),
        })
    }

    /// Write the uploaded pair under the work dir as the job's owned
    /// temp files. The worker releases them at terminal state.
    async fn spill_upload(
        &self,
        id: &JobId,
        kind: JobKind,
        upload: &SwapUpload,
        options: SwapOptions,
    ) -> ApiResult<JobInput> {
        tokio::fs::create_dir_all(&self.work_dir)
            .await
            .map_err(|e| ApiError::internal(format!("Could not create work dir: {e}")))?;

        let target_ext = upload
            .target_name
            .as_deref()
            .and_then(|n| Path::new(n).extension())
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_else(|| {
                match kind {
                    JobKind::Image => "jpg",
                    JobKind::Video => "mp4",
                }
                .to_string()
            });

        let source_path = self.work_dir.join(format!("{id}-source.jpg"));
        let target_path = self.work_dir.join(format!("{id}-target.{target_ext}"));

        tokio::fs::write(&source_path, &upload.source)
            .await
            .map_err(|e| ApiError::internal(format!("Could not spill source upload: {e}")))?;
        if let Err(e) = tokio::fs::write(&target_path, &upload.target).await {
            // Don't leave the source behind on a half spill
            if let Err(rm) = tokio::fs::remove_file(&source_path).await {
                warn!(path = %source_path.display(), "Could not remove orphaned source temp: {rm}");
            }
            return Err(ApiError::internal(format!(
                "Could not spill target upload: {e}"
            )));
        }

        Ok(JobInput {
            kind,
            source_path,
            target_path,
            options,
        })
    }
}
