//! Per-job processing.
//!
//! Drives one `TransformSession` to a terminal state: unit-by-unit
//! progress into the tracker, result bytes into the store, and the
//! terminal status into the durable record before the tracker; that
//! durable write is the handover point after which the in-memory entry
//! may be reaped.

use std::sync::Arc;

use tracing::{error, info, warn};

use fswap_engine::{SwapEngine, TransformOutput, UnitProgress};
use fswap_models::{JobId, JobInput, JobStateUpdate};
use fswap_queue::{JobStateTracker, QueuedJob};
use fswap_repo::JobRepo;
use fswap_storage::ResultStore;

use crate::error::WorkerError;

/// What a per-unit transform error does to the job.
///
/// The original behavior aborts the whole job on the first bad unit.
/// `Skip` drops the unit and continues; flipping this value is the only
/// change needed to adopt it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitErrorPolicy {
    #[default]
    Abort,
    Skip,
}

/// Everything the worker needs to process jobs.
#[derive(Clone)]
pub struct ProcessingContext {
    pub tracker: Arc<JobStateTracker>,
    pub store: ResultStore,
    pub repo: Arc<dyn JobRepo>,
    pub engine: Arc<dyn SwapEngine>,
    pub unit_error_policy: UnitErrorPolicy,
}

struct SessionRun {
    outcome: Result<TransformOutput, WorkerError>,
    processed: u64,
    total: u64,
}

/// Process one job to a terminal state.
///
/// Never returns an error: every failure is recorded against the job,
/// keeping the worker loop alive for the next one.
pub async fn process_job(ctx: &ProcessingContext, job: QueuedJob) {
    let job_id = job.id.clone();
    info!(job_id = %job_id, kind = %job.input.kind, priority = job.priority, seq = job.seq, "Processing job");
    ctx.tracker.update(&job_id, JobStateUpdate::processing());

    let run = drive_session(ctx, &job_id, job.input.clone()).await;

    match run.outcome {
        Ok(output) => finish_job(ctx, &job_id, run.processed, run.total, output).await,
        Err(err) => fail_job(ctx, &job_id, run.processed, run.total, err).await,
    }

    release_input(&job.input).await;
}

/// Run the blocking transform on a dedicated thread. The tracker's O(1)
/// merges are safe to call from there once per unit.
async fn drive_session(ctx: &ProcessingContext, job_id: &JobId, input: JobInput) -> SessionRun {
    let engine = Arc::clone(&ctx.engine);
    let tracker = Arc::clone(&ctx.tracker);
    let policy = ctx.unit_error_policy;
    let job_id = job_id.clone();

    let joined = tokio::task::spawn_blocking(move || run_session(&*engine, &tracker, &job_id, &input, policy)).await;

    joined.unwrap_or_else(|join_err| SessionRun {
        outcome: Err(WorkerError::TaskPanic(join_err.to_string())),
        processed: 0,
        total: 0,
    })
}

fn run_session(
    engine: &dyn SwapEngine,
    tracker: &JobStateTracker,
    job_id: &JobId,
    input: &JobInput,
    policy: UnitErrorPolicy,
) -> SessionRun {
    // Setup errors are terminal; a failed begin leaks no handles.
    let mut session = match engine.begin(input) {
        Ok(session) => session,
        Err(err) => {
            return SessionRun {
                outcome: Err(err.into()),
                processed: 0,
                total: 0,
            }
        }
    };

    let total = session.total_frames();
    tracker.update(job_id, JobStateUpdate::total_frames(total));

    let mut processed: u64 = 0;
    let mut index: u64 = 0;
    let outcome = loop {
        match session.advance() {
            Ok(UnitProgress::Exhausted) => break None,
            Ok(UnitProgress::Processed) => {
                processed += 1;
                // Per-unit cadence is what pollers observe as progress
                tracker.update(job_id, JobStateUpdate::progress(processed));
            }
            Err(err) => match policy {
                UnitErrorPolicy::Abort => break Some(WorkerError::from(err)),
                UnitErrorPolicy::Skip => {
                    warn!(job_id = %job_id, unit = index, "Skipping failed unit: {err}");
                }
            },
        }
        index += 1;
    };

    if let Some(err) = outcome {
        return SessionRun {
            outcome: Err(err),
            processed,
            total,
        };
    }

    if processed == 0 {
        // Empty or corrupt input: zero work done is explicitly not success
        return SessionRun {
            outcome: Err(WorkerError::EmptyInput),
            processed: 0,
            total,
        };
    }

    let outcome = session.finish().map_err(WorkerError::from);
    SessionRun {
        outcome,
        processed,
        total: if total == 0 { processed } else { total },
    }
}

async fn finish_job(ctx: &ProcessingContext, job_id: &JobId, processed: u64, total: u64, output: TransformOutput) {
    let path = match ctx.store.write(job_id, &output.bytes, &output.extension).await {
        Ok(path) => path,
        Err(err) => {
            return fail_job(ctx, job_id, processed, total, err.into()).await;
        }
    };
    let path = path.display().to_string();

    // Durable terminal write first: from here the record can answer
    // status queries even if the tracker entry is reaped.
    if let Err(err) = ctx.repo.complete(job_id, total, processed, path.clone()).await {
        warn!(job_id = %job_id, "Failed to persist completion: {err}");
    }

    ctx.tracker.update(
        job_id,
        JobStateUpdate {
            total_frames: Some(total),
            ..JobStateUpdate::done(processed, path)
        },
    );
    info!(job_id = %job_id, processed, total, "Job done");
}

async fn fail_job(ctx: &ProcessingContext, job_id: &JobId, processed: u64, total: u64, err: WorkerError) {
    let message = err.to_string();
    error!(job_id = %job_id, processed, "Job failed: {message}");

    if let Err(repo_err) = ctx.repo.fail(job_id, total, processed, message.clone()).await {
        warn!(job_id = %job_id, "Failed to persist failure: {repo_err}");
    }

    ctx.tracker.update(job_id, JobStateUpdate::failed(message));
}

/// Release the job's temp inputs, whatever the outcome.
async fn release_input(input: &JobInput) {
    for path in [&input.source_path, &input.target_path] {
        if let Err(err) = tokio::fs::remove_file(path).await {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), "Failed to remove temp input: {err}");
            }
        }
    }
}
