//! The worker loop.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use fswap_queue::JobQueue;

use crate::config::WorkerConfig;
use crate::processor::{process_job, ProcessingContext};

/// The single execution worker.
///
/// Exactly one loop dequeues and processes jobs serially for the
/// process lifetime; the frame transform is assumed to fully occupy the
/// compute resource, so no two jobs ever run simultaneously. Admission
/// paths never block on it.
pub struct Worker {
    queue: Arc<JobQueue>,
    ctx: ProcessingContext,
    config: WorkerConfig,
    shutdown: watch::Sender<bool>,
}

impl Worker {
    /// Create a new worker.
    pub fn new(queue: Arc<JobQueue>, ctx: ProcessingContext, config: WorkerConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            queue,
            ctx,
            config,
            shutdown,
        }
    }

    /// Signal the loop to stop after the in-flight job, if any.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// Spawn the loop onto the runtime.
    pub fn spawn(self) -> (WorkerHandle, JoinHandle<()>) {
        let handle = WorkerHandle {
            shutdown: self.shutdown.clone(),
        };
        (handle, tokio::spawn(self.run()))
    }

    /// Run the loop until shutdown.
    ///
    /// The bounded queue wait keeps the loop responsive to shutdown;
    /// per-job failures are isolated inside `process_job` and never
    /// terminate the loop.
    pub async fn run(self) {
        let mut shutdown_rx = self.shutdown.subscribe();
        info!("Worker started");

        loop {
            if *shutdown_rx.borrow() {
                break;
            }
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping worker");
                        break;
                    }
                }
                job = self.queue.next_job(self.config.poll_interval) => {
                    if let Some(job) = job {
                        process_job(&self.ctx, job).await;
                    }
                }
            }
        }

        info!("Worker stopped");
    }
}

/// Shutdown handle for a spawned worker.
#[derive(Clone)]
pub struct WorkerHandle {
    shutdown: watch::Sender<bool>,
}

impl WorkerHandle {
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}
