//! Background cleanup sweeps.
//!
//! One periodic task covers both retention policies: expired result
//! files on disk and terminal tracker entries whose pollers have had
//! their window. Reaping only removes terminal entries, so a live job
//! can never lose its state; durable records answer status queries
//! from then on.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, error, info};

use fswap_queue::JobStateTracker;
use fswap_storage::ResultStore;

/// Periodic cleanup task.
pub struct Reaper {
    store: ResultStore,
    tracker: Arc<JobStateTracker>,
    retention: Duration,
    sweep_interval: Duration,
}

impl Reaper {
    pub fn new(
        store: ResultStore,
        tracker: Arc<JobStateTracker>,
        retention: Duration,
        sweep_interval: Duration,
    ) -> Self {
        Self {
            store,
            tracker,
            retention,
            sweep_interval,
        }
    }

    /// Run the sweep loop forever; spawn as a background task.
    pub async fn run(self) {
        info!(
            interval_secs = self.sweep_interval.as_secs(),
            retention_secs = self.retention.as_secs(),
            "Starting cleanup reaper"
        );

        let mut ticker = interval(self.sweep_interval);
        loop {
            ticker.tick().await;
            self.sweep().await;
        }
    }

    /// Run a single cleanup cycle.
    pub async fn sweep(&self) {
        match self.store.cleanup_expired().await {
            Ok(0) => {}
            Ok(n) => info!(removed = n, "Expired results cleaned up"),
            Err(e) => error!("Result cleanup failed: {e}"),
        }

        let retention = chrono::Duration::from_std(self.retention)
            .unwrap_or_else(|_| chrono::Duration::hours(1));
        let reaped = self.tracker.reap_terminal(retention);
        if reaped > 0 {
            debug!(reaped, "Terminal tracker entries reaped");
        }
    }
}
