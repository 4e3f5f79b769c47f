//! Worker configuration.

use std::time::Duration;

use crate::processor::UnitErrorPolicy;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Bounded wait between queue polls, so shutdown is observed
    pub poll_interval: Duration,
    /// What a per-unit transform error does to the job
    pub unit_error_policy: UnitErrorPolicy,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            unit_error_policy: UnitErrorPolicy::Abort,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            poll_interval: Duration::from_secs(
                std::env::var("WORKER_POLL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
            unit_error_policy: std::env::var("WORKER_SKIP_BAD_FRAMES")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false)
                .then_some(UnitErrorPolicy::Skip)
                .unwrap_or(UnitErrorPolicy::Abort),
        }
    }
}
