//! Application state.

use std::sync::Arc;

use fswap_repo::UserDirectory;

use crate::config::ApiConfig;
use crate::services::JobService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub jobs: JobService,
    pub users: Arc<dyn UserDirectory>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig, jobs: JobService, users: Arc<dyn UserDirectory>) -> Self {
        Self { config, jobs, users }
    }
}
