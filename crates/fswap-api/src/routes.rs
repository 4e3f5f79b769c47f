//! API routes.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::health;
use crate::handlers::jobs::{download_result, get_job_status};
use crate::handlers::swap::{swap_image, swap_video};
use crate::middleware::{cors_layer, session_cookie};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/swap", post(swap_image))
        .route("/swap/video", post(swap_video))
        .route("/job/:job_id", get(get_job_status))
        .route("/job/:job_id/download", get(download_result))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(session_cookie))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
