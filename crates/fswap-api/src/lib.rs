//! Axum HTTP API server.
//!
//! This crate provides:
//! - Multipart swap submission endpoints with tiered admission
//! - Job status polling and result download
//! - Anonymous session cookies and bearer-token caller resolution
//! - Background cleanup of expired results and retired job state

pub mod caller;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{AdmissionGate, JobService, Reaper};
pub use state::AppState;
