//! Job status and download handlers.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use fswap_models::JobId;

use crate::error::ApiResult;
use crate::state::AppState;

/// Job status response for pollers.
#[derive(Debug, Serialize)]
pub struct JobStatusResponse {
    pub job_id: String,
    /// queued, processing, done or failed
    pub status: String,
    /// Total frame count, 0 until known
    pub total_frames: u64,
    /// Frames processed so far
    pub processed_frames: u64,
    /// Completion percentage, absent until the total is known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_pct: Option<u8>,
    /// Error message if the job failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /job/:job_id
///
/// Poll a job's live state. Keeps answering from the durable record
/// after the in-memory entry is retired, so a slow poller never sees
/// a done job turn into a 404.
pub async fn get_job_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<JobStatusResponse>> {
    let id = JobId::from_string(job_id);
    let snapshot = state.jobs.snapshot(&id).await?;

    let progress_pct = if snapshot.total_frames > 0 {
        Some(((snapshot.processed_frames * 100) / snapshot.total_frames).min(100) as u8)
    } else {
        None
    };

    Ok(Json(JobStatusResponse {
        job_id: snapshot.id.to_string(),
        status: snapshot.status.to_string(),
        total_frames: snapshot.total_frames,
        processed_frames: snapshot.processed_frames,
        progress_pct,
        error: snapshot.error,
    }))
}

/// GET /job/:job_id/download
///
/// Download a finished job's result. Jobs that are not done yet answer
/// 409 so clients keep polling instead of retrying the download.
pub async fn download_result(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    let id = JobId::from_string(job_id);
    let download = state.jobs.fetch_result(&id).await?;

    let disposition = format!("attachment; filename=\"{}\"", download.filename);
    Ok((
        [
            (header::CONTENT_TYPE, download.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.bytes,
    )
        .into_response())
}
