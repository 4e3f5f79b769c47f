//! Swap submission handlers.
//!
//! Both endpoints take a multipart body with a `source` face image and
//! a `target` media file, plus optional `many_faces`/`enhance` query
//! flags, and answer with the job id to poll.

use axum::extract::{Multipart, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use fswap_models::{CallerIdentity, JobKind, SwapOptions};

use crate::caller::Caller;
use crate::error::{ApiError, ApiResult};
use crate::services::SwapUpload;
use crate::state::AppState;

/// Query flags for swap submissions.
#[derive(Debug, Default, Deserialize)]
pub struct SwapQuery {
    #[serde(default)]
    pub many_faces: bool,
    #[serde(default)]
    pub enhance: bool,
}

/// Submission response.
#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub job_id: String,
    pub status: &'static str,
}

/// POST /swap
///
/// Submit a single-image face swap.
pub async fn swap_image(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Query(query): Query<SwapQuery>,
    multipart: Multipart,
) -> ApiResult<Json<SubmitResponse>> {
    submit(state, caller, JobKind::Image, query, multipart).await
}

/// POST /swap/video
///
/// Submit a video face swap.
pub async fn swap_video(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Query(query): Query<SwapQuery>,
    multipart: Multipart,
) -> ApiResult<Json<SubmitResponse>> {
    submit(state, caller, JobKind::Video, query, multipart).await
}

async fn submit(
    state: AppState,
    caller: CallerIdentity,
    kind: JobKind,
    query: SwapQuery,
    multipart: Multipart,
) -> ApiResult<Json<SubmitResponse>> {
    let upload = read_upload(multipart).await?;
    let options = SwapOptions {
        many_faces: query.many_faces,
        enhance: query.enhance,
    };

    let job_id = state.jobs.submit(&caller, kind, upload, options).await?;

    Ok(Json(SubmitResponse {
        job_id: job_id.to_string(),
        status: "queued",
    }))
}

/// Pull the `source` and `target` parts out of the multipart body.
async fn read_upload(mut multipart: Multipart) -> ApiResult<SwapUpload> {
    let mut source: Option<Vec<u8>> = None;
    let mut target: Option<Vec<u8>> = None;
    let mut target_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "source" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Could not read source: {e}")))?;
                source = Some(bytes.to_vec());
            }
            "target" => {
                target_name = field.file_name().map(|n| n.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Could not read target: {e}")))?;
                target = Some(bytes.to_vec());
            }
            // Unknown fields are ignored, same as unknown query params
            _ => {}
        }
    }

    let source = source.ok_or_else(|| ApiError::bad_request("Missing source image"))?;
    let target = target.ok_or_else(|| ApiError::bad_request("Missing target media"))?;
    if source.is_empty() {
        return Err(ApiError::bad_request("Source image is empty"));
    }
    if target.is_empty() {
        return Err(ApiError::bad_request("Target media is empty"));
    }

    Ok(SwapUpload {
        source,
        target,
        target_name,
    })
}
