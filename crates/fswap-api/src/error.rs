//! API error types.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use fswap_engine::EngineError;
use fswap_models::RejectReason;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{}", .0.detail())]
    Admission(RejectReason),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Storage error: {0}")]
    Storage(#[from] fswap_storage::StorageError),

    #[error("Repo error: {0}")]
    Repo(#[from] fswap_repo::RepoError),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Admission(reason) => match reason {
                RejectReason::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
                RejectReason::PayloadTooLarge { .. } => StatusCode::BAD_REQUEST,
                RejectReason::FeatureNotEntitled => StatusCode::FORBIDDEN,
            },
            // A probe failure at submission is the caller's payload, not us
            ApiError::Engine(EngineError::NoFaceFound(_))
            | ApiError::Engine(EngineError::DecodeFailed(_)) => StatusCode::BAD_REQUEST,
            ApiError::Engine(_) | ApiError::Internal(_) | ApiError::Storage(_) | ApiError::Repo(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = match &self {
            ApiError::Internal(_) | ApiError::Storage(_) | ApiError::Repo(_) => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        let code = match &self {
            ApiError::Admission(reason) => Some(reason.code().to_string()),
            _ => None,
        };

        let retry_after = match &self {
            ApiError::Admission(RejectReason::QuotaExceeded { retry_after_secs, .. }) => {
                Some(*retry_after_secs)
            }
            _ => None,
        };

        let body = ErrorResponse { detail, code };
        let mut response = (status, Json(body)).into_response();

        if let Some(secs) = retry_after {
            if let Ok(value) = secs.to_string().parse() {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_rejection_carries_retry_after() {
        let err = ApiError::Admission(RejectReason::quota_exceeded(5));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response.headers().get(header::RETRY_AFTER).unwrap(),
            "86400"
        );
    }

    #[test]
    fn test_admission_status_map() {
        let too_large = ApiError::Admission(RejectReason::PayloadTooLarge { max_bytes: 1024 });
        assert_eq!(too_large.status_code(), StatusCode::BAD_REQUEST);

        let not_entitled = ApiError::Admission(RejectReason::FeatureNotEntitled);
        assert_eq!(not_entitled.status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_no_face_is_a_bad_request() {
        let err = ApiError::Engine(EngineError::no_face("source"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
