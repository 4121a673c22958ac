//! HTTP error mapping shared by the route handlers.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use blog_model::ModelError;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

/// `NotFound` → 404, `Validation` → 400, `InUse`/`DuplicateName` → 409,
/// everything else → 500 (logged).
impl From<ModelError> for ApiError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            ModelError::Validation(_) => ApiError::BadRequest(e.to_string()),
            ModelError::InUse { .. } | ModelError::DuplicateName { .. } => {
                ApiError::Conflict(e.to_string())
            }
            err => {
                tracing::error!(error = %err, "model operation failed");
                ApiError::InternalServerError("storage failure".to_string())
            }
        }
    }
}

impl From<r2d2::Error> for ApiError {
    fn from(e: r2d2::Error) -> Self {
        tracing::error!(error = %e, "failed to get db connection");
        ApiError::InternalServerError("storage unavailable".to_string())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        tracing::error!(error = %e, "blocking task join error");
        ApiError::InternalServerError("request task failed".to_string())
    }
}
