use axum::{http::StatusCode, response::IntoResponse, Json};
use effectforge_engine::EngineError;
use effectforge_job_queue::JobQueueError;
use effectforge_store::StoreError;
use serde_json::json;
use thiserror::Error;

type SerdeJsonError = serde_json::Error;

/// Top-level API error shared by all route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("job queue error: {0}")]
    JobQueue(JobQueueError),
    #[error("{0}")]
    Engine(#[from] EngineError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("validation error")]
    Validation(serde_json::Value),
    #[error(transparent)]
    SerdeJson(#[from] SerdeJsonError),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            ApiError::JobQueue(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Engine(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::SerdeJson(_) => StatusCode::BAD_REQUEST,
            ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let payload = match self {
            ApiError::Validation(v) => v,
            other => json!({ "error": other.to_string() }),
        };

        (status, Json(payload)).into_response()
    }
}

impl From<JobQueueError> for ApiError {
    fn from(err: JobQueueError) -> Self {
        match err {
            JobQueueError::NotFound(id) => Self::NotFound(format!("job {id}")),
            JobQueueError::InvalidTransition { .. } => Self::Conflict(err.to_string()),
            other => Self::JobQueue(other),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, id } => Self::NotFound(format!("{kind} {id}")),
            StoreError::InvalidRating(_) | StoreError::InvalidPolicy(_) => {
                Self::BadRequest(err.to_string())
            }
            StoreError::InvalidTransition(_) => Self::Conflict(err.to_string()),
        }
    }
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }
}
