//! API error types and HTTP response conversion

use crate::broker::BrokerError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use relay_checkpoint::CheckpointError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// API result type
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors surfaced by API handlers
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request data
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A required backend is unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable error code for programmatic handling
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Error response body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Always false for errors
    pub success: bool,
    /// Human-readable message
    pub error: String,
    /// Stable error code
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            success: false,
            error: self.to_string(),
            code: self.code().to_string(),
        };

        tracing::debug!(status = %status, error = %body.error, "API error");
        (status, Json(body)).into_response()
    }
}

impl From<BrokerError> for ApiError {
    fn from(err: BrokerError) -> Self {
        match err {
            BrokerError::Unavailable => ApiError::ServiceUnavailable(err.to_string()),
            BrokerError::UnknownRequest(_) => ApiError::NotFound(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CheckpointError> for ApiError {
    fn from(err: CheckpointError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
