//! Error responses of the surface API.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use feedback_core::{IngestError, SubmitError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned by the surface API.
#[derive(Debug, Error)]
pub enum SurfaceApiError {
    /// An image could not be ingested.
    #[error(transparent)]
    Ingest(#[from] IngestError),

    /// A submit was rejected.
    #[error(transparent)]
    Submit(#[from] SubmitError),

    /// The session already resolved or expired.
    #[error("Session is closed")]
    Closed,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SurfaceApiError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Ingest(e) => match e {
                IngestError::Decode { .. } | IngestError::Read { .. } => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                IngestError::ClipboardEmpty => StatusCode::CONFLICT,
                IngestError::ClipboardUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                IngestError::IndexOutOfRange { .. } => StatusCode::NOT_FOUND,
            },
            Self::Submit(SubmitError::Empty(_) | SubmitError::ImageCount(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            Self::Submit(SubmitError::Closed) | Self::Closed => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code string.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Ingest(e) => e.error_code(),
            Self::Submit(e) => e.error_code(),
            Self::Closed => "session_closed",
            Self::Internal(_) => "internal_error",
        }
    }
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorDetail {
    pub(crate) fn from_ingest(error: &IngestError) -> Self {
        Self {
            code: error.error_code().to_string(),
            message: error.to_string(),
        }
    }
}

impl IntoResponse for SurfaceApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code().to_string(),
                message: self.to_string(),
            },
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Result type for surface handlers.
pub type ApiResult<T> = Result<T, SurfaceApiError>;
