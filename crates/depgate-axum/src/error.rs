//! Axum-specific error types and mappings.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use depgate_core::VerifyError;
use serde::Serialize;
use thiserror::Error;

/// Errors the health endpoint can answer with.
#[derive(Debug, Error)]
pub enum HttpError {
    /// Verification could not finish (cancelled, deadline exceeded).
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    status: u16,
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = ErrorBody {
            error: message,
            status: status.as_u16(),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<VerifyError> for HttpError {
    fn from(err: VerifyError) -> Self {
        match err {
            // Only reachable under the fail policy
            VerifyError::Incompatible(report) => Self::ServiceUnavailable(report.summary()),
            err @ VerifyError::Cancelled => Self::ServiceUnavailable(err.to_string()),
            VerifyError::Runtime(msg) => Self::Internal(msg),
        }
    }
}
