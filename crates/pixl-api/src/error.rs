//! API error types.
//!
//! Each failure kind maps to a distinct, stable outcome code and a
//! human-readable message; internals never leak into responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use pixl_media::MediaError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid input: {0}")]
    InputValidation(String),

    #[error("Too many requests. Try again later.")]
    RateLimited,

    #[error("Server is busy. Please wait a moment.")]
    Busy,

    #[error("Processing took too long. Try again.")]
    ProcessingTimeout,

    #[error("Unsupported content: {0}")]
    UnsupportedContent(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InputValidation(_) | ApiError::UnsupportedContent(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Busy => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::ProcessingTimeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable outcome code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InputValidation(_) => "input_validation",
            ApiError::RateLimited => "rate_limited",
            ApiError::Busy => "admission_busy",
            ApiError::ProcessingTimeout => "processing_timeout",
            ApiError::UnsupportedContent(_) => "unsupported_content",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        match err {
            MediaError::Timeout(_) => ApiError::ProcessingTimeout,
            MediaError::UnsupportedContent(msg) => ApiError::UnsupportedContent(msg),
            e if e.is_validation() => ApiError::InputValidation(e.to_string()),
            // FFmpeg/IO details stay in logs, not in the response
            e => ApiError::Internal(e.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details to clients
        let detail = match &self {
            ApiError::Internal(_) => "An internal error occurred".to_string(),
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            detail,
            code: self.code(),
        };

        (status, Json(body)).into_response()
    }
}
