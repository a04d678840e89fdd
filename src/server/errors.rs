//! HTTP error responses
//!
//! Maps pipeline errors to status codes and a `{"error", "detail"}` JSON body.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::RagError;
use crate::completion::CompletionError;

pub mod error_codes {
    pub const INDEX_NOT_READY: &str = "index_not_ready";
    pub const EMPTY_QUESTION: &str = "empty_question";
    pub const INVALID_REQUEST: &str = "invalid_request";
    pub const COMPLETION_TRANSPORT_ERROR: &str = "completion_transport_error";
    pub const COMPLETION_EMPTY_CHOICES: &str = "completion_empty_choices";
    pub const INTERNAL_ERROR: &str = "internal_error";
}

/// JSON body of every error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub detail: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    detail: String,
}

impl ApiError {
    #[inline]
    pub fn new(status: StatusCode, code: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status,
            code,
            detail: detail.into(),
        }
    }

    #[inline]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    #[inline]
    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<RagError> for ApiError {
    #[inline]
    fn from(err: RagError) -> Self {
        let detail = err.to_string();
        match err {
            RagError::IndexNotReady => Self::new(
                StatusCode::SERVICE_UNAVAILABLE,
                error_codes::INDEX_NOT_READY,
                detail,
            ),
            RagError::EmptyQuestion => Self::new(
                StatusCode::BAD_REQUEST,
                error_codes::EMPTY_QUESTION,
                detail,
            ),
            RagError::Completion(CompletionError::EmptyChoices) => Self::new(
                StatusCode::BAD_GATEWAY,
                error_codes::COMPLETION_EMPTY_CHOICES,
                detail,
            ),
            RagError::Completion(_) => Self::new(
                StatusCode::BAD_GATEWAY,
                error_codes::COMPLETION_TRANSPORT_ERROR,
                detail,
            ),
            _ => Self::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
                detail,
            ),
        }
    }
}

/// Malformed or incomplete request bodies keep axum's status (400, 415 or 422)
impl From<JsonRejection> for ApiError {
    #[inline]
    fn from(rejection: JsonRejection) -> Self {
        Self::new(
            rejection.status(),
            error_codes::INVALID_REQUEST,
            rejection.body_text(),
        )
    }
}

impl IntoResponse for ApiError {
    #[inline]
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("Request failed ({}): {}", self.code, self.detail);
        } else {
            warn!("Request rejected ({}): {}", self.code, self.detail);
        }

        let body = ErrorBody {
            error: self.code.to_string(),
            detail: self.detail,
        };
        (self.status, Json(body)).into_response()
    }
}
