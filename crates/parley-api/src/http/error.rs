//! Application error type mapping to HTTP status codes and envelope format.

use std::fmt;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use parley_types::error::{ChatError, ErrorClass, StoreError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Chat orchestration errors (key, upstream, timeout, cancel, store).
    Chat(ChatError),
    /// Storage errors from session, history and key operations.
    Store(StoreError),
    /// Malformed request input.
    Validation(String),
}

impl From<ChatError> for AppError {
    fn from(e: ChatError) -> Self {
        AppError::Chat(e)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        AppError::Store(e)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl AppError {
    /// Envelope error code.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Chat(e) => e.class().code(),
            AppError::Store(_) => ErrorClass::Store.code(),
            AppError::Validation(_) => "VALIDATION_ERROR",
        }
    }

}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Chat(e) => write!(f, "{e}"),
            AppError::Store(e) => write!(f, "{e}"),
            AppError::Validation(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for AppError {}

/// An [`AppError`] tagged with the request it failed.
#[derive(Debug)]
pub struct RequestError {
    pub error: AppError,
    pub request_id: String,
    pub response_time_ms: u64,
}

impl RequestError {
    /// The error envelope for this failure.
    pub fn envelope(&self) -> ApiResponse<()> {
        ApiResponse::error(
            self.error.code(),
            &self.error.to_string(),
            self.request_id.clone(),
            self.response_time_ms,
        )
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let code = self.error.code();
        if code == ErrorClass::Store.code() {
            tracing::error!(request_id = %self.request_id, error = %self.error, "request failed");
        } else {
            tracing::debug!(request_id = %self.request_id, code, error = %self.error, "request failed");
        }
        self.envelope().into_response()
    }
}

/// Rejections raised before a handler runs have no request context yet.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        RequestError {
            error: self,
            request_id: Uuid::now_v7().to_string(),
            response_time_ms: 0,
        }
        .into_response()
    }
}
