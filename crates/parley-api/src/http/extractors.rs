//! Request extractors shared by the handlers.
//!
//! [`RequestContext`] stamps each request with an id and a start time so
//! success and error envelopes report the same `meta`. [`ApiJson`] and
//! [`ApiQuery`] report malformed input through the error envelope instead
//! of axum's plain-text rejections.

use std::convert::Infallible;
use std::time::Instant;

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;
use serde::Serialize;
use uuid::Uuid;

use crate::http::error::{AppError, RequestError};
use crate::http::response::ApiResponse;

/// JSON request body; rejections become `VALIDATION_ERROR` envelopes.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Query string; rejections become `VALIDATION_ERROR` envelopes.
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Identity and timing of one request (or one CLI command).
#[derive(Debug)]
pub struct RequestContext {
    pub request_id: String,
    start: Instant,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::now_v7().to_string(),
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Success envelope stamped with this request's id and elapsed time.
    pub fn success<T: Serialize>(&self, data: T) -> ApiResponse<T> {
        ApiResponse::success(data, self.request_id.clone(), self.elapsed_ms())
    }

    /// Tag `error` with this request's id and elapsed time.
    pub fn fail(&self, error: impl Into<AppError>) -> RequestError {
        RequestError {
            error: error.into(),
            request_id: self.request_id.clone(),
            response_time_ms: self.elapsed_ms(),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(_parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::new())
    }
}
