//! API key HTTP handlers.
//!
//! Endpoints:
//! - GET /api/v1/api-key - Whether a key is configured (masked, never raw)
//! - PUT /api/v1/api-key - Replace the stored key

use axum::Json;
use axum::extract::State;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::http::error::{AppError, RequestError};
use crate::http::extractors::{ApiJson, RequestContext};
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for setting the key.
#[derive(Deserialize)]
pub struct SetApiKeyRequest {
    pub key: SecretString,
}

/// Key status; the key itself is never returned.
#[derive(Debug, Serialize)]
pub struct ApiKeyStatus {
    pub configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub masked: Option<String>,
}

/// Mask a key for display, keeping only the last four characters.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("****{tail}")
}

impl ApiKeyStatus {
    pub fn from_key(key: Option<&SecretString>) -> Self {
        Self {
            configured: key.is_some(),
            masked: key.map(|k| mask_key(k.expose_secret())),
        }
    }
}

/// GET /api/v1/api-key - Key status.
pub async fn get_api_key(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ApiKeyStatus>>, RequestError> {
    let key = state
        .chat_service
        .get_api_key()
        .await
        .map_err(|e| ctx.fail(e))?;
    let status = ApiKeyStatus::from_key(key.as_ref());

    Ok(Json(ctx.success(status)))
}

/// PUT /api/v1/api-key - Store a new key.
pub async fn set_api_key(
    ctx: RequestContext,
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SetApiKeyRequest>,
) -> Result<Json<ApiResponse<ApiKeyStatus>>, RequestError> {
    if body.key.expose_secret().trim().is_empty() {
        return Err(ctx.fail(AppError::Validation(
            "api key must not be empty".to_string(),
        )));
    }

    let status = ApiKeyStatus::from_key(Some(&body.key));
    state
        .chat_service
        .set_api_key(body.key)
        .await
        .map_err(|e| ctx.fail(e))?;

    Ok(Json(ctx.success(status)))
}
