//! Message HTTP handlers.
//!
//! Endpoints:
//! - GET  /api/v1/sessions/{id}/messages - Stored history, oldest first
//! - POST /api/v1/sessions/{id}/messages - Send a user message, get the reply

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use parley_types::chat::{ChatMessage, SessionId};
use parley_types::llm::CompletionOutcome;

use crate::http::error::{AppError, RequestError};
use crate::http::extractors::{ApiJson, ApiQuery, RequestContext};
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Query parameters for message listing.
#[derive(Debug, Deserialize)]
pub struct MessageListQuery {
    /// Defaults to the configured display limit.
    pub limit: Option<u32>,
}

/// Request body for sending a message.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
}

/// Response body for a completed chat turn.
#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub session_id: SessionId,
    /// Assistant text; empty when the endpoint returned no choices.
    pub reply: String,
    pub outcome: CompletionOutcome,
}

/// GET /api/v1/sessions/{id}/messages - History for a session.
pub async fn get_messages(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<MessageListQuery>,
) -> Result<Json<ApiResponse<Vec<ChatMessage>>>, RequestError> {
    let session_id = SessionId::from(id);
    let messages = match query.limit {
        Some(0) => {
            return Err(ctx.fail(AppError::Validation(
                "limit must be positive".to_string(),
            )));
        }
        Some(limit) => {
            state
                .chat_service
                .get_history_limited(&session_id, limit)
                .await
        }
        None => state.chat_service.get_history(&session_id).await,
    }
    .map_err(|e| ctx.fail(e))?;

    Ok(Json(ctx.success(messages)))
}

/// POST /api/v1/sessions/{id}/messages - Run one chat turn.
///
/// Persistence failures after a successful completion are reported in the
/// envelope's `warnings`, not as an error.
pub async fn send_message(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<SendMessageRequest>,
) -> Result<Json<ApiResponse<SendMessageResponse>>, RequestError> {
    let session_id = SessionId::from(id);
    let reply = state
        .chat_service
        .send_message_with_cancel(&session_id, &body.content, state.shutdown.child_token())
        .await
        .map_err(|e| ctx.fail(e))?;

    let response = SendMessageResponse {
        session_id,
        reply: reply.text().to_string(),
        outcome: reply.outcome,
    };

    Ok(Json(ctx.success(response).with_warning(reply.persistence_warning)))
}
