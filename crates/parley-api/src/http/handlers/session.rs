//! Session HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/sessions            - Reserve a new `Session<N>`
//! - GET  /api/v1/sessions            - List sessions with titles
//! - GET  /api/v1/sessions/{id}/title - Stored title of one session

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use parley_types::chat::{DEFAULT_SESSION_TITLE, Session, SessionId};

use crate::http::error::RequestError;
use crate::http::extractors::RequestContext;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Response body for a session title lookup.
#[derive(Debug, Serialize)]
pub struct SessionTitle {
    pub session_id: SessionId,
    /// `null` when no title has been recorded yet.
    pub title: Option<String>,
    /// `title`, or the placeholder shown for untitled sessions.
    pub display_title: String,
}

impl SessionTitle {
    pub fn new(session_id: SessionId, title: Option<String>) -> Self {
        let display_title = title
            .clone()
            .unwrap_or_else(|| DEFAULT_SESSION_TITLE.to_string());
        Self {
            session_id,
            title,
            display_title,
        }
    }
}

/// POST /api/v1/sessions - Reserve a new session.
pub async fn create_session(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Session>>, RequestError> {
    let id = state
        .chat_service
        .create_session()
        .await
        .map_err(|e| ctx.fail(e))?;

    Ok(Json(ctx.success(Session { id, title: None })))
}

/// GET /api/v1/sessions - List sessions in creation order.
pub async fn list_sessions(
    ctx: RequestContext,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Session>>>, RequestError> {
    let sessions = state
        .chat_service
        .list_sessions_with_titles()
        .await
        .map_err(|e| ctx.fail(e))?;

    Ok(Json(ctx.success(sessions)))
}

/// GET /api/v1/sessions/{id}/title - Title of a session.
pub async fn get_title(
    ctx: RequestContext,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SessionTitle>>, RequestError> {
    let session_id = SessionId::from(id);
    let title = state
        .chat_service
        .get_title(&session_id)
        .await
        .map_err(|e| ctx.fail(e))?;

    Ok(Json(ctx.success(SessionTitle::new(session_id, title))))
}
