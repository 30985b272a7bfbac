//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Sessions
        .route(
            "/sessions",
            get(handlers::session::list_sessions).post(handlers::session::create_session),
        )
        .route("/sessions/{id}/title", get(handlers::session::get_title))
        // Messages
        .route(
            "/sessions/{id}/messages",
            get(handlers::message::get_messages).post(handlers::message::send_message),
        )
        // API key
        .route(
            "/api-key",
            get(handlers::api_key::get_api_key).put(handlers::api_key::set_api_key),
        );

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
