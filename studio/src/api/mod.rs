//! HTTP API routes for the Draftroom studio
//!
//! RESTful endpoints bridge the actor system to the UI, giving clients
//! stateless HTTP access to per-session editor state.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;

pub mod editor;

use crate::app_state::AppState;

#[derive(Clone)]
pub struct ApiState {
    pub app_state: Arc<AppState>,
}

/// Configure all API routes
pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health_check))
        // Editor session routes
        .route("/api/editor", post(editor::create_session))
        .route(
            "/api/editor/{session_id}",
            get(editor::get_snapshot).delete(editor::close_session),
        )
        .route(
            "/api/editor/{session_id}/selection",
            post(editor::set_selection),
        )
        .route(
            "/api/editor/{session_id}/popover/toggle",
            post(editor::toggle_popover),
        )
        .route(
            "/api/editor/{session_id}/popover/close",
            post(editor::close_popover),
        )
        .route("/api/editor/{session_id}/submit", post(editor::submit))
        .route("/api/editor/{session_id}/accept", post(editor::accept))
        .route("/api/editor/{session_id}/reject", post(editor::reject))
        .route("/api/editor/{session_id}/key", post(editor::key))
        .route(
            "/api/editor/{session_id}/link",
            get(editor::link_at)
                .post(editor::set_link)
                .delete(editor::unset_link),
        )
        .fallback(not_found)
}

/// Health check endpoint
pub async fn health_check(State(_state): State<ApiState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
        "status": "healthy",
        "service": "draftroom-studio",
        "version": "0.1.0"
        })),
    )
}

/// JSON 404 for unmatched routes
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": {
                "code": "NOT_FOUND",
                "message": "Unknown route"
            }
        })),
    )
}
