//! Editor session API endpoints
//!
//! Every mutating endpoint routes through the session's EditorActor and
//! responds with the full post-operation snapshot, so clients never have to
//! reconcile partial state.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use ractor::ActorRef;
use serde::{Deserialize, Serialize};
use shared_types::{KeyChord, TextRange, USER_ID_HEADER};

use crate::actors::editor::{EditorError, EditorMsg, KeyOutcome};
use crate::api::ApiState;

/// Editor error codes for machine-readable error responses
#[derive(Debug, Clone)]
pub enum EditorErrorCode {
    InvalidRequest,
    NotFound,
    Conflict,
    UpstreamFailed,
    Internal,
}

impl EditorErrorCode {
    fn as_str(&self) -> &'static str {
        match self {
            EditorErrorCode::InvalidRequest => "INVALID_REQUEST",
            EditorErrorCode::NotFound => "NOT_FOUND",
            EditorErrorCode::Conflict => "CONFLICT",
            EditorErrorCode::UpstreamFailed => "UPSTREAM_FAILED",
            EditorErrorCode::Internal => "INTERNAL",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            EditorErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
            EditorErrorCode::NotFound => StatusCode::NOT_FOUND,
            EditorErrorCode::Conflict => StatusCode::CONFLICT,
            EditorErrorCode::UpstreamFailed => StatusCode::BAD_GATEWAY,
            EditorErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error response structures
#[derive(Debug, Serialize)]
pub struct EditorErrorDetail {
    code: String,
    message: String,
}

#[derive(Debug, Serialize)]
pub struct EditorErrorResponse {
    error: EditorErrorDetail,
}

/// Create an error response
fn editor_error(code: EditorErrorCode, message: impl Into<String>) -> impl IntoResponse {
    let status = code.status_code();
    let body = Json(EditorErrorResponse {
        error: EditorErrorDetail {
            code: code.as_str().to_string(),
            message: message.into(),
        },
    });
    (status, body)
}

/// Map an actor-level editor error onto the HTTP error envelope
fn map_editor_error(error: EditorError) -> axum::response::Response {
    let message = error.to_string();
    let code = match error {
        EditorError::Validation(_) => EditorErrorCode::InvalidRequest,
        EditorError::SubmissionInFlight
        | EditorError::DecisionPending
        | EditorError::PopoverClosed
        | EditorError::Superseded => EditorErrorCode::Conflict,
        EditorError::EditService(_) => EditorErrorCode::UpstreamFailed,
    };
    editor_error(code, message).into_response()
}

/// Resolve a session id to its actor, or produce the error response
async fn resolve_session(
    state: &ApiState,
    session_id: &str,
) -> Result<ActorRef<EditorMsg>, axum::response::Response> {
    match state.app_state.resolve_session(session_id.to_string()).await {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err(editor_error(
            EditorErrorCode::NotFound,
            format!("No editor session: {session_id}"),
        )
        .into_response()),
        Err(e) => Err(editor_error(
            EditorErrorCode::Internal,
            format!("Failed to resolve editor session: {e}"),
        )
        .into_response()),
    }
}

/// Request to create an editor session
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub content: Option<String>,
}

/// Create a new editor session and return its initial snapshot
pub async fn create_session(
    State(state): State<ApiState>,
    headers: HeaderMap,
    body: Option<Json<CreateSessionRequest>>,
) -> impl IntoResponse {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("anonymous")
        .to_string();
    let content = body
        .map(|Json(req)| req.content.unwrap_or_default())
        .unwrap_or_default();

    let (_, session) = match state.app_state.open_session(user_id, content).await {
        Ok(opened) => opened,
        Err(e) => {
            return editor_error(
                EditorErrorCode::Internal,
                format!("Failed to open editor session: {e}"),
            )
            .into_response();
        }
    };

    match ractor::call!(session, |reply| EditorMsg::Snapshot { reply }) {
        Ok(snapshot) => (StatusCode::CREATED, Json(snapshot)).into_response(),
        Err(e) => editor_error(
            EditorErrorCode::Internal,
            format!("Editor session did not respond: {e}"),
        )
        .into_response(),
    }
}

/// Fetch the current snapshot of a session
pub async fn get_snapshot(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let session = match resolve_session(&state, &session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    match ractor::call!(session, |reply| EditorMsg::Snapshot { reply }) {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => editor_error(
            EditorErrorCode::Internal,
            format!("Editor session did not respond: {e}"),
        )
        .into_response(),
    }
}

/// Close a session, rejecting any pending suggestion
pub async fn close_session(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match state.app_state.close_session(session_id.clone()).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => editor_error(
            EditorErrorCode::NotFound,
            format!("No editor session: {session_id}"),
        )
        .into_response(),
        Err(e) => editor_error(
            EditorErrorCode::Internal,
            format!("Failed to close editor session: {e}"),
        )
        .into_response(),
    }
}

/// Request to move the selection
#[derive(Debug, Deserialize)]
pub struct SelectionRequest {
    pub from: usize,
    pub to: usize,
}

/// Move the selection within the document
pub async fn set_selection(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
    Json(req): Json<SelectionRequest>,
) -> impl IntoResponse {
    let session = match resolve_session(&state, &session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let result = ractor::call!(session, |reply| EditorMsg::SetSelection {
        range: TextRange::new(req.from, req.to),
        reply,
    });
    respond_with_snapshot(result)
}

/// Toggle the edit popover open or closed
pub async fn toggle_popover(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let session = match resolve_session(&state, &session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    match ractor::call!(session, |reply| EditorMsg::TogglePopover { reply }) {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => editor_error(
            EditorErrorCode::Internal,
            format!("Editor session did not respond: {e}"),
        )
        .into_response(),
    }
}

/// Dismiss the popover, auto-rejecting any pending suggestion
pub async fn close_popover(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let session = match resolve_session(&state, &session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    match ractor::call!(session, |reply| EditorMsg::ClosePopover { reply }) {
        Ok(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        Err(e) => editor_error(
            EditorErrorCode::Internal,
            format!("Editor session did not respond: {e}"),
        )
        .into_response(),
    }
}

/// Request to submit an edit instruction
#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    pub instruction: String,
}

/// Submit an instruction for the current selection
pub async fn submit(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
    Json(req): Json<SubmitRequest>,
) -> impl IntoResponse {
    let session = match resolve_session(&state, &session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let result = ractor::call!(session, |reply| EditorMsg::Submit {
        instruction: req.instruction,
        reply,
    });
    respond_with_snapshot(result)
}

/// Accept the pending suggestion
pub async fn accept(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let session = match resolve_session(&state, &session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let result = ractor::call!(session, |reply| EditorMsg::Accept { reply });
    respond_with_snapshot(result)
}

/// Reject the pending suggestion
pub async fn reject(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let session = match resolve_session(&state, &session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let result = ractor::call!(session, |reply| EditorMsg::Reject { reply });
    respond_with_snapshot(result)
}

/// Request describing a keyboard chord
#[derive(Debug, Deserialize)]
pub struct KeyRequest {
    pub key: String,
    #[serde(default)]
    pub ctrl: bool,
    #[serde(default)]
    pub meta: bool,
    #[serde(default)]
    pub shift: bool,
    #[serde(default)]
    pub instruction: Option<String>,
}

/// Response for a keyboard chord: the resolved action plus the snapshot
#[derive(Debug, Serialize)]
pub struct KeyResponse {
    pub action: Option<&'static str>,
    #[serde(flatten)]
    pub snapshot: shared_types::EditorSnapshot,
}

/// Feed a keyboard chord through the popover keymap
pub async fn key(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
    Json(req): Json<KeyRequest>,
) -> impl IntoResponse {
    let session = match resolve_session(&state, &session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let chord = KeyChord {
        key: req.key,
        ctrl: req.ctrl,
        meta: req.meta,
        shift: req.shift,
    };
    let result = ractor::call!(session, |reply| EditorMsg::Key {
        chord,
        instruction: req.instruction,
        reply,
    });
    match result {
        Ok(Ok(KeyOutcome { action, snapshot })) => (
            StatusCode::OK,
            Json(KeyResponse {
                action: action.map(|a| a.as_str()),
                snapshot,
            }),
        )
            .into_response(),
        Ok(Err(error)) => map_editor_error(error),
        Err(e) => editor_error(
            EditorErrorCode::Internal,
            format!("Editor session did not respond: {e}"),
        )
        .into_response(),
    }
}

/// Query for link lookup at a caret position
#[derive(Debug, Deserialize)]
pub struct LinkAtQuery {
    pub pos: usize,
}

/// Look up the link containing a position, if any
pub async fn link_at(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
    Query(query): Query<LinkAtQuery>,
) -> impl IntoResponse {
    let session = match resolve_session(&state, &session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    match ractor::call!(session, |reply| EditorMsg::LinkAt {
        pos: query.pos,
        reply,
    }) {
        Ok(link) => (StatusCode::OK, Json(serde_json::json!({ "link": link }))).into_response(),
        Err(e) => editor_error(
            EditorErrorCode::Internal,
            format!("Editor session did not respond: {e}"),
        )
        .into_response(),
    }
}

/// Request to apply a link over the current selection
#[derive(Debug, Deserialize)]
pub struct LinkRequest {
    pub href: String,
    #[serde(default)]
    pub open_in_new_tab: bool,
}

/// Apply a link across the selection's extent
pub async fn set_link(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
    Json(req): Json<LinkRequest>,
) -> impl IntoResponse {
    let session = match resolve_session(&state, &session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let result = ractor::call!(session, |reply| EditorMsg::SetLink {
        href: req.href,
        open_in_new_tab: req.open_in_new_tab,
        reply,
    });
    respond_with_snapshot(result)
}

/// Remove every link overlapping the selection's extent
pub async fn unset_link(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let session = match resolve_session(&state, &session_id).await {
        Ok(session) => session,
        Err(response) => return response,
    };

    let result = ractor::call!(session, |reply| EditorMsg::UnsetLink { reply });
    respond_with_snapshot(result)
}

/// Shared response shape for endpoints that return `Result<EditorSnapshot, EditorError>`
fn respond_with_snapshot(
    result: Result<
        Result<shared_types::EditorSnapshot, EditorError>,
        ractor::RactorErr<EditorMsg>,
    >,
) -> axum::response::Response {
    match result {
        Ok(Ok(snapshot)) => (StatusCode::OK, Json(snapshot)).into_response(),
        Ok(Err(error)) => map_editor_error(error),
        Err(e) => editor_error(
            EditorErrorCode::Internal,
            format!("Editor session did not respond: {e}"),
        )
        .into_response(),
    }
}
