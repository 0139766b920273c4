use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;

use crate::{auth::session as sess, AppState};

/// Middleware: require an authenticated session.
/// Auth endpoints stay reachable; everything else gets 401 without a session.
pub async fn require_auth(
    State(_state): State<Arc<AppState>>,
    session: Session,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path();

    if path.starts_with("/auth/") {
        return next.run(req).await;
    }

    if sess::get_user_id(&session).await.is_none() {
        return (StatusCode::UNAUTHORIZED, "not authenticated").into_response();
    }

    next.run(req).await
}

/// Fallback handler: forward authenticated traffic to the studio backend.
pub async fn proxy_to_studio(
    State(state): State<Arc<AppState>>,
    session: Session,
    req: Request,
) -> Response {
    let user_id = match sess::get_user_id(&session).await {
        Some(id) => id,
        None => return (StatusCode::UNAUTHORIZED, "not authenticated").into_response(),
    };

    crate::proxy::forward_to_studio(req, &user_id, state.studio_port).await
}
