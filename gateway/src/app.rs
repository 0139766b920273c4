use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tower_sessions::SessionManagerLayer;

use crate::auth::handlers;
use crate::middleware;
use crate::session_store::SqliteSessionStore;
use crate::state::AppState;

/// Assemble the gateway router: auth endpoints, session layer, and the
/// authenticated fallback proxy to the studio.
pub fn build_app(
    state: Arc<AppState>,
    session_layer: SessionManagerLayer<SqliteSessionStore>,
) -> Router {
    Router::new()
        .route("/auth/callback", get(handlers::auth_callback))
        .route("/auth/auth-code-error", get(handlers::auth_code_error_page))
        .route("/auth/me", get(handlers::me))
        .route("/auth/logout", post(handlers::logout))
        // All other traffic → proxy to the studio (auth enforced by middleware)
        .fallback(middleware::proxy_to_studio)
        .layer(axum_middleware::from_fn_with_state(
            Arc::clone(&state),
            middleware::require_auth,
        ))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
