use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tower_sessions::Session;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::identity::IdentityUser;
use crate::auth::session as sess;
use crate::config::Environment;
use crate::AppState;

// ── Callback ─────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CallbackQuery {
    pub code: Option<String>,
}

/// GET /auth/callback?code=...
///
/// Completes the hosted login flow: exchanges the one-time code with the
/// identity provider, provisions the local user row, writes the session,
/// and redirects. Failures are terminal; the browser lands on the static
/// error page and no user row is created.
pub async fn auth_callback(
    State(state): State<Arc<AppState>>,
    session: Session,
    headers: HeaderMap,
    Query(query): Query<CallbackQuery>,
) -> Response {
    let base = resolve_redirect_base(state.environment, &headers);

    let Some(code) = query.code.as_deref().filter(|c| !c.trim().is_empty()) else {
        warn!("auth callback missing code");
        audit(&state.db, None, "auth_callback_missing_code", None, None).await;
        return Redirect::to(&format!("{base}/auth/auth-code-error")).into_response();
    };

    let identity = match state.identity.exchange_code(code).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!(error = %e, "auth code exchange failed");
            audit(
                &state.db,
                None,
                "auth_callback_exchange_failed",
                Some(&e.to_string()),
                None,
            )
            .await;
            return Redirect::to(&format!("{base}/auth/auth-code-error")).into_response();
        }
    };

    let user = match upsert_user(&state.db, &identity).await {
        Ok(user) => user,
        Err(e) => {
            error!(email = %identity.email, "user upsert failed: {e}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if let Err(e) = sess::set_user(&session, &user.id, &user.email).await {
        error!("session set_user: {e}");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    info!(user_id = %user.id, "login successful");
    audit(&state.db, Some(&user.id), "login", None, None).await;

    // Users without a linked installation finish setup first.
    if user.github_installation_id.is_none() {
        Redirect::to(&format!("{base}/github/callback")).into_response()
    } else {
        Redirect::to(&base).into_response()
    }
}

/// Where to send the browser after the callback. In development the Host
/// header is authoritative and `x-forwarded-host` is ignored; behind the
/// production proxy the forwarded host wins when present.
fn resolve_redirect_base(environment: Environment, headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    if environment.is_development() {
        return format!("http://{host}");
    }

    let forwarded_host = headers
        .get("x-forwarded-host")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match forwarded_host {
        Some(forwarded) => format!("https://{forwarded}"),
        None => format!("https://{host}"),
    }
}

// ── Error page ────────────────────────────────────────────────────────────────

/// GET /auth/auth-code-error
pub async fn auth_code_error_page() -> impl IntoResponse {
    Html(AUTH_CODE_ERROR_PAGE)
}

static AUTH_CODE_ERROR_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8">
  <meta name="viewport" content="width=device-width, initial-scale=1.0">
  <title>Draftroom</title>
  <style>
    body { margin: 0; background: #0f172a; color: #f8fafc;
           font-family: system-ui, sans-serif;
           display: flex; align-items: flex-start; justify-content: center;
           padding-top: 8rem; min-height: 100vh; }
    .card { background: #1e293b; border: 1px solid #334155; border-radius: 8px;
            padding: 2rem; width: 100%; max-width: 380px; }
    h1 { font-size: 1.1rem; font-weight: 600; margin: 0 0 1rem;
         color: #94a3b8; letter-spacing: .05em; text-transform: uppercase; }
    p { font-size: .9rem; color: #94a3b8; margin: 0 0 1.5rem; line-height: 1.5; }
    a { color: #818cf8; text-decoration: none; font-size: .9rem; }
    a:hover { color: #f8fafc; }
  </style>
</head>
<body>
<div class="card">
  <h1>Sign-in failed</h1>
  <p>The sign-in link was invalid or has already been used. Request a new
  link and try again.</p>
  <a href="/">Back to Draftroom</a>
</div>
</body>
</html>
"#;

// ── Session check ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: String,
    pub email: Option<String>,
}

/// GET /auth/me
pub async fn me(session: Session) -> Response {
    let Some(user_id) = sess::get_user_id(&session).await else {
        return (StatusCode::UNAUTHORIZED, "not authenticated").into_response();
    };
    let email = sess::get_email(&session).await;
    Json(MeResponse { user_id, email }).into_response()
}

/// POST /auth/logout
pub async fn logout(session: Session) -> Response {
    let _ = sess::clear(&session).await;
    Redirect::to("/").into_response()
}

// ── Helpers ───────────────────────────────────────────────────────────────────

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub github_installation_id: Option<String>,
}

/// Provision the user row for an authenticated identity. Keyed on email;
/// the no-op DO UPDATE makes RETURNING yield the existing row unmodified,
/// so concurrent first logins for the same email settle on one row.
async fn upsert_user(pool: &SqlitePool, identity: &IdentityUser) -> Result<UserRow, sqlx::Error> {
    let id = Uuid::new_v4().to_string();
    let now = Utc::now().timestamp();

    sqlx::query_as::<_, UserRow>(
        "INSERT INTO users (id, email, name, github_installation_id, created_at)
         VALUES (?, ?, ?, NULL, ?)
         ON CONFLICT(email) DO UPDATE SET email = excluded.email
         RETURNING id, email, name, github_installation_id",
    )
    .bind(&id)
    .bind(&identity.email)
    .bind(&identity.name)
    .bind(now)
    .fetch_one(pool)
    .await
}

async fn audit(
    pool: &SqlitePool,
    user_id: Option<&str>,
    event: &str,
    detail: Option<&str>,
    ip: Option<&str>,
) {
    let now = Utc::now().timestamp();
    let _ = sqlx::query(
        "INSERT INTO audit_log (user_id, event, detail, ip, created_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(event)
    .bind(detail)
    .bind(ip)
    .bind(now)
    .execute(pool)
    .await;
}
