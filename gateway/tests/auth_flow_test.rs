//! Integration tests for the gateway: callback login flow, session
//! endpoints, and the authenticated proxy fallback.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use gateway::auth::identity::IdentityClient;
use gateway::config::Environment;
use gateway::session_store::SqliteSessionStore;
use gateway::{app, db, AppState};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use tower_sessions::{Expiry, SessionManagerLayer};

// ===== Test harness =====

#[derive(Clone)]
enum IdentityStub {
    /// Exchange succeeds with this profile.
    User {
        id: &'static str,
        email: &'static str,
        name: &'static str,
    },
    /// Exchange is rejected (expired or replayed code).
    Denied,
}

async fn spawn_identity_stub(stub: IdentityStub) -> String {
    let app = Router::new().route(
        "/auth/v1/token",
        post(move || {
            let stub = stub.clone();
            async move {
                match stub {
                    IdentityStub::User { id, email, name } => (
                        StatusCode::OK,
                        Json(json!({
                            "user": {
                                "id": id,
                                "email": email,
                                "user_metadata": { "name": name }
                            }
                        })),
                    )
                        .into_response(),
                    IdentityStub::Denied => (
                        StatusCode::UNAUTHORIZED,
                        Json(json!({ "error": "invalid auth code" })),
                    )
                        .into_response(),
                }
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    format!("http://{addr}")
}

/// Fake studio backend: echoes back what the proxy forwarded.
async fn spawn_studio_stub() -> u16 {
    let app = Router::new().fallback(|req: Request<Body>| async move {
        let header_str = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string()
        };
        Json(json!({
            "path": req.uri().path(),
            "user_id": header_str(shared_types::USER_ID_HEADER),
            "proxy_authenticated": header_str(shared_types::PROXY_AUTH_HEADER),
            "has_cookie": req.headers().contains_key(header::COOKIE),
            "has_authorization": req.headers().contains_key(header::AUTHORIZATION),
        }))
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    port
}

struct TestGateway {
    app: Router,
    db: sqlx::SqlitePool,
    _tmp: tempfile::TempDir,
}

async fn setup_gateway(
    environment: Environment,
    identity_base_url: &str,
    studio_port: u16,
) -> TestGateway {
    let tmp = tempfile::tempdir().unwrap();
    let db_path = tmp.path().join("gateway.db");
    let db = db::connect(&format!("sqlite:{}", db_path.display()))
        .await
        .unwrap();

    let session_store = SqliteSessionStore::new(db.clone());
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(24)));

    let identity = IdentityClient::new(
        identity_base_url,
        "test-anon-key".to_string(),
        Duration::from_secs(2),
    )
    .unwrap();

    let state = Arc::new(AppState {
        db: db.clone(),
        environment,
        identity,
        studio_port,
    });

    TestGateway {
        app: app::build_app(state, session_layer),
        db,
        _tmp: tmp,
    }
}

async fn dev_gateway(stub: IdentityStub) -> TestGateway {
    let identity_url = spawn_identity_stub(stub).await;
    setup_gateway(Environment::Development, &identity_url, 0).await
}

fn get(path: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(path)
        .header(header::HOST, "localhost:8090")
        .body(Body::empty())
        .unwrap()
}

fn get_with_cookie(path: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(path)
        .header(header::HOST, "localhost:8090")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn location(res: &axum::response::Response) -> String {
    res.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .expect("response should carry a Location header")
        .to_string()
}

fn session_cookie(res: &axum::response::Response) -> String {
    res.headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or("").to_string())
        .expect("response should set a session cookie")
}

async fn json_body(res: axum::response::Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn user_count(db: &sqlx::SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(db)
        .await
        .unwrap()
}

// ===== Callback flow =====

#[tokio::test]
async fn test_callback_missing_code_redirects_to_error_page() {
    let gw = dev_gateway(IdentityStub::Denied).await;

    let res = gw.app.clone().oneshot(get("/auth/callback")).await.unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&res),
        "http://localhost:8090/auth/auth-code-error"
    );
    assert_eq!(user_count(&gw.db).await, 0);
}

#[tokio::test]
async fn test_callback_exchange_failure_redirects_to_error_page() {
    let gw = dev_gateway(IdentityStub::Denied).await;

    let res = gw
        .app
        .clone()
        .oneshot(get("/auth/callback?code=expired"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&res),
        "http://localhost:8090/auth/auth-code-error"
    );
    assert_eq!(user_count(&gw.db).await, 0);
}

#[tokio::test]
async fn test_callback_provisions_user_and_sets_session() {
    let gw = dev_gateway(IdentityStub::User {
        id: "provider-1",
        email: "ada@example.com",
        name: "Ada",
    })
    .await;

    let res = gw
        .app
        .clone()
        .oneshot(get("/auth/callback?code=valid"))
        .await
        .unwrap();

    // New users have no linked installation yet.
    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "http://localhost:8090/github/callback");

    let (id, email, name): (String, String, Option<String>) =
        sqlx::query_as("SELECT id, email, name FROM users")
            .fetch_one(&gw.db)
            .await
            .unwrap();
    assert!(uuid::Uuid::parse_str(&id).is_ok());
    assert_eq!(email, "ada@example.com");
    assert_eq!(name.as_deref(), Some("Ada"));

    // The session cookie from the redirect authenticates /auth/me.
    let cookie = session_cookie(&res);
    let me = gw
        .app
        .clone()
        .oneshot(get_with_cookie("/auth/me", &cookie))
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::OK);
    let body = json_body(me).await;
    assert_eq!(body["user_id"], id.as_str());
    assert_eq!(body["email"], "ada@example.com");
}

#[tokio::test]
async fn test_callback_with_linked_installation_redirects_home() {
    let gw = dev_gateway(IdentityStub::User {
        id: "provider-1",
        email: "ada@example.com",
        name: "Ada",
    })
    .await;

    sqlx::query(
        "INSERT INTO users (id, email, name, github_installation_id, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind("existing-user")
    .bind("ada@example.com")
    .bind("Original Name")
    .bind("installation-42")
    .bind(0i64)
    .execute(&gw.db)
    .await
    .unwrap();

    let res = gw
        .app
        .clone()
        .oneshot(get("/auth/callback?code=valid"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&res), "http://localhost:8090");

    // The existing row is returned unmodified by the upsert.
    assert_eq!(user_count(&gw.db).await, 1);
    let (id, name): (String, Option<String>) = sqlx::query_as("SELECT id, name FROM users")
        .fetch_one(&gw.db)
        .await
        .unwrap();
    assert_eq!(id, "existing-user");
    assert_eq!(name.as_deref(), Some("Original Name"));

    let cookie = session_cookie(&res);
    let me = gw
        .app
        .clone()
        .oneshot(get_with_cookie("/auth/me", &cookie))
        .await
        .unwrap();
    let body = json_body(me).await;
    assert_eq!(body["user_id"], "existing-user");
}

#[tokio::test]
async fn test_concurrent_duplicate_callbacks_create_one_user() {
    let gw = dev_gateway(IdentityStub::User {
        id: "provider-1",
        email: "ada@example.com",
        name: "Ada",
    })
    .await;

    let (first, second) = tokio::join!(
        gw.app.clone().oneshot(get("/auth/callback?code=first")),
        gw.app.clone().oneshot(get("/auth/callback?code=second")),
    );

    assert_eq!(first.unwrap().status(), StatusCode::SEE_OTHER);
    assert_eq!(second.unwrap().status(), StatusCode::SEE_OTHER);
    assert_eq!(user_count(&gw.db).await, 1);
}

// ===== Redirect base resolution =====

#[tokio::test]
async fn test_forwarded_host_ignored_in_development() {
    let gw = dev_gateway(IdentityStub::User {
        id: "provider-1",
        email: "ada@example.com",
        name: "Ada",
    })
    .await;

    let req = Request::builder()
        .method("GET")
        .uri("/auth/callback?code=valid")
        .header(header::HOST, "localhost:8090")
        .header("x-forwarded-host", "app.draftroom.io")
        .body(Body::empty())
        .unwrap();
    let res = gw.app.clone().oneshot(req).await.unwrap();

    assert_eq!(
        location(&res),
        "http://localhost:8090/github/callback"
    );
}

#[tokio::test]
async fn test_forwarded_host_honored_in_production() {
    let identity_url = spawn_identity_stub(IdentityStub::User {
        id: "provider-1",
        email: "ada@example.com",
        name: "Ada",
    })
    .await;
    let gw = setup_gateway(Environment::Production, &identity_url, 0).await;

    let req = Request::builder()
        .method("GET")
        .uri("/auth/callback?code=valid")
        .header(header::HOST, "10.0.0.5:8090")
        .header("x-forwarded-host", "app.draftroom.io")
        .body(Body::empty())
        .unwrap();
    let res = gw.app.clone().oneshot(req).await.unwrap();

    assert_eq!(
        location(&res),
        "https://app.draftroom.io/github/callback"
    );
}

// ===== Session endpoints =====

#[tokio::test]
async fn test_me_requires_session() {
    let gw = dev_gateway(IdentityStub::Denied).await;

    let res = gw.app.clone().oneshot(get("/auth/me")).await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_session() {
    let gw = dev_gateway(IdentityStub::User {
        id: "provider-1",
        email: "ada@example.com",
        name: "Ada",
    })
    .await;

    let login = gw
        .app
        .clone()
        .oneshot(get("/auth/callback?code=valid"))
        .await
        .unwrap();
    let cookie = session_cookie(&login);

    let logout = gw
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth/logout")
                .header(header::HOST, "localhost:8090")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(logout.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&logout), "/");

    let me = gw
        .app
        .clone()
        .oneshot(get_with_cookie("/auth/me", &cookie))
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_error_page_is_served() {
    let gw = dev_gateway(IdentityStub::Denied).await;

    let res = gw
        .app
        .clone()
        .oneshot(get("/auth/auth-code-error"))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let html = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(html.contains("Sign-in failed"));
}

// ===== Proxy fallback =====

#[tokio::test]
async fn test_unauthenticated_requests_are_rejected() {
    let gw = dev_gateway(IdentityStub::Denied).await;

    let res = gw
        .app
        .clone()
        .oneshot(get("/api/editor/some-session"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_authenticated_requests_proxy_with_identity_headers() {
    let identity_url = spawn_identity_stub(IdentityStub::User {
        id: "provider-1",
        email: "ada@example.com",
        name: "Ada",
    })
    .await;
    let studio_port = spawn_studio_stub().await;
    let gw = setup_gateway(Environment::Development, &identity_url, studio_port).await;

    let login = gw
        .app
        .clone()
        .oneshot(get("/auth/callback?code=valid"))
        .await
        .unwrap();
    let cookie = session_cookie(&login);

    let (user_id,): (String,) = sqlx::query_as("SELECT id FROM users")
        .fetch_one(&gw.db)
        .await
        .unwrap();

    // Client-supplied credentials must not reach the studio.
    let req = Request::builder()
        .method("GET")
        .uri("/api/editor/some-session")
        .header(header::HOST, "localhost:8090")
        .header(header::COOKIE, &cookie)
        .header(header::AUTHORIZATION, "Bearer client-token")
        .body(Body::empty())
        .unwrap();
    let res = gw.app.clone().oneshot(req).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let body = json_body(res).await;
    assert_eq!(body["path"], "/api/editor/some-session");
    assert_eq!(body["user_id"], user_id.as_str());
    assert_eq!(body["proxy_authenticated"], "true");
    assert_eq!(body["has_cookie"], false);
    assert_eq!(body["has_authorization"], false);
}
