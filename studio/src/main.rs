use axum::http::{header, HeaderValue, Method};
use std::sync::Arc;
use studio::api;
use studio::app_state::AppState;
use studio::config::Config;
use studio::edit_service::EditServiceClient;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};

fn load_env_file() {
    let cwd = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            tracing::warn!(error = %e, "Could not determine current directory for .env lookup");
            return;
        }
    };

    let mut current = cwd.clone();
    loop {
        let candidate = current.join(".env");
        if candidate.exists() {
            match dotenvy::from_path(&candidate) {
                Ok(_) => {
                    tracing::info!(path = %candidate.display(), "Loaded environment from .env");
                }
                Err(e) => {
                    tracing::warn!(
                        path = %candidate.display(),
                        error = %e,
                        "Failed to load .env file"
                    );
                }
            }
            return;
        }

        if !current.pop() {
            break;
        }
    }

    tracing::info!(
        cwd = %cwd.display(),
        "No .env file found in current directory or ancestors; using process environment only"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    // Load .env values early so the edit-service key is available before any
    // session actor spawns. Search the current directory and ancestors so
    // running from `studio/` still picks up repo-root `.env`.
    load_env_file();

    tracing::info!("Starting Draftroom Studio API Server");

    let config = Config::from_env()?;

    let edit_service = EditServiceClient::new(
        &config.edit_service_base_url,
        config.edit_service_api_key.clone(),
        config.edit_service_timeout,
    )?;

    let app_state = Arc::new(AppState::new(edit_service));
    let _ = app_state
        .ensure_supervisor()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to spawn EditorSupervisor: {e}"))?;

    tracing::info!(port = config.port, "Starting HTTP server");

    // Configure CORS to allow known UI origins (the gateway in development)
    let allowed_origins = config
        .cors_allowed_origins
        .iter()
        .map(|origin| HeaderValue::from_str(origin))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {e}"))?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
        .max_age(std::time::Duration::from_secs(3600));

    let api_state = api::ApiState { app_state };

    let app = api::router().with_state(api_state).layer(cors);

    let listener = TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
