use std::sync::Arc;

use gateway::auth::identity::IdentityClient;
use gateway::{app, config, db, session_store, AppState};
use tower_sessions::{Expiry, SessionManagerLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gateway=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config::Config::from_env()?;
    info!(port = config.port, "gateway starting");

    // Database
    let db = db::connect(&config.database_url).await?;

    // Session store — SQLite-backed, sessions survive gateway restarts.
    // The sessions table ships with the gateway migrations.
    let session_store = session_store::SqliteSessionStore::new(db.clone());
    tokio::spawn(
        session_store
            .clone()
            .sweep_expired(std::time::Duration::from_secs(3600)),
    );

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false) // set true in prod (HTTPS only)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(24)));

    let identity = IdentityClient::new(
        &config.identity_base_url,
        config.identity_anon_key.clone(),
        config.identity_timeout,
    )?;

    let state = Arc::new(AppState {
        db,
        environment: config.environment,
        identity,
        studio_port: config.studio_port,
    });

    let app = app::build_app(state, session_layer);

    let addr = format!("0.0.0.0:{}", config.port);
    info!("listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
