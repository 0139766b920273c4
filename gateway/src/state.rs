use sqlx::SqlitePool;

use crate::auth::identity::IdentityClient;
use crate::config::Environment;

/// Shared application state for the gateway
pub struct AppState {
    pub db: SqlitePool,
    pub environment: Environment,
    pub identity: IdentityClient,
    pub studio_port: u16,
}
