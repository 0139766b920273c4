use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn from_env(value: &str) -> anyhow::Result<Self> {
        match value {
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(anyhow::anyhow!(
                "Invalid ENVIRONMENT '{other}'. Expected 'development' or 'production'"
            )),
        }
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the gateway listens on
    pub port: u16,
    /// Deployment environment; controls forwarded-host trust on redirects
    pub environment: Environment,
    /// Path to the gateway SQLite database
    pub database_url: String,
    /// Base URL of the identity provider
    pub identity_base_url: String,
    /// Publishable API key sent with identity provider requests
    pub identity_anon_key: String,
    /// Request timeout for identity provider calls
    pub identity_timeout: Duration,
    /// Port the studio backend listens on (proxy target)
    pub studio_port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            port: env_parse("GATEWAY_PORT", 8090)?,
            environment: Environment::from_env(&env_str("ENVIRONMENT", "development"))?,
            database_url: env_str("GATEWAY_DATABASE_URL", "sqlite:./data/gateway.db"),
            identity_base_url: env_str("IDENTITY_BASE_URL", "http://127.0.0.1:54321"),
            identity_anon_key: env_str("IDENTITY_ANON_KEY", ""),
            identity_timeout: Duration::from_secs(env_parse("IDENTITY_TIMEOUT_SECS", 30)?),
            studio_port: env_parse("STUDIO_PORT", 8080)?,
        })
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        Err(_) => Ok(default),
    }
}
