use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port the studio listens on
    pub port: u16,
    /// Base URL of the remote inline-edit service
    pub edit_service_base_url: String,
    /// Bearer token for the inline-edit service, if it requires one
    pub edit_service_api_key: Option<String>,
    /// Request timeout for inline-edit submissions
    pub edit_service_timeout: Duration,
    /// Origins allowed by CORS (the gateway in local development)
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            port: env_parse("STUDIO_PORT", 8080)?,
            edit_service_base_url: env_str("EDIT_SERVICE_BASE_URL", "http://127.0.0.1:8787"),
            edit_service_api_key: std::env::var("EDIT_SERVICE_API_KEY").ok(),
            edit_service_timeout: Duration::from_secs(env_parse(
                "EDIT_SERVICE_TIMEOUT_SECS",
                30,
            )?),
            cors_allowed_origins: env_csv(
                "STUDIO_CORS_ALLOWED_ORIGINS",
                &["http://localhost:8090", "http://127.0.0.1:8090"],
            ),
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

fn env_csv(key: &str, default: &[&str]) -> Vec<String> {
    match std::env::var(key) {
        Ok(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect(),
        Err(_) => default.iter().map(|s| (*s).to_string()).collect(),
    }
}
