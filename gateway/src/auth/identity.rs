use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity request failed: {0}")]
    Request(String),
    #[error("identity exchange returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("identity response could not be parsed: {0}")]
    Parse(String),
    #[error("identity response is missing the user id or email")]
    MissingIdentity,
}

/// Authenticated user as reported by the identity provider.
#[derive(Debug, Clone)]
pub struct IdentityUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    user: Option<TokenUser>,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: Option<String>,
    email: Option<String>,
    user_metadata: Option<UserMetadata>,
}

#[derive(Debug, Deserialize)]
struct UserMetadata {
    name: Option<String>,
}

/// Client for the identity provider's one-time-code exchange endpoint.
#[derive(Debug, Clone)]
pub struct IdentityClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

impl IdentityClient {
    pub fn new(base_url: &str, anon_key: String, timeout: Duration) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
        })
    }

    /// Exchange an auth code for the identity it proves. The code is
    /// single-use; a replayed code comes back as a non-2xx status.
    pub async fn exchange_code(&self, code: &str) -> Result<IdentityUser, IdentityError> {
        let url = format!(
            "{}/auth/v1/token?grant_type=authorization_code",
            self.base_url
        );

        let response = self
            .http
            .post(&url)
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "auth_code": code }))
            .send()
            .await
            .map_err(|e| IdentityError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Parse(e.to_string()))?;

        let user = token.user.ok_or(IdentityError::MissingIdentity)?;
        let id = user.id.filter(|v| !v.is_empty());
        let email = user.email.filter(|v| !v.is_empty());
        let (Some(id), Some(email)) = (id, email) else {
            return Err(IdentityError::MissingIdentity);
        };
        let name = user.user_metadata.and_then(|m| m.name);

        Ok(IdentityUser { id, email, name })
    }
}
