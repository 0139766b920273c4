//! Client for the remote inline-edit service.

use std::time::Duration;

use shared_types::{InlineEditRequest, InlineEditResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditServiceError {
    #[error("edit service request failed: {0}")]
    Request(String),

    #[error("edit service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("edit service response could not be parsed: {0}")]
    Parse(String),
}

/// Typed client over the inline-edit endpoint. Cheap to clone; the underlying
/// reqwest client is shared.
#[derive(Debug, Clone)]
pub struct EditServiceClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl EditServiceClient {
    /// The timeout bounds every submission, so a hung upstream can never
    /// leave a popover stuck in the submitting state.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, EditServiceError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EditServiceError::Request(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Submit an edit instruction with its document context; returns the
    /// suggested replacement text for the selection (possibly empty).
    pub async fn suggest(&self, request: &InlineEditRequest) -> Result<String, EditServiceError> {
        let url = format!("{}/v1/inline-edit", self.base_url);

        let mut builder = self.http.post(&url).json(request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| EditServiceError::Request(e.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(EditServiceError::Status { status, body });
        }

        let payload: InlineEditResponse = response
            .json()
            .await
            .map_err(|e| EditServiceError::Parse(e.to_string()))?;
        Ok(payload.edit)
    }
}
