
use std::time::Duration;

use tracing::{debug, warn};
use url::Url;

use crate::completion::{
    ChatRequest, CompletionClient, CompletionError, CompletionResponse, GenerationParams, Message,
};
use crate::config::{CompletionConfig, ConfigError};

const AUTHORIZATION_HEADER: &str = "authorization";

/// Blocking client for an OpenAI-style `chat/completions` endpoint.
///
/// Defaults target the Sarvam API, which authenticates with an
/// `api-subscription-key` header. Configuring `Authorization` as the auth
/// header sends the key as a bearer token instead.
#[derive(Debug, Clone)]
pub struct SarvamClient {
    endpoint: Url,
    auth_header: String,
    api_key: String,
    params: GenerationParams,
    agent: ureq::Agent,
}

impl SarvamClient {
    /// Build a client, reading the API key from the configured environment variable
    #[inline]
    pub fn from_config(config: &CompletionConfig) -> Result<Self, ConfigError> {
        let api_key = config.api_key()?;
        Self::new(config, api_key)
    }

    #[inline]
    pub fn new(config: &CompletionConfig, api_key: impl Into<String>) -> Result<Self, ConfigError> {
        let endpoint = config.endpoint_url()?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_seconds)))
            .http_status_as_error(false)
            .build()
            .into();

        Ok(Self {
            endpoint,
            auth_header: config.auth_header.clone(),
            api_key: api_key.into(),
            params: GenerationParams::from(config),
            agent,
        })
    }

    #[inline]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    #[inline]
    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    fn auth_value(&self) -> String {
        if self.auth_header.eq_ignore_ascii_case(AUTHORIZATION_HEADER) {
            format!("Bearer {}", self.api_key)
        } else {
            self.api_key.clone()
        }
    }
}

impl CompletionClient for SarvamClient {
    #[inline]
    fn model_id(&self) -> &str {
        &self.params.model
    }

    #[inline]
    fn complete(&self, messages: &[Message]) -> Result<CompletionResponse, CompletionError> {
        let request = ChatRequest {
            messages,
            params: &self.params,
        };
        let body = serde_json::to_string(&request)
            .map_err(|e| CompletionError::Transport(format!("Failed to encode request: {}", e)))?;

        debug!(
            "Sending {} messages to {} (model {})",
            messages.len(),
            self.endpoint,
            self.params.model
        );

        let mut response = self
            .agent
            .post(self.endpoint.as_str())
            .header("Content-Type", "application/json")
            .header(self.auth_header.as_str(), self.auth_value())
            .send(&body)
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .body_mut()
            .read_to_string()
            .map_err(|e| CompletionError::Transport(e.to_string()))?;

        if !(200..300).contains(&status) {
            warn!("Completion endpoint returned HTTP {}", status);
            return Err(CompletionError::Status { status, body: text });
        }

        let parsed: CompletionResponse =
            serde_json::from_str(&text).map_err(|e| CompletionError::Decode(e.to_string()))?;

        debug!("Completion returned {} choices", parsed.choices.len());
        Ok(parsed)
    }
}
