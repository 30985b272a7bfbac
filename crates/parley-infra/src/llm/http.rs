//! HttpCompletionClient -- concrete [`CompletionClient`] for OpenAI-style
//! `/chat/completions` endpoints (DeepSeek by default).
//!
//! Sends one non-streaming POST per call with bearer authentication and a
//! per-request deadline. The API key is passed in per call as a
//! [`SecretString`] and only exposed when building the `Authorization`
//! header.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use parley_core::llm::client::CompletionClient;
use parley_types::config::ParleyConfig;
use parley_types::error::ChatError;
use parley_types::llm::{ChatCompletionRequest, ChatCompletionResponse, CompletionOutcome};

/// Provider name reported in `gen_ai.system` span attributes.
const PROVIDER_NAME: &str = "deepseek";

/// Completion client over reqwest.
pub struct HttpCompletionClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCompletionClient {
    /// Create a client for `base_url` (without the `/chat/completions` suffix).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    pub fn from_config(config: &ParleyConfig) -> Result<Self, ChatError> {
        Self::new(
            config.base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

fn transport_error(e: reqwest::Error) -> ChatError {
    if e.is_timeout() {
        ChatError::Timeout
    } else {
        ChatError::Transport(e.to_string())
    }
}

impl CompletionClient for HttpCompletionClient {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn complete(
        &self,
        api_key: &SecretString,
        request: &ChatCompletionRequest,
    ) -> Result<CompletionOutcome, ChatError> {
        let url = self.url();
        debug!(url = %url, messages = request.messages.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(transport_error)?;

        if !status.is_success() {
            return Err(ChatError::Upstream {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let parsed: ChatCompletionResponse = serde_json::from_slice(&body)
            .map_err(|e| ChatError::MalformedResponse(e.to_string()))?;

        Ok(CompletionOutcome::from_response(parsed))
    }
}
