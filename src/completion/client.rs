//! OpenAI-compatible completion client.
//!
//! Sends non-streaming chat completion requests to the configured provider
//! endpoint. When the primary model fails retriably (connection, timeout,
//! rate limit, 5xx), the request is attempted exactly once more against the
//! configured backup model before the error propagates.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;

use super::config::CompletionConfig;
use super::errors::CompletionError;
use super::gateway::CompletionGateway;
use super::types::{ChatCompletionRequest, ChatCompletionResponse};

// ─── Constants ───────────────────────────────────────────────────────────────

/// TCP connection timeout.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Total request timeout. Extraction calls return at most ~1k tokens, so a
/// hosted provider that has not answered in 30s is not going to.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ─── CompletionClient ────────────────────────────────────────────────────────

/// Client for the completion provider endpoint.
pub struct CompletionClient {
    http: HttpClient,
    config: CompletionConfig,
}

impl CompletionClient {
    /// Create a client from a validated configuration.
    ///
    /// Does NOT check connectivity — that happens on the first request.
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        config.validate()?;

        let http = HttpClient::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| CompletionError::ConnectionFailed {
                endpoint: config.base_url.clone(),
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self { http, config })
    }

    /// The configured primary model name.
    pub fn primary_model(&self) -> &str {
        &self.config.model_primary
    }

    /// One request against one model.
    async fn try_model(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, CompletionError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let body = ChatCompletionRequest::single_turn(model, prompt, temperature, max_tokens);

        tracing::debug!(
            url = %url,
            model = %model,
            prompt_len = prompt.len(),
            max_tokens,
            "sending completion request"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout {
                        duration_secs: REQUEST_TIMEOUT.as_secs(),
                    }
                } else {
                    CompletionError::ConnectionFailed {
                        endpoint: url.clone(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(CompletionError::Http {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let parsed: ChatCompletionResponse =
            response
                .json()
                .await
                .map_err(|e| CompletionError::EmptyCompletion {
                    reason: format!("failed to decode response body: {e}"),
                })?;

        match parsed.first_content() {
            Some(content) if !content.is_empty() => Ok(content.to_string()),
            _ => Err(CompletionError::EmptyCompletion {
                reason: "response carried no message content".into(),
            }),
        }
    }
}

#[async_trait]
impl CompletionGateway for CompletionClient {
    async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, CompletionError> {
        match self
            .try_model(&self.config.model_primary, prompt, temperature, max_tokens)
            .await
        {
            Ok(text) => Ok(text),
            Err(e) if e.is_retriable() && self.config.model_backup != self.config.model_primary => {
                tracing::warn!(
                    primary = %self.config.model_primary,
                    backup = %self.config.model_backup,
                    error = %e,
                    "primary model failed, trying backup"
                );
                self.try_model(&self.config.model_backup, prompt, temperature, max_tokens)
                    .await
            }
            Err(e) => Err(e),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
