//! OpenAI-compatible completion client.
//!
//! Non-streaming `POST /v1/chat/completions` with Bearer auth. The prompt
//! travels as a single user message; the first choice's content comes back
//! trimmed.

pub mod types;

pub use types::OpenAiConfig;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use tracing::{debug, error, instrument};

use crate::generator::{CompletionRequest, Generator, GeneratorError, GeneratorResult};
use async_trait::async_trait;
use types::{
    ApiErrorBody, ChatCompletionRequest, ChatCompletionResponse, ChatMessageParam,
    DEFAULT_MAX_OUTPUT_TOKENS,
};

/// OpenAI-compatible chat-completions generator.
pub struct OpenAiGenerator {
    config: OpenAiConfig,
    client: reqwest::Client,
}

impl OpenAiGenerator {
    /// Create a new generator with its own HTTP client.
    #[must_use]
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Create a new generator with a shared HTTP client.
    #[must_use]
    pub fn with_client(config: OpenAiConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    /// Build HTTP headers. Bearer auth when a key is configured.
    fn build_headers(&self) -> GeneratorResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(api_key) = &self.config.api_key {
            let auth_value = format!("Bearer {api_key}");
            let _ = headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&auth_value).map_err(|e| GeneratorError::Auth {
                    message: format!("invalid API key header: {e}"),
                })?,
            );
        }
        Ok(headers)
    }

    /// Resolve sampling fields: request override → config → compiled default.
    fn build_request(&self, request: &CompletionRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: request
                .model
                .clone()
                .unwrap_or_else(|| self.config.model.clone()),
            messages: vec![ChatMessageParam {
                role: "user",
                content: request.prompt.clone(),
            }],
            temperature: request.temperature.unwrap_or(self.config.temperature),
            max_tokens: request.max_tokens.unwrap_or_else(|| {
                self.config.max_tokens.unwrap_or(DEFAULT_MAX_OUTPUT_TOKENS)
            }),
        }
    }

    /// Extract a message from an error body, falling back to the raw text.
    fn parse_error_message(body_text: &str) -> String {
        serde_json::from_str::<ApiErrorBody>(body_text)
            .ok()
            .and_then(|b| b.error)
            .map(|e| e.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| body_text.to_string())
    }

    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn complete_internal(&self, request: CompletionRequest) -> GeneratorResult<String> {
        let body = self.build_request(&request);
        let url = format!("{}/v1/chat/completions", self.config.base_url);
        let headers = self.build_headers()?;

        debug!(
            model = %body.model,
            temperature = body.temperature,
            max_tokens = body.max_tokens,
            prompt_len = request.prompt.len(),
            "sending completion request"
        );

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(GeneratorError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            let message = Self::parse_error_message(&body_text);
            error!(status = status.as_u16(), %message, "completion API error");
            return Err(GeneratorError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(GeneratorError::Http)?;
        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .ok_or(GeneratorError::EmptyCompletion)?;

        debug!(completion_len = text.len(), "completion received");
        Ok(text)
    }
}

#[async_trait]
impl Generator for OpenAiGenerator {
    async fn complete(&self, request: CompletionRequest) -> GeneratorResult<String> {
        self.complete_internal(request).await
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
