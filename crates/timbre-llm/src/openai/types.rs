//! OpenAI chat-completions wire types (request and response subset).

use serde::{Deserialize, Serialize};

/// Default base URL for the hosted API.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Default output token cap when neither request nor config sets one.
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1000;

/// Client configuration.
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// Base URL; `/v1/chat/completions` is appended.
    pub base_url: String,
    /// Bearer API key. `None` sends no Authorization header (local
    /// OpenAI-compatible servers accept that).
    pub api_key: Option<String>,
    /// Default model.
    pub model: String,
    /// Default sampling temperature.
    pub temperature: f64,
    /// Default output token cap.
    pub max_tokens: Option<u32>,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            max_tokens: None,
        }
    }
}

/// Request body for `POST /v1/chat/completions`.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    /// Model name.
    pub model: String,
    /// Chat messages (always a single user message here).
    pub messages: Vec<ChatMessageParam>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Output token cap.
    pub max_tokens: u32,
}

/// One chat message in a request.
#[derive(Debug, Serialize)]
pub struct ChatMessageParam {
    /// Message role (`user`).
    pub role: &'static str,
    /// Message content.
    pub content: String,
}

/// Response body subset: only the fields this client reads.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    /// Completion choices; the first one carries the text.
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// One completion choice.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    /// The generated message.
    pub message: ChatChoiceMessage,
}

/// The generated message inside a choice.
#[derive(Debug, Deserialize)]
pub struct ChatChoiceMessage {
    /// Generated text; may be absent on refusals.
    #[serde(default)]
    pub content: Option<String>,
}

/// Error body shape returned by OpenAI-compatible servers.
#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    /// Error details.
    pub error: Option<ApiErrorDetail>,
}

/// Error detail inside an error body.
#[derive(Debug, Deserialize)]
pub struct ApiErrorDetail {
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_parses_minimal_body() {
        let body = r#"{"choices":[{"message":{"content":"hi"}}]}"#;
        let resp: ChatCompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(resp.choices[0].message.content.as_deref(), Some("hi"));
    }

    #[test]
    fn response_tolerates_missing_choices() {
        let resp: ChatCompletionResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.choices.is_empty());
    }

    #[test]
    fn error_body_parses() {
        let body = r#"{"error":{"message":"rate limited","type":"rate_limit"}}"#;
        let parsed: ApiErrorBody = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.error.unwrap().message, "rate limited");
    }
}
