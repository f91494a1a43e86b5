//! Generator trait and error taxonomy.

use async_trait::async_trait;
use thiserror::Error;

/// Result alias for generator calls.
pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Errors from an external generative text call.
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Transport-level failure (connect, DNS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the response body.
        message: String,
    },

    /// Credentials were missing or malformed.
    #[error("auth error: {message}")]
    Auth {
        /// What went wrong.
        message: String,
    },

    /// The response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),

    /// The backend returned a success status but no usable text.
    #[error("backend returned no completion text")]
    EmptyCompletion,
}

/// One completion request. Unset sampling fields fall back to the client's
/// configured defaults.
#[derive(Clone, Debug, Default)]
pub struct CompletionRequest {
    /// The full prompt, sent as a single user message.
    pub prompt: String,
    /// Model override for this call.
    pub model: Option<String>,
    /// Sampling temperature override.
    pub temperature: Option<f64>,
    /// Output token cap override.
    pub max_tokens: Option<u32>,
}

impl CompletionRequest {
    /// A request with only a prompt; sampling comes from client defaults.
    #[must_use]
    pub fn from_prompt(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }
}

/// A non-streaming text-generation backend.
///
/// Implementations must be cheap to share (`Arc<dyn Generator>`) and safe to
/// call from many sessions concurrently.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Run one completion and return the generated text.
    async fn complete(&self, request: CompletionRequest) -> GeneratorResult<String>;
}
