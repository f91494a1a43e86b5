//! Concrete error reporter and title generator.

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use timbre_core::ids::ConversationId;
use timbre_llm::{CompletionRequest, Generator};
use timbre_runtime::{ErrorReport, ErrorReporter, TitleGenerator};
use tracing::{debug, error};

/// Reporter that writes failed-session reports to the log stream.
#[derive(Default)]
pub struct TracingErrorReporter;

#[async_trait]
impl ErrorReporter for TracingErrorReporter {
    async fn report(&self, report: ErrorReport) {
        counter!("session_errors_total").increment(1);
        error!(
            conversation_id = report.conversation_id.as_ref().map(ToString::to_string),
            response_message_id = report.response_message_id.as_ref().map(ToString::to_string),
            sender = report.sender.as_deref(),
            error = %report.error,
            "session failed"
        );
    }
}

const TITLE_PROMPT: &str = "Write a concise title (5 words or fewer, no quotes, no punctuation \
at the end) summarizing this conversation:\n\nUser: {user}\nAssistant: {assistant}\n\nTitle:";

/// Title generation backed by the shared generator.
pub struct LlmTitleGenerator {
    generator: Arc<dyn Generator>,
    model: Option<String>,
}

impl LlmTitleGenerator {
    /// Create a title generator; `model` overrides the generator default.
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>, model: Option<String>) -> Self {
        Self { generator, model }
    }
}

#[async_trait]
impl TitleGenerator for LlmTitleGenerator {
    async fn generate_title(
        &self,
        conversation_id: &ConversationId,
        user_text: &str,
        response_text: &str,
    ) -> anyhow::Result<String> {
        let prompt = TITLE_PROMPT
            .replace("{user}", user_text)
            .replace("{assistant}", response_text);
        let request = CompletionRequest {
            model: self.model.clone(),
            ..CompletionRequest::from_prompt(prompt)
        };
        let raw = self.generator.complete(request).await?;
        let title = raw.trim().trim_matches('"').trim().to_string();
        if title.is_empty() {
            anyhow::bail!("title generator returned empty text");
        }
        debug!(conversation_id = %conversation_id, title = %title, "title generated");
        Ok(title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timbre_llm::GeneratorResult;

    struct FixedGen(&'static str);

    #[async_trait]
    impl Generator for FixedGen {
        async fn complete(&self, _request: CompletionRequest) -> GeneratorResult<String> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn title_is_trimmed_and_unquoted() {
        let titles = LlmTitleGenerator::new(Arc::new(FixedGen("  \"Recursion Basics\"  ")), None);
        let title = titles
            .generate_title(&ConversationId::new("c1"), "what is recursion?", "it is...")
            .await
            .unwrap();
        assert_eq!(title, "Recursion Basics");
    }

    #[tokio::test]
    async fn empty_title_is_an_error() {
        let titles = LlmTitleGenerator::new(Arc::new(FixedGen("   ")), None);
        let result = titles
            .generate_title(&ConversationId::new("c1"), "hi", "hello")
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn reporter_accepts_sparse_reports() {
        let reporter = TracingErrorReporter;
        reporter
            .report(ErrorReport {
                conversation_id: None,
                sender: None,
                response_message_id: None,
                parent_message_id: None,
                error: "backend unreachable".into(),
            })
            .await;
    }
}
