//! Generation backend over the LLM client.
//!
//! Wraps a [`Generator`] as the [`GenerationBackend`]/[`GenerationClient`]
//! pair the orchestrator drives. Clients here are stateless handles onto
//! the shared generator; `dispose` only latches a flag so double release
//! stays observable in logs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use timbre_core::ids::MessageId;
use timbre_core::message::ResponseMessage;
use timbre_llm::{CompletionRequest, Generator};
use timbre_runtime::{
    GenerationBackend, GenerationClient, GenerationReply, GenerationRequest, RuntimeError,
    SessionUpdate,
};
use tracing::{debug, instrument};

/// Backend handing out [`GeneratorClient`] handles.
pub struct GeneratorBackend {
    generator: Arc<dyn Generator>,
    assistant_label: String,
}

impl GeneratorBackend {
    /// Create a backend over a generator; replies carry `assistant_label`
    /// as their sender.
    #[must_use]
    pub fn new(generator: Arc<dyn Generator>, assistant_label: impl Into<String>) -> Self {
        Self {
            generator,
            assistant_label: assistant_label.into(),
        }
    }
}

#[async_trait]
impl GenerationBackend for GeneratorBackend {
    async fn acquire(&self) -> Result<Arc<dyn GenerationClient>, RuntimeError> {
        Ok(Arc::new(GeneratorClient {
            generator: Arc::clone(&self.generator),
            assistant_label: self.assistant_label.clone(),
            disposed: AtomicBool::new(false),
        }))
    }
}

/// One per-session handle onto the shared generator.
pub struct GeneratorClient {
    generator: Arc<dyn Generator>,
    assistant_label: String,
    disposed: AtomicBool,
}

#[async_trait]
impl GenerationClient for GeneratorClient {
    #[instrument(skip_all, fields(conversation_id = %request.conversation_id))]
    async fn send_message(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationReply, RuntimeError> {
        let completion = CompletionRequest::from_prompt(request.text);
        let text = self.generator.complete(completion).await?;

        let response = ResponseMessage {
            message_id: MessageId::generate(),
            conversation_id: request.conversation_id.clone(),
            parent_message_id: request.parent_message_id,
            sender: self.assistant_label.clone(),
            text: Some(text),
            content: None,
        };
        Ok(GenerationReply {
            updates: vec![
                SessionUpdate::Sender(self.assistant_label.clone()),
                SessionUpdate::ConversationId(request.conversation_id),
            ],
            response,
        })
    }

    fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            debug!("generation client disposed twice");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timbre_core::ids::ConversationId;
    use timbre_llm::{GeneratorError, GeneratorResult};

    struct EchoGen;

    #[async_trait]
    impl Generator for EchoGen {
        async fn complete(&self, request: CompletionRequest) -> GeneratorResult<String> {
            Ok(format!("echo: {}", request.prompt))
        }
    }

    struct FailGen;

    #[async_trait]
    impl Generator for FailGen {
        async fn complete(&self, _request: CompletionRequest) -> GeneratorResult<String> {
            Err(GeneratorError::EmptyCompletion)
        }
    }

    fn request() -> GenerationRequest {
        GenerationRequest {
            conversation_id: ConversationId::new("c1"),
            parent_message_id: Some(MessageId::new("m1")),
            text: "hello".into(),
        }
    }

    #[tokio::test]
    async fn reply_carries_text_and_linkage() {
        let backend = GeneratorBackend::new(Arc::new(EchoGen), "AI Assistant");
        let client = backend.acquire().await.unwrap();
        let reply = client.send_message(request()).await.unwrap();

        assert_eq!(reply.response.text.as_deref(), Some("echo: hello"));
        assert_eq!(reply.response.sender, "AI Assistant");
        assert_eq!(reply.response.parent_message_id, Some(MessageId::new("m1")));
        assert_eq!(reply.updates.len(), 2);
    }

    #[tokio::test]
    async fn generator_error_propagates() {
        let backend = GeneratorBackend::new(Arc::new(FailGen), "AI Assistant");
        let client = backend.acquire().await.unwrap();
        let err = client.send_message(request()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Generation(_)));
    }

    #[tokio::test]
    async fn dispose_is_idempotent() {
        let backend = GeneratorBackend::new(Arc::new(EchoGen), "AI Assistant");
        let client = backend.acquire().await.unwrap();
        client.dispose();
        client.dispose();
    }
}
