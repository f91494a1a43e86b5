//! SSE delivery plumbing for `/chat`.
//!
//! The orchestrator talks to a [`ChannelSink`]; the HTTP response is a
//! [`ChatStream`] reading the other end. Dropping the stream before the
//! final event — the client went away — fires the [`DisconnectGuard`],
//! which signals the cancellation registry for this request. Once the
//! final envelope has been emitted the guard is disarmed, so a normal
//! connection close after delivery never aborts anything.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use axum::response::sse::Event;
use futures::Stream;
use timbre_core::envelope::ResponseEnvelope;
use timbre_core::ids::RequestKey;
use timbre_runtime::{CancelRegistry, DeliverySink, RuntimeError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

/// Delivery sink writing the final envelope into an in-process channel.
pub struct ChannelSink {
    tx: mpsc::Sender<ResponseEnvelope>,
}

impl ChannelSink {
    /// Create a sink/receiver pair for one exchange.
    #[must_use]
    pub fn pair() -> (Self, mpsc::Receiver<ResponseEnvelope>) {
        // One exchange emits exactly one envelope.
        let (tx, rx) = mpsc::channel(1);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl DeliverySink for ChannelSink {
    async fn deliver(&self, envelope: &ResponseEnvelope) -> Result<(), RuntimeError> {
        self.tx
            .send(envelope.clone())
            .await
            .map_err(|_| RuntimeError::Delivery("response channel closed".into()))
    }
}

/// Signals cancellation for a request key when dropped while still armed.
pub struct DisconnectGuard {
    cancels: Arc<CancelRegistry>,
    key: RequestKey,
    armed: bool,
}

impl DisconnectGuard {
    /// Arm a guard for `key`.
    #[must_use]
    pub fn new(cancels: Arc<CancelRegistry>, key: RequestKey) -> Self {
        Self {
            cancels,
            key,
            armed: true,
        }
    }

    /// Disarm: delivery finished, a later drop is a normal close.
    pub fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        if self.armed {
            debug!(key = %self.key, "client disconnected before delivery");
            let _ = self.cancels.signal(&self.key);
        }
    }
}

/// The `/chat` response body: at most one SSE event, then end of stream.
pub struct ChatStream {
    rx: ReceiverStream<ResponseEnvelope>,
    guard: DisconnectGuard,
}

impl ChatStream {
    /// Wrap a receiver and its disconnect guard.
    #[must_use]
    pub fn new(rx: mpsc::Receiver<ResponseEnvelope>, guard: DisconnectGuard) -> Self {
        Self {
            rx: ReceiverStream::new(rx),
            guard,
        }
    }
}

impl Stream for ChatStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match Pin::new(&mut this.rx).poll_next(cx) {
            Poll::Ready(Some(envelope)) => {
                this.guard.disarm();
                let event = Event::default()
                    .json_data(&envelope)
                    .unwrap_or_else(|e| Event::default().data(format!("{{\"error\":\"{e}\"}}")));
                Poll::Ready(Some(Ok(event)))
            }
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use timbre_core::envelope::ConversationMeta;
    use timbre_core::ids::ConversationId;
    use timbre_core::message::{ChatMessage, ResponseMessage};
    use timbre_core::ids::MessageId;

    fn envelope() -> ResponseEnvelope {
        let convo = ConversationId::new("c1");
        let request = ChatMessage::new(convo.clone(), "Student", "hi", true);
        let response = ResponseMessage {
            message_id: MessageId::new("m2"),
            conversation_id: convo.clone(),
            parent_message_id: Some(request.message_id.clone()),
            sender: "Assistant".into(),
            text: Some("hello".into()),
            content: None,
        };
        ResponseEnvelope::new(
            ConversationMeta {
                conversation_id: convo,
                title: None,
            },
            request,
            response,
            false,
        )
    }

    fn registered(cancels: &Arc<CancelRegistry>, key: &RequestKey) {
        let (_handle, _on_start) =
            cancels.register(key, Box::new(timbre_runtime::AbortSnapshot::default));
    }

    #[tokio::test]
    async fn sink_feeds_stream_and_disarms_guard() {
        let cancels = Arc::new(CancelRegistry::new());
        let key = RequestKey::new("k1");
        registered(&cancels, &key);

        let (sink, rx) = ChannelSink::pair();
        let guard = DisconnectGuard::new(Arc::clone(&cancels), key.clone());
        let mut stream = ChatStream::new(rx, guard);

        sink.deliver(&envelope()).await.unwrap();
        drop(sink);

        assert!(stream.next().await.is_some());
        assert!(stream.next().await.is_none());
        drop(stream);
        // Guard was disarmed by the event: no signal fired.
        assert!(cancels.signal(&key).is_some());
    }

    #[tokio::test]
    async fn dropping_stream_before_delivery_signals() {
        let cancels = Arc::new(CancelRegistry::new());
        let key = RequestKey::new("k1");
        registered(&cancels, &key);

        let (_sink, rx) = ChannelSink::pair();
        let guard = DisconnectGuard::new(Arc::clone(&cancels), key.clone());
        let stream = ChatStream::new(rx, guard);
        drop(stream);

        // Already signaled by the guard; a second signal is a no-op.
        assert!(cancels.signal(&key).is_none());
    }

    #[tokio::test]
    async fn deliver_into_closed_channel_errors() {
        let (sink, rx) = ChannelSink::pair();
        drop(rx);
        let err = sink.deliver(&envelope()).await.unwrap_err();
        assert!(matches!(err, RuntimeError::Delivery(_)));
    }
}
