//! `POST /chat` — the orchestrated exchange.
//!
//! The response is an SSE stream whose single event is the final
//! envelope. The stream's drop guard is the external cancellation
//! trigger: a client that goes away before delivery aborts the session.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::sse::KeepAlive;
use axum::response::{IntoResponse, Sse};
use axum::Json;
use serde::Deserialize;
use timbre_core::ids::{ConversationId, MessageId, RequestKey};
use timbre_runtime::{DeliverySink, ExchangeRequest};
use tracing::info;

use crate::sse::{ChannelSink, ChatStream, DisconnectGuard};
use crate::state::AppState;

/// Request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The user's message.
    pub text: String,
    /// Existing conversation, or absent to open a new one.
    pub conversation_id: Option<String>,
    /// Parent of the user message.
    pub parent_message_id: Option<String>,
    /// Style profile to apply to the reply.
    pub personality_id: Option<String>,
    /// Display name of the user.
    pub sender: Option<String>,
    /// Skip persisting the user message (regeneration).
    #[serde(default)]
    pub skip_user_message_save: bool,
}

/// Header carrying the caller's profile when the body omits one.
pub const PROFILE_HEADER: &str = "x-personality";

/// Run one exchange, streaming the final envelope as a single SSE event.
pub async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> impl IntoResponse {
    let key = RequestKey::generate();
    info!(key = %key, new_conversation = body.conversation_id.is_none(), "chat request");

    let profile_id = body.personality_id.or_else(|| {
        headers
            .get(PROFILE_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    });

    let request = ExchangeRequest {
        text: body.text,
        conversation_id: body.conversation_id.map(|id| ConversationId::new(&id)),
        parent_message_id: body.parent_message_id.map(|id| MessageId::new(&id)),
        profile_id,
        sender: body.sender,
        skip_user_message_save: body.skip_user_message_save,
    };

    let (sink, rx) = ChannelSink::pair();
    let guard = DisconnectGuard::new(Arc::clone(state.orchestrator.cancels()), key.clone());

    let orchestrator = Arc::clone(&state.orchestrator);
    drop(tokio::spawn(async move {
        let outcome = orchestrator
            .run(key, request, Arc::new(sink) as Arc<dyn DeliverySink>)
            .await;
        info!(outcome = outcome.label(), "chat session finished");
    }));

    Sse::new(ChatStream::new(rx, guard)).keep_alive(KeepAlive::default())
}
