//! `POST /transform` — standalone style transformation.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use timbre_core::ids::ConversationId;
use timbre_core::message::HistoryTurn;
use tracing::warn;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformRequest {
    /// Text to rewrite.
    pub original_response: Option<String>,
    /// Profile to rewrite with.
    pub personality_id: Option<String>,
    /// Optional conversation for history context.
    pub conversation_id: Option<String>,
}

/// Response body.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformResponse {
    /// The input text, echoed.
    pub original_response: String,
    /// The rewritten text (equal to the input when the stage fell back).
    pub transformed_response: String,
    /// The profile that was applied.
    pub personality_id: String,
    /// Always `true` on a 200.
    pub success: bool,
}

/// Rewrite `originalResponse` in the named profile's style, with up to the
/// configured number of stored history turns as context.
pub async fn transform(
    State(state): State<AppState>,
    Json(body): Json<TransformRequest>,
) -> Result<Json<TransformResponse>, ApiError> {
    let (Some(original), Some(personality_id)) = (body.original_response, body.personality_id)
    else {
        return Err(ApiError::Validation(
            "Missing required fields: originalResponse and personalityId".into(),
        ));
    };

    let history = match &body.conversation_id {
        Some(id) => fetch_history(&state, id, state.settings.transform.history_limit).await,
        None => Vec::new(),
    };

    let outcome = state
        .transformer
        .transform(&original, &personality_id, &history)
        .await;

    Ok(Json(TransformResponse {
        original_response: original,
        transformed_response: outcome.text,
        personality_id,
        success: true,
    }))
}

/// Last `limit` turns in chronological order; empty (and logged) when the
/// store read fails.
pub(crate) async fn fetch_history(
    state: &AppState,
    conversation_id: &str,
    limit: usize,
) -> Vec<HistoryTurn> {
    match state
        .store
        .recent(&ConversationId::new(conversation_id), limit)
        .await
    {
        Ok(messages) => messages.iter().map(HistoryTurn::from).collect(),
        Err(e) => {
            warn!(conversation_id, error = %e, "could not fetch conversation history");
            Vec::new()
        }
    }
}
