//! `POST /intercept` — in-band response transformation.
//!
//! Sits between a response producer and its consumer, so it never fails
//! the exchange: every path answers 200, falling back to the original
//! text when transformation does not apply.

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use timbre_core::message::HistoryTurn;
use timbre_core::profile::NEUTRAL_PROFILE_ID;

use crate::routes::transform::fetch_history;
use crate::state::AppState;

/// Stored turns fetched ahead of the inline user message (4 + 1 = 5 lines
/// of context).
const INTERCEPT_HISTORY_LIMIT: usize = 4;

/// Request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterceptRequest {
    /// The response text to (maybe) rewrite.
    pub response: Option<String>,
    /// Profile id; absent means neutral.
    pub personality_id: Option<String>,
    /// Optional conversation for history context.
    pub conversation_id: Option<String>,
    /// The user message this response answers, appended to the history.
    pub user_message: Option<String>,
}

/// Response body. `original` and `personality_id` appear only when a
/// rewrite was applied.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterceptResponse {
    /// The text to hand to the consumer.
    pub response: String,
    /// Whether a rewrite was applied.
    pub transformed: bool,
    /// The untouched input, when transformed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
    /// The applied profile, when transformed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub personality_id: Option<String>,
    /// Why the rewrite fell back, when it fell back on a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Transform `response` unless the profile is neutral or absent.
pub async fn intercept(
    State(state): State<AppState>,
    Json(body): Json<InterceptRequest>,
) -> Json<InterceptResponse> {
    let original = body.response.unwrap_or_default();
    let personality_id = body
        .personality_id
        .unwrap_or_else(|| NEUTRAL_PROFILE_ID.to_string());

    if personality_id == NEUTRAL_PROFILE_ID {
        return Json(InterceptResponse {
            response: original,
            transformed: false,
            original: None,
            personality_id: None,
            error: None,
        });
    }

    let mut history = match &body.conversation_id {
        Some(id) => fetch_history(&state, id, INTERCEPT_HISTORY_LIMIT).await,
        None => Vec::new(),
    };
    if let Some(user_message) = &body.user_message {
        history.push(HistoryTurn::user(user_message));
    }

    let outcome = state
        .transformer
        .transform(&original, &personality_id, &history)
        .await;

    if outcome.applied {
        Json(InterceptResponse {
            response: outcome.text,
            transformed: true,
            original: Some(original),
            personality_id: Some(personality_id),
            error: None,
        })
    } else {
        Json(InterceptResponse {
            response: original,
            transformed: false,
            original: None,
            personality_id: None,
            error: outcome.error,
        })
    }
}
