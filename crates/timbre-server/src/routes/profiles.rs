//! `GET /profiles` — list available style profiles.

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use timbre_core::profile::ProfileSummary;

use crate::state::AppState;

/// Wire shape of the profile listing.
#[derive(Debug, Serialize)]
pub struct ProfilesResponse {
    /// Summaries in profile-store load order.
    pub personalities: Vec<ProfileSummary>,
}

/// List all profiles, neutral first, in load order.
pub async fn list(State(state): State<AppState>) -> Json<ProfilesResponse> {
    Json(ProfilesResponse {
        personalities: state.profiles.list(),
    })
}
