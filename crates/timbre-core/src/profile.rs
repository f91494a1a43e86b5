//! Style profile model.
//!
//! A profile is a named set of five trait intensities on the [-2, +2]
//! scale. Profiles are immutable after load; the `neutral` sentinel means
//! "no rewriting".

use serde::{Deserialize, Serialize};

/// Profile id that skips transformation entirely.
pub const NEUTRAL_PROFILE_ID: &str = "neutral";

/// Lowest valid trait intensity.
pub const MIN_INTENSITY: i8 = -2;
/// Highest valid trait intensity.
pub const MAX_INTENSITY: i8 = 2;

/// A named personality style used to steer tone rewriting.
///
/// Intensity semantics: -2 means the opposite of the trait is strongly
/// present, 0 is neutral, +2 means the trait is strongly present.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleProfile {
    /// Stable identifier used in requests (`personalityId`).
    pub id: String,
    /// Human-readable display name.
    pub name: String,
    /// One-line description shown in profile pickers.
    pub description: String,
    /// Energy, warmth, and engagement.
    pub vibrancy: i8,
    /// Precision, structure, and rigor.
    pub conscientiousness: i8,
    /// Politeness and respectfulness.
    pub civility: i8,
    /// Mechanical, robotic register.
    pub artificiality: i8,
    /// Negativity and anxiousness.
    pub neuroticism: i8,
}

impl StyleProfile {
    /// Whether this is the sentinel profile that disables rewriting.
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        self.id == NEUTRAL_PROFILE_ID
    }

    /// The five intensities paired with their trait names, in canonical
    /// order (vibrancy, conscientiousness, civility, artificiality,
    /// neuroticism).
    #[must_use]
    pub fn intensities(&self) -> [(&'static str, i8); 5] {
        [
            ("vibrancy", self.vibrancy),
            ("conscientiousness", self.conscientiousness),
            ("civility", self.civility),
            ("artificiality", self.artificiality),
            ("neuroticism", self.neuroticism),
        ]
    }

    /// Returns the name of the first trait whose intensity falls outside
    /// [-2, +2], if any.
    #[must_use]
    pub fn out_of_range_trait(&self) -> Option<&'static str> {
        self.intensities()
            .into_iter()
            .find(|(_, v)| *v < MIN_INTENSITY || *v > MAX_INTENSITY)
            .map(|(name, _)| name)
    }
}

/// Listing entry for `GET /profiles` — id, name, description only.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProfileSummary {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// One-line description.
    pub description: String,
}

impl From<&StyleProfile> for ProfileSummary {
    fn from(p: &StyleProfile) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            description: p.description.clone(),
        }
    }
}
