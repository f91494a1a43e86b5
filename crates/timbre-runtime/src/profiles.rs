//! Style profile store.
//!
//! Holds the named style configurations, ordered by load position and
//! read-only after construction. Lookup by an unknown id is an error —
//! callers decide whether that degrades (transform stage) or surfaces
//! (nothing does today).

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;
use timbre_core::profile::{ProfileSummary, StyleProfile, NEUTRAL_PROFILE_ID};
use tracing::info;

/// Errors from loading or querying the profile store.
#[derive(Debug, Error)]
pub enum ProfileError {
    /// No profile with the requested id.
    #[error("personality profile '{0}' not found")]
    NotFound(String),

    /// The profile file could not be read.
    #[error("failed to read profile file {path}: {source}")]
    Io {
        /// Path that failed.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The profile file is not a valid JSON array of profiles.
    #[error("failed to parse profile file: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two profiles share an id.
    #[error("duplicate profile id '{0}'")]
    Duplicate(String),

    /// A trait intensity falls outside [-2, +2].
    ///
    /// Rejected at load so the prompt composer can copy intensities
    /// verbatim without clamping.
    #[error("profile '{id}' has out-of-range intensity for trait '{trait_name}'")]
    OutOfRange {
        /// Offending profile id.
        id: String,
        /// Offending trait.
        trait_name: &'static str,
    },
}

/// Ordered, read-only store of style profiles.
#[derive(Debug)]
pub struct ProfileStore {
    profiles: Vec<StyleProfile>,
}

impl ProfileStore {
    /// Build a store from an ordered profile list, validating ids and
    /// intensity ranges.
    pub fn from_profiles(profiles: Vec<StyleProfile>) -> Result<Self, ProfileError> {
        let mut seen = HashSet::new();
        for profile in &profiles {
            if !seen.insert(profile.id.clone()) {
                return Err(ProfileError::Duplicate(profile.id.clone()));
            }
            if let Some(trait_name) = profile.out_of_range_trait() {
                return Err(ProfileError::OutOfRange {
                    id: profile.id.clone(),
                    trait_name,
                });
            }
        }
        Ok(Self { profiles })
    }

    /// Load a store from a JSON array file.
    pub fn load_from_path(path: &Path) -> Result<Self, ProfileError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let profiles: Vec<StyleProfile> = serde_json::from_str(&raw)?;
        let store = Self::from_profiles(profiles)?;
        info!(count = store.len(), path = %path.display(), "loaded style profiles");
        Ok(store)
    }

    /// The built-in profile set, starting with the neutral sentinel.
    #[must_use]
    pub fn builtin() -> Self {
        let profiles = vec![
            StyleProfile {
                id: NEUTRAL_PROFILE_ID.into(),
                name: "Neutral".into(),
                description: "No tone rewriting; replies pass through unchanged.".into(),
                vibrancy: 0,
                conscientiousness: 0,
                civility: 0,
                artificiality: 0,
                neuroticism: 0,
            },
            StyleProfile {
                id: "direct_coach".into(),
                name: "Direct Coach".into(),
                description: "Blunt, structured, no-nonsense feedback.".into(),
                vibrancy: 0,
                conscientiousness: 2,
                civility: -1,
                artificiality: 0,
                neuroticism: -2,
            },
            StyleProfile {
                id: "warm_mentor".into(),
                name: "Warm Mentor".into(),
                description: "Encouraging, patient, human-sounding guidance.".into(),
                vibrancy: 2,
                conscientiousness: 1,
                civility: 2,
                artificiality: -2,
                neuroticism: -1,
            },
            StyleProfile {
                id: "calm_analyst".into(),
                name: "Calm Analyst".into(),
                description: "Measured, precise, emotionally flat analysis.".into(),
                vibrancy: -1,
                conscientiousness: 2,
                civility: 1,
                artificiality: 0,
                neuroticism: -2,
            },
            StyleProfile {
                id: "deadpan_machine".into(),
                name: "Deadpan Machine".into(),
                description: "Flat, mechanical delivery, leaning into the robot voice.".into(),
                vibrancy: -2,
                conscientiousness: 1,
                civility: 0,
                artificiality: 2,
                neuroticism: 0,
            },
        ];
        // The built-in set is known-valid.
        Self { profiles }
    }

    /// Look up a profile by id.
    pub fn get(&self, id: &str) -> Result<&StyleProfile, ProfileError> {
        self.profiles
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))
    }

    /// All profiles as listing entries, in load order.
    #[must_use]
    pub fn list(&self) -> Vec<ProfileSummary> {
        self.profiles.iter().map(ProfileSummary::from).collect()
    }

    /// Number of profiles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
