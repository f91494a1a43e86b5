//! Style transformation stage.
//!
//! Best-effort tone rewriting: resolve the profile, compose the rewrite
//! instruction, run one external completion, trim the result. Every
//! failure path returns the original text — callers only learn whether a
//! rewrite happened through [`TransformOutcome::applied`].

use std::sync::Arc;

use metrics::counter;
use timbre_core::message::HistoryTurn;
use timbre_core::profile::NEUTRAL_PROFILE_ID;
use tracing::{debug, instrument, warn};

use crate::profiles::{ProfileError, ProfileStore};
use crate::prompt::{ComposerOptions, compose};
use timbre_llm::{CompletionRequest, Generator, GeneratorError};

/// Sampling configuration for the rewriting call.
#[derive(Clone, Debug)]
pub struct TransformOptions {
    /// Model override for rewriting; `None` uses the generator's default.
    pub model: Option<String>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Output token cap.
    pub max_tokens: u32,
    /// Prompt composer labels.
    pub composer: ComposerOptions,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            model: None,
            temperature: 0.7,
            max_tokens: 1000,
            composer: ComposerOptions::default(),
        }
    }
}

/// Result of one transformation attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransformOutcome {
    /// The delivered text: rewritten on success, original otherwise.
    pub text: String,
    /// Whether the rewrite actually changed the text.
    pub applied: bool,
    /// Failure description, set only when a fallback was failure-driven
    /// (unknown profile, backend error). Skips and unchanged rewrites
    /// leave this empty.
    pub error: Option<String>,
}

impl TransformOutcome {
    fn passthrough(text: &str) -> Self {
        Self {
            text: text.to_string(),
            applied: false,
            error: None,
        }
    }

    fn fallback(text: &str, error: String) -> Self {
        Self {
            text: text.to_string(),
            applied: false,
            error: Some(error),
        }
    }
}

/// Internal failure taxonomy; never escapes [`StyleTransformer::transform`].
#[derive(Debug, thiserror::Error)]
enum TransformError {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
}

/// The style transformation stage.
pub struct StyleTransformer {
    profiles: Arc<ProfileStore>,
    generator: Arc<dyn Generator>,
    options: TransformOptions,
}

impl StyleTransformer {
    /// Create a transformer over a profile store and a generator.
    #[must_use]
    pub fn new(
        profiles: Arc<ProfileStore>,
        generator: Arc<dyn Generator>,
        options: TransformOptions,
    ) -> Self {
        Self {
            profiles,
            generator,
            options,
        }
    }

    /// The profile store this stage resolves against.
    #[must_use]
    pub fn profiles(&self) -> &Arc<ProfileStore> {
        &self.profiles
    }

    /// Rewrite `text` in the style named by `profile_id`.
    ///
    /// Skips entirely (original text, zero external calls) for the neutral
    /// sentinel or empty text. Never fails: unknown profiles, backend
    /// errors, and malformed results all fall back to the original.
    #[instrument(skip_all, fields(profile_id = %profile_id, text_len = text.len()))]
    pub async fn transform(
        &self,
        text: &str,
        profile_id: &str,
        history: &[HistoryTurn],
    ) -> TransformOutcome {
        if profile_id.is_empty() || profile_id == NEUTRAL_PROFILE_ID || text.is_empty() {
            counter!("transform_skipped_total").increment(1);
            return TransformOutcome::passthrough(text);
        }

        match self.attempt(text, profile_id, history).await {
            Ok(rewritten) => {
                // Mirror the delivery contract: "applied" means the text
                // actually changed.
                if rewritten.is_empty() || rewritten == text {
                    debug!(profile_id, "rewrite returned unchanged text");
                    counter!("transform_unchanged_total").increment(1);
                    return TransformOutcome::passthrough(text);
                }
                debug!(
                    profile_id,
                    original_len = text.len(),
                    rewritten_len = rewritten.len(),
                    "rewrite applied"
                );
                counter!("transform_applied_total").increment(1);
                TransformOutcome {
                    text: rewritten,
                    applied: true,
                    error: None,
                }
            }
            Err(e) => {
                warn!(profile_id, error = %e, "transformation failed, falling back to original");
                counter!("transform_fallbacks_total").increment(1);
                TransformOutcome::fallback(text, e.to_string())
            }
        }
    }

    async fn attempt(
        &self,
        text: &str,
        profile_id: &str,
        history: &[HistoryTurn],
    ) -> Result<String, TransformError> {
        let profile = self.profiles.get(profile_id)?;
        let prompt = compose(text, profile, history, &self.options.composer);
        debug!(profile_id, prompt_len = prompt.len(), "composed rewrite prompt");

        let rewritten = self
            .generator
            .complete(CompletionRequest {
                prompt,
                model: self.options.model.clone(),
                temperature: Some(self.options.temperature),
                max_tokens: Some(self.options.max_tokens),
            })
            .await?;
        Ok(rewritten.trim().to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
