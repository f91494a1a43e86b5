//! Runtime error types.

use crate::profiles::ProfileError;
use thiserror::Error;
use timbre_llm::GeneratorError;

/// Errors surfaced by the orchestration core.
///
/// Only generation and delivery failures are fatal to a session; profile
/// and transformation failures degrade to the original text before they
/// ever reach this type.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The generation backend failed. Fatal to the session.
    #[error("generation failed: {0}")]
    Generation(#[from] GeneratorError),

    /// Profile store failure.
    #[error(transparent)]
    Profile(#[from] ProfileError),

    /// The delivery sink rejected the envelope (usually a gone client).
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// The message store rejected a save or read.
    #[error("message store error: {0}")]
    Store(String),

    /// The generation client could not be acquired.
    #[error("failed to acquire generation client: {0}")]
    ClientAcquisition(String),
}
