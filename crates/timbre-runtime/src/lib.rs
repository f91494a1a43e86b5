//! # timbre-runtime
//!
//! The orchestration core of timbre: everything between "a user message
//! arrived" and "the final envelope left the building".
//!
//! - **Profile store**: ordered, read-only set of style profiles
//! - **Prompt composer**: deterministic rewrite-instruction builder
//! - **Transform stage**: best-effort tone rewriting with fallback
//! - **Cancel registry**: per-request cancellation tokens with completion
//!   disarming and abort-context snapshots
//! - **Cleanup registry**: ordered, isolated, run-exactly-once teardown
//! - **Orchestrator**: the session lifecycle state machine
//!
//! ## Crate Position
//!
//! Aggregation layer. Depends on: timbre-core, timbre-llm.
//! Depended on by: timbre-server.

#![deny(unsafe_code)]

pub mod cancel;
pub mod cleanup;
pub mod errors;
pub mod orchestrator;
pub mod profiles;
pub mod prompt;
pub mod session;
pub mod traits;
pub mod transform;

pub use cancel::{AbortSnapshot, CancelHandle, CancelRegistry, ContextProvider, OnStart};
pub use cleanup::{CleanupAction, CleanupRegistry};
pub use errors::RuntimeError;
pub use orchestrator::{ExchangeRequest, Outcome, SessionOrchestrator};
pub use profiles::{ProfileError, ProfileStore};
pub use prompt::{ComposerOptions, compose};
pub use session::{RequestSession, SessionUpdate};
pub use traits::{
    DeliverySink, ErrorReport, ErrorReporter, GenerationBackend, GenerationClient,
    GenerationReply, GenerationRequest, MessageStore, TitleGenerator,
};
pub use transform::{StyleTransformer, TransformOptions, TransformOutcome};
