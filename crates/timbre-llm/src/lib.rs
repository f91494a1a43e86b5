//! # timbre-llm
//!
//! The [`Generator`] trait — one non-streaming text-completion call against
//! an external generative backend — and the OpenAI-compatible
//! chat-completions implementation used for generation, style rewriting,
//! and title synthesis.
//!
//! ## Crate Position
//!
//! Depends on: timbre-core. Depended on by: timbre-runtime, timbre-server.

#![deny(unsafe_code)]

pub mod generator;
pub mod openai;

pub use generator::{CompletionRequest, Generator, GeneratorError, GeneratorResult};
pub use openai::{OpenAiConfig, OpenAiGenerator};
