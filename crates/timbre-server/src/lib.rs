//! # timbre-server
//!
//! The HTTP surface over the timbre runtime: profile listing, standalone
//! style transformation, response interception, and the orchestrated
//! `/chat` exchange with SSE delivery. Also hosts the concrete
//! collaborators the runtime traits abstract over (OpenAI-backed
//! generation, in-memory message store, tracing error reporter, LLM title
//! generator).
//!
//! ## Crate Position
//!
//! Leaf crate; the `timbre` binary lives here.

#![deny(unsafe_code)]

pub mod auth;
pub mod backend;
pub mod error;
pub mod health;
pub mod metrics;
pub mod reporting;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod sse;
pub mod state;
pub mod store;

pub use error::ApiError;
pub use server::TimbreServer;
pub use state::AppState;
