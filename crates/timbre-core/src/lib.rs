//! # timbre-core
//!
//! Foundation types shared by every timbre crate:
//!
//! - **Branded IDs**: [`ids::ConversationId`], [`ids::MessageId`],
//!   [`ids::RequestKey`] as newtypes over UUID strings
//! - **Style profiles**: [`profile::StyleProfile`] with five trait
//!   intensities on the [-2, +2] scale
//! - **Messages**: [`message::ChatMessage`] and the stored-history excerpt
//!   types consumed by the prompt composer
//! - **Envelope**: [`envelope::ResponseEnvelope`], the final payload sent to
//!   the delivery sink exactly once per session
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by all other timbre crates.

#![deny(unsafe_code)]

pub mod envelope;
pub mod ids;
pub mod message;
pub mod profile;
