//! # timbre-settings
//!
//! Configuration for the timbre server, loaded from three layers in
//! priority order:
//!
//! 1. **Compiled defaults** — [`TimbreSettings::default()`]
//! 2. **JSON file** — path given on the command line (deep-merged over
//!    defaults, partial files are fine)
//! 3. **Environment variables** — `TIMBRE_*` overrides (highest priority)
//!
//! Settings are loaded once at startup and passed explicitly; there is no
//! global singleton and no runtime reload.

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::SettingsError;
pub use loader::{deep_merge, load_settings, load_settings_from_path};
pub use types::*;
