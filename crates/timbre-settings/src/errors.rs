//! Settings error type.

use thiserror::Error;

/// Errors from loading or parsing configuration.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid JSON.
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        /// Path that failed to parse.
        path: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The merged settings do not deserialize into the settings type.
    #[error("invalid settings: {0}")]
    Invalid(#[from] serde_json::Error),
}
