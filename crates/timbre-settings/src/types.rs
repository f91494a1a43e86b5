//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase", default)]` so partial
//! JSON files deep-merge cleanly over compiled defaults.

use serde::{Deserialize, Serialize};

/// Root settings for the timbre server.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimbreSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name (used in logs).
    pub name: String,
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Generation-backend client settings.
    pub generator: GeneratorSettings,
    /// Style-transformation stage settings.
    pub transform: TransformSettings,
    /// Style profile store settings.
    pub profiles: ProfileSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for TimbreSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "timbre".to_string(),
            server: ServerSettings::default(),
            generator: GeneratorSettings::default(),
            transform: TransformSettings::default(),
            profiles: ProfileSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl TimbreSettings {
    /// Clamp out-of-range numeric fields, warning instead of rejecting so a
    /// bad value degrades to corrected behavior rather than a startup error.
    pub fn validate(&mut self) {
        let t = &mut self.transform;
        if !(0.0..=2.0).contains(&t.temperature) {
            let clamped = t.temperature.clamp(0.0, 2.0);
            tracing::warn!(
                temperature = t.temperature,
                clamped,
                "transform temperature out of range, clamped"
            );
            t.temperature = clamped;
        }
        if t.history_limit == 0 {
            tracing::warn!("transform historyLimit of 0 disables context excerpts");
        }
    }
}

/// HTTP server settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Shared bearer token required on every route when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8090,
            api_key: None,
        }
    }
}

/// Generation-backend client settings (OpenAI-compatible endpoint).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorSettings {
    /// Base URL of the chat-completions endpoint.
    pub base_url: String,
    /// API key for the backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model used for the main generation call.
    pub model: String,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: None,
            model: "gpt-4o".to_string(),
        }
    }
}

/// Style-transformation stage settings.
///
/// Sampling defaults match the rewriting call this stage was built around:
/// temperature 0.7, max 1000 output tokens.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransformSettings {
    /// Model used for the rewriting call.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Output token cap.
    pub max_tokens: u32,
    /// Maximum history turns included in a composed prompt.
    pub history_limit: usize,
    /// Context label inserted into the prompt template.
    pub context_label: String,
    /// Speaker label for user turns in history excerpts.
    pub user_label: String,
    /// Speaker label for assistant turns (also the trailing line label).
    pub assistant_label: String,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            history_limit: 5,
            context_label: "Assessment Workbench - Learning Assistant".to_string(),
            user_label: "Student".to_string(),
            assistant_label: "AI Assistant".to_string(),
        }
    }
}

/// Style profile store settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileSettings {
    /// Path to a JSON array of profiles; `None` uses the built-in set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// `tracing_subscriber` env-filter directive.
    pub filter: String,
    /// Emit JSON-formatted log lines.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}
