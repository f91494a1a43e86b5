//! Settings loading: file → deep merge → env overrides.

use crate::errors::SettingsError;
use crate::types::TimbreSettings;
use serde_json::Value;
use std::path::Path;

/// Deep-merge `overlay` into `base`. Objects merge recursively; any other
/// value in `overlay` replaces the base value.
#[must_use]
pub fn deep_merge(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Object(mut base_map), Value::Object(overlay_map)) => {
            for (key, overlay_val) in overlay_map {
                let merged = match base_map.remove(&key) {
                    Some(base_val) => deep_merge(base_val, overlay_val),
                    None => overlay_val,
                };
                let _ = base_map.insert(key, merged);
            }
            Value::Object(base_map)
        }
        (_, overlay) => overlay,
    }
}

/// Load settings from defaults plus env overrides only (no file).
pub fn load_settings() -> Result<TimbreSettings, SettingsError> {
    let mut settings = TimbreSettings::default();
    apply_env_overrides(&mut settings, |k| std::env::var(k).ok());
    settings.validate();
    Ok(settings)
}

/// Load settings from a JSON file, deep-merged over defaults, then apply
/// env overrides and validate.
pub fn load_settings_from_path(path: &Path) -> Result<TimbreSettings, SettingsError> {
    let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let file_value: Value =
        serde_json::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })?;

    let defaults = serde_json::to_value(TimbreSettings::default())?;
    let merged = deep_merge(defaults, file_value);
    let mut settings: TimbreSettings = serde_json::from_value(merged)?;

    apply_env_overrides(&mut settings, |k| std::env::var(k).ok());
    settings.validate();
    Ok(settings)
}

/// Apply `TIMBRE_*` environment overrides. The lookup function is injected
/// so tests never touch the process environment.
fn apply_env_overrides(
    settings: &mut TimbreSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(host) = lookup("TIMBRE_HOST") {
        settings.server.host = host;
    }
    if let Some(port) = lookup("TIMBRE_PORT").and_then(|v| v.parse().ok()) {
        settings.server.port = port;
    }
    if let Some(key) = lookup("TIMBRE_API_KEY") {
        settings.server.api_key = Some(key);
    }
    if let Some(url) = lookup("TIMBRE_GENERATOR_BASE_URL") {
        settings.generator.base_url = url;
    }
    if let Some(key) = lookup("TIMBRE_GENERATOR_API_KEY") {
        settings.generator.api_key = Some(key);
    }
    if let Some(model) = lookup("TIMBRE_GENERATOR_MODEL") {
        settings.generator.model = model;
    }
    if let Some(model) = lookup("TIMBRE_TRANSFORM_MODEL") {
        settings.transform.model = model;
    }
    if let Some(path) = lookup("TIMBRE_PROFILES_PATH") {
        settings.profiles.path = Some(path);
    }
    if let Some(filter) = lookup("TIMBRE_LOG_FILTER") {
        settings.logging.filter = filter;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn deep_merge_nested_objects() {
        let base = json!({"server": {"host": "127.0.0.1", "port": 8090}});
        let overlay = json!({"server": {"port": 9000}});
        let merged = deep_merge(base, overlay);
        assert_eq!(merged["server"]["host"], "127.0.0.1");
        assert_eq!(merged["server"]["port"], 9000);
    }

    #[test]
    fn deep_merge_scalar_replaces() {
        let merged = deep_merge(json!({"a": 1}), json!({"a": [1, 2]}));
        assert_eq!(merged["a"], json!([1, 2]));
    }

    #[test]
    fn load_from_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"transform": {{"historyLimit": 3}}}}"#).unwrap();

        let settings = load_settings_from_path(file.path()).unwrap();
        assert_eq!(settings.transform.history_limit, 3);
        // Untouched sections keep their defaults
        assert_eq!(settings.server.port, 8090);
    }

    #[test]
    fn load_missing_file_errors() {
        let err = load_settings_from_path(Path::new("/nonexistent/timbre.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn load_invalid_json_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let err = load_settings_from_path(file.path()).unwrap_err();
        assert!(matches!(err, SettingsError::Parse { .. }));
    }

    #[test]
    fn env_overrides_beat_file_values() {
        let mut settings: TimbreSettings =
            serde_json::from_str(r#"{"server": {"port": 9000}}"#).unwrap();
        apply_env_overrides(&mut settings, |k| match k {
            "TIMBRE_PORT" => Some("9001".to_string()),
            "TIMBRE_GENERATOR_MODEL" => Some("gpt-4o-mini".to_string()),
            _ => None,
        });
        assert_eq!(settings.server.port, 9001);
        assert_eq!(settings.generator.model, "gpt-4o-mini");
    }

    #[test]
    fn unparseable_env_port_is_ignored() {
        let mut settings = TimbreSettings::default();
        apply_env_overrides(&mut settings, |k| {
            (k == "TIMBRE_PORT").then(|| "not-a-port".to_string())
        });
        assert_eq!(settings.server.port, 8090);
    }
}
