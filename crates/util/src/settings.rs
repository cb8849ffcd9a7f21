//! Table settings persistence.
//!
//! Settings record how a table is configured when none of the command line
//! flags say otherwise: which table shape edits the document, the value type
//! and the key comparator kind. The file lives in the standard configuration
//! directory (`~/.config/valuetable/settings.json` on most platforms) unless
//! `VALUETABLE_SETTINGS_PATH` points elsewhere.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dirs_next::config_dir;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use valuetable_types::{KeyKind, TableKind, ValueKind};

use crate::expand_tilde;

/// Environment variable allowing callers to override the settings file path.
pub const SETTINGS_PATH_ENV: &str = "VALUETABLE_SETTINGS_PATH";

/// Default filename for the JSON payload.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Error surfaced when reading or writing settings fails.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// I/O failure (for example, permissions or missing directory).
    #[error("settings I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization or deserialization failure.
    #[error("settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persisted table configuration.
///
/// Field names also accept the property names used by editors
/// (`valuetype`, `keytype`, `rangetype`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableSettings {
    pub kind: TableKind,
    #[serde(alias = "valuetype")]
    pub value_type: ValueKind,
    #[serde(alias = "keytype", alias = "rangetype", skip_serializing_if = "Option::is_none")]
    pub key_type: Option<KeyKind>,
}

impl TableSettings {
    /// The configured comparator kind, or the table shape's default.
    pub fn key_kind(&self) -> KeyKind {
        self.key_type.unwrap_or_else(|| self.kind.default_key_kind())
    }
}

/// Resolves the settings path, honoring [`SETTINGS_PATH_ENV`].
pub fn default_settings_path() -> PathBuf {
    if let Ok(path) = env::var(SETTINGS_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_tilde(trimmed);
        }
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("valuetable")
        .join(SETTINGS_FILE_NAME)
}

/// Loads settings, treating a missing or unreadable payload as defaults.
pub fn load_settings(path: &Path) -> Result<TableSettings, SettingsError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(settings) => Ok(settings),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse settings file; using defaults"
                );
                Ok(TableSettings::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(TableSettings::default()),
        Err(error) => Err(SettingsError::Io(error)),
    }
}

pub fn save_settings(path: &Path, settings: &TableSettings) -> Result<(), SettingsError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_string_pretty(settings)?;
    fs::write(path, data)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let settings = load_settings(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings, TableSettings::default());
        assert_eq!(settings.key_kind(), KeyKind::String);
    }

    #[test]
    fn accepts_editor_property_names() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, r#"{"kind": "range", "valuetype": "color"}"#).unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.kind, TableKind::Range);
        assert_eq!(settings.value_type, ValueKind::Color);
        assert_eq!(settings.key_kind(), KeyKind::Number);
    }

    #[test]
    fn unknown_range_type_compares_as_text() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, r#"{"kind": "range", "rangetype": "date"}"#).unwrap();

        let settings = load_settings(&path).unwrap();
        assert_eq!(settings.kind, TableKind::Range);
        assert_eq!(settings.key_type, Some(KeyKind::String));
        assert_eq!(settings.key_kind(), KeyKind::String);
    }

    #[test]
    fn invalid_json_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE_NAME);
        fs::write(&path, "not json").unwrap();
        assert_eq!(load_settings(&path).unwrap(), TableSettings::default());
    }

    #[test]
    fn saved_settings_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(SETTINGS_FILE_NAME);
        let settings = TableSettings {
            kind: TableKind::Map,
            value_type: ValueKind::Boolean,
            key_type: Some(KeyKind::Number),
        };
        save_settings(&path, &settings).unwrap();
        assert_eq!(load_settings(&path).unwrap(), settings);
    }

    #[test]
    fn default_path_honors_env_override() {
        let override_path = "~/custom/settings.json";
        temp_env::with_var(SETTINGS_PATH_ENV, Some(override_path), || {
            assert_eq!(default_settings_path(), expand_tilde(override_path));
        });
    }
}
