//! Reader settings - persisted user preferences.
//!
//! Settings are loaded from disk at startup; missing files and missing keys
//! fall back to defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::logging::LogFormat;

/// Errors raised when persisting settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// File I/O error.
    #[error("Failed to {operation} settings file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Settings could not be encoded as TOML.
    #[error("Failed to serialize settings")]
    Serialize(#[from] toml::ser::Error),
}

// =============================================================================
// ROOT SETTINGS
// =============================================================================

/// Reader settings.
///
/// Serialized to TOML and stored in the user's config directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Full-text search behavior.
    pub search: SearchSettings,

    /// Remote synchronization.
    pub sync: SyncSettings,

    /// Options forwarded to the document engine's renderer.
    pub render: RenderSettings,

    /// Log output, read by hosts before installing a subscriber.
    pub log: LogSettings,
}

impl Settings {
    /// Load settings from the default path.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from a specific path.
    ///
    /// Unreadable or malformed files yield the defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed settings at {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save settings to the default path.
    pub fn save(&self) -> Result<(), SettingsError> {
        self.save_to(&Self::config_path())
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SettingsError::Io {
                operation: "create directory for",
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let content = toml::to_string_pretty(self)?;

        std::fs::write(path, content).map_err(|e| SettingsError::Io {
            operation: "write",
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("app", "Flow", "FlowReader")
            .map(|dirs| dirs.config_dir().join("settings.toml"))
            .unwrap_or_else(|| PathBuf::from("settings.toml"))
    }
}

// =============================================================================
// SECTIONS
// =============================================================================

/// Full-text search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Quiet period after the last keyword change before a search runs.
    pub debounce_ms: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { debounce_ms: 1000 }
    }
}

/// Remote synchronization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Whether local changes are merged into the remote collection.
    pub enabled: bool,

    /// File name of the remote book collection.
    pub data_filename: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            data_filename: "data.json".to_string(),
        }
    }
}

/// Renderer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Allow scripts embedded in document content to run.
    pub allow_scripted_content: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            allow_scripted_content: true,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Base level: error, warn, info, debug or trace.
    pub level: String,

    pub format: LogFormat,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.search.debounce_ms, 1000);
        assert!(settings.sync.enabled);
        assert_eq!(settings.sync.data_filename, "data.json");
        assert!(settings.render.allow_scripted_content);
        assert_eq!(settings.log.level, "info");
    }

    #[test]
    fn test_log_section() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[log]\nlevel = \"debug\"\nformat = \"json\"\n").unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.log.level, "debug");
        assert_eq!(settings.log.format, LogFormat::Json);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("absent.toml"));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[search]\ndebounce_ms = 250\n").unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.search.debounce_ms, 250);
        assert_eq!(settings.sync, SyncSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.sync.enabled = false;
        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path), settings);
    }
}
