//! Session configuration.
//!
//! Loaded from a TOML file in the user's config directory. A missing or
//! unparsable file yields the defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::locale::Locale;
use crate::storage::FileStore;

const CONFIG_FILENAME: &str = "config.toml";

/// Default artificial latency of a calculation.
pub const DEFAULT_COMPUTE_DELAY_MS: u64 = 1000;

/// Runtime configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Directory holding the stored values. `None` uses the platform data dir.
    pub storage_dir: Option<PathBuf>,

    /// Simulated calculation latency in milliseconds.
    pub compute_delay_ms: u64,

    /// System dark-mode preference, applied when no settings are stored yet.
    pub prefers_dark: bool,

    /// Locale used when none is stored.
    pub default_locale: Locale,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            compute_delay_ms: DEFAULT_COMPUTE_DELAY_MS,
            prefers_dark: false,
            default_locale: Locale::En,
        }
    }
}

impl SessionConfig {
    /// Load configuration from the default path.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::warn!("Could not determine config path, using defaults");
                Self::default()
            }
        }
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => {
                    tracing::info!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse config file: {}, using defaults", e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config file found at {:?}, using defaults", path);
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        std::fs::write(path, content).map_err(|e| format!("Failed to write config: {}", e))
    }

    /// Get the default config file path.
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "BmiStudio", "BMI Studio")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILENAME))
    }

    /// Storage directory, resolving `None` to the platform data dir.
    pub fn resolved_storage_dir(&self) -> PathBuf {
        self.storage_dir
            .clone()
            .or_else(FileStore::default_dir)
            .unwrap_or_else(|| PathBuf::from(".bmi-studio"))
    }

    pub fn compute_delay(&self) -> Duration {
        Duration::from_millis(self.compute_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = SessionConfig::load_from(&dir.path().join("absent.toml"));
        assert_eq!(config, SessionConfig::default());
        assert_eq!(config.compute_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_file_merges_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "prefers_dark = true\ndefault_locale = \"he\"\n").unwrap();

        let config = SessionConfig::load_from(&path);
        assert!(config.prefers_dark);
        assert_eq!(config.default_locale, Locale::He);
        assert_eq!(config.compute_delay_ms, DEFAULT_COMPUTE_DELAY_MS);
    }

    #[test]
    fn test_unparsable_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "compute_delay_ms = \"soon\"").unwrap();
        assert_eq!(SessionConfig::load_from(&path), SessionConfig::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = SessionConfig {
            storage_dir: Some(dir.path().join("data")),
            compute_delay_ms: 0,
            ..Default::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(SessionConfig::load_from(&path), config);
    }

    #[test]
    fn test_explicit_storage_dir_wins() {
        let config = SessionConfig {
            storage_dir: Some(PathBuf::from("/tmp/bmi")),
            ..Default::default()
        };
        assert_eq!(config.resolved_storage_dir(), PathBuf::from("/tmp/bmi"));
    }
}
