//! Configuration persistence for the flashcards app.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::{MAX_INTERVAL_DAYS, SESSION_SIZE};
use crate::scheduler::Scheduler;

/// Application configuration that persists between sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Maximum number of cards in a prioritized session.
    #[serde(default = "default_session_size")]
    pub session_size: usize,

    /// Upper bound on review intervals, never above 180 days.
    #[serde(default = "default_max_interval_days")]
    pub max_interval_days: i64,

    /// Data directory override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decks_dir: Option<PathBuf>,
}

fn default_session_size() -> usize {
    SESSION_SIZE
}

fn default_max_interval_days() -> i64 {
    MAX_INTERVAL_DAYS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session_size: default_session_size(),
            max_interval_days: default_max_interval_days(),
            decks_dir: None,
        }
    }
}

impl Config {
    /// Get the default config file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("xcards")
            .join("config.toml")
    }

    /// Load config from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load config from `path`, returning default if the file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Save config to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::default_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize config")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Scheduler honoring the configured interval cap.
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::with_max_interval(self.max_interval_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.session_size, 20);
        assert_eq!(config.scheduler().max_interval_days(), 180);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_interval_days = 30\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.session_size, 20);
        assert_eq!(config.max_interval_days, 30);
        assert_eq!(config.scheduler().max_interval_days(), 30);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = Config {
            session_size: 5,
            max_interval_days: 400,
            decks_dir: Some(PathBuf::from("/tmp/decks")),
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        // the cap is clamped when the scheduler is built, not when stored
        assert_eq!(loaded.scheduler().max_interval_days(), 180);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "session_size = \"many\"\n").unwrap();
        assert!(Config::load_from(&path).is_err());
    }
}
