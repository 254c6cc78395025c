//! Configuration management for platevote.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::plate::PlatePolicy;
use crate::storage::DEFAULT_LEADERBOARD_LIMIT;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "platevote";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `PLATEVOTE_`)
/// 2. TOML config file at `~/.config/platevote/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Leaderboard configuration.
    pub leaderboard: LeaderboardConfig,
    /// Voting configuration.
    pub voting: VotingConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the database image and profile blobs.
    /// Defaults to `~/.local/share/platevote`
    pub data_dir: Option<PathBuf>,
}

/// Leaderboard-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    /// Maximum rows per leaderboard.
    pub limit: usize,
}

/// Voting-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingConfig {
    /// Regex normalized plates must match. Unset accepts any non-empty plate.
    pub plate_pattern: Option<String>,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LEADERBOARD_LIMIT,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("PLATEVOTE_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.leaderboard.limit == 0 {
            return Err(Error::ConfigValidation {
                message: "leaderboard.limit must be greater than 0".to_string(),
            });
        }

        self.plate_policy()?;
        Ok(())
    }

    /// Get the data directory, resolving defaults if not set.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.storage
            .data_dir
            .clone()
            .unwrap_or_else(Self::default_data_dir)
    }

    /// Build the plate acceptance policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured pattern is not a valid regex.
    pub fn plate_policy(&self) -> Result<PlatePolicy> {
        match &self.voting.plate_pattern {
            Some(pattern) => PlatePolicy::with_pattern(pattern),
            None => Ok(PlatePolicy::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.data_dir.is_none());
        assert_eq!(config.leaderboard.limit, 50);
        assert!(config.voting.plate_pattern.is_none());
    }

    #[test]
    fn test_validate_valid_config() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_limit() {
        let mut config = Config::default();
        config.leaderboard.limit = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("leaderboard.limit"));
    }

    #[test]
    fn test_validate_invalid_regex() {
        let mut config = Config::default();
        config.voting.plate_pattern = Some("[invalid".to_string());

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("invalid plate pattern"));
    }

    #[test]
    fn test_plate_policy_from_config() {
        let mut config = Config::default();
        config.voting.plate_pattern = Some("^[A-Z]+$".to_string());

        let policy = config.plate_policy().unwrap();
        assert!(policy.parse("abc").is_ok());
        assert!(policy.parse("abc1").unwrap_err().is_invalid_input());
    }

    #[test]
    fn test_data_dir_default() {
        let config = Config::default();
        assert!(config.data_dir().to_string_lossy().contains("platevote"));
    }

    #[test]
    fn test_data_dir_custom() {
        let mut config = Config::default();
        config.storage.data_dir = Some(PathBuf::from("/custom/data"));

        assert_eq!(config.data_dir(), PathBuf::from("/custom/data"));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("platevote"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        // Loading from a nonexistent path should work (uses defaults)
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml")));
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[leaderboard]\nlimit = 10\n\n[voting]\nplate_pattern = \"^[A-Z0-9]+$\"\n",
        )
        .unwrap();

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.leaderboard.limit, 10);
        assert_eq!(config.voting.plate_pattern.as_deref(), Some("^[A-Z0-9]+$"));
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[leaderboard]\nlimit = 0\n").unwrap();

        let err = Config::load_from(Some(path)).unwrap_err();
        assert!(matches!(err, Error::ConfigValidation { .. }));
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("leaderboard"));
        assert!(json.contains("plate_pattern"));
    }

    #[test]
    fn test_leaderboard_config_deserialize() {
        let json = r#"{"limit": 5}"#;
        let leaderboard: LeaderboardConfig = serde_json::from_str(json).unwrap();
        assert_eq!(leaderboard.limit, 5);
    }
}
