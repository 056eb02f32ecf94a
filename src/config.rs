//! Configuration loading and management
//!
//! Handles parsing of `.kanri.toml` configuration files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path of the CSV data file, relative to the working directory
    #[serde(default = "default_data_file")]
    pub data_file: String,

    /// View-history configuration
    #[serde(default)]
    pub history: HistoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            history: HistoryConfig::default(),
        }
    }
}

fn default_data_file() -> String {
    "kanri.csv".to_string()
}

/// View-history configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Cap on remembered views; unset means unbounded
    #[serde(default)]
    pub capacity: Option<usize>,
}

impl Config {
    /// Load configuration from a `.kanri.toml` file
    pub fn load(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, or return defaults
    pub fn load_from_dir(dir: &PathBuf) -> Self {
        let config_path = dir.join(".kanri.toml");
        if config_path.exists() {
            Self::load(&config_path).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &PathBuf) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| {
            Error::InvalidArgument(format!("cannot serialize config: {e}"))
        })?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.data_file.trim().is_empty() {
            return Err(Error::InvalidArgument(
                "data_file cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
