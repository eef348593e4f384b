//! Configuration loading
//!
//! Configuration is an optional YAML file; every field has a default, so an
//! absent file and an empty file behave the same.
//!
//! ```yaml
//! database: /var/lib/casefile/cases.db
//! log_level: info
//! listing:
//!   default_page_size: 25
//!   max_page_size: 200
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file; falls back to [`default_db_path`]
    pub database: Option<PathBuf>,
    /// Maximum log level for the CLI (error, warn, info, debug, trace)
    pub log_level: Option<String>,
    pub listing: ListingDefaults,
}

/// Pagination defaults for case listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingDefaults {
    pub default_page_size: u64,
    pub max_page_size: u64,
}

impl Default for ListingDefaults {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

impl Config {
    /// Parse configuration from YAML text
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes as unit, not as an empty mapping
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Load configuration from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load an explicit config file, or the default one if it exists, or defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::load(path),
            None => match default_config_path() {
                Some(path) if path.is_file() => Self::load(path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Database path: explicit override, then config, then the default location
    pub fn database_path(&self, explicit: Option<PathBuf>) -> PathBuf {
        explicit
            .or_else(|| self.database.clone())
            .unwrap_or_else(default_db_path)
    }
}

/// Get the default config path (~/.config/casefile/config.yaml)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("casefile").join("config.yaml"))
}

/// Get the default database path (~/.local/share/casefile/casefile.db)
pub fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("casefile").join("casefile.db")
}
