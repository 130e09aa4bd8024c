//! Till configuration
//!
//! A small YAML file naming the two data files and the currency symbol to
//! print on receipts. Every field has a default, so a missing file or an
//! empty one both yield a working configuration.

use std::{fs, path::PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Io {
        /// Path of the file.
        path: PathBuf,

        /// Underlying IO error.
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML.
    #[error(transparent)]
    Yaml(#[from] serde_norway::Error),
}

/// Runtime configuration for one till session.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TillConfig {
    /// Path of the inventory CSV.
    pub inventory: PathBuf,

    /// Path of the append-only sales ledger CSV.
    pub sales_log: PathBuf,

    /// Symbol printed in front of money amounts.
    pub currency_symbol: String,
}

impl Default for TillConfig {
    fn default() -> Self {
        TillConfig {
            inventory: PathBuf::from("inventory.csv"),
            sales_log: PathBuf::from("sales_log.csv"),
            currency_symbol: "R".to_owned(),
        }
    }
}

impl TillConfig {
    /// Loads configuration from a YAML file.
    ///
    /// A missing file yields the defaults; any other IO failure is an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(source) if source.kind() == std::io::ErrorKind::NotFound => {
                return Ok(TillConfig::default());
            }
            Err(source) => return Err(ConfigError::Io { path, source }),
        };

        if contents.trim().is_empty() {
            return Ok(TillConfig::default());
        }

        Ok(serde_norway::from_str(&contents)?)
    }
}
