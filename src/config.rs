//! Player configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Gain must be between 0.0 and 1.0, got {0}")]
    InvalidGain(f32),
}

/// Configuration for the bell player
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BellPlayerConfig {
    /// Directory holding `do`, `re`, `mi`, `fa` and `sol` clips
    pub samples_dir: PathBuf,
    /// Remote melody extraction service; extraction runs in-process when unset
    pub extractor_url: Option<String>,
    /// Output gain applied to every bell
    pub gain: f32,
}

impl Default for BellPlayerConfig {
    fn default() -> Self {
        BellPlayerConfig {
            samples_dir: PathBuf::from("assets/bells"),
            extractor_url: None,
            gain: 0.8,
        }
    }
}

impl BellPlayerConfig {
    /// Load a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: BellPlayerConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.gain) {
            return Err(ConfigError::InvalidGain(self.gain));
        }
        Ok(())
    }
}
