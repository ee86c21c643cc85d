//! Core error types for helper-bridge

use std::path::PathBuf;
use thiserror::Error;

/// Errors loading or saving the helper-bridge config file
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Reading, writing or creating the config location failed
    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    pub(crate) fn io(action: &'static str, path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}
