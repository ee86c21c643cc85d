//! Configuration management for helper-bridge

mod helper;
mod relaunch;
pub mod serde_utils;
mod updates;

pub use helper::HelperConfig;
pub use relaunch::RelaunchConfig;
pub use updates::UpdateConfig;

use crate::error::ConfigError;
use crate::packages::PackageState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("helper-bridge")
}

/// Get the default configuration file path
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Get the default directory for local state (database, logs)
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(dirs::data_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("helper-bridge")
}

/// Complete configuration file
///
/// ```toml
/// [helper]
/// package = "helper"
///
/// [relaunch]
/// attempts = 30
///
/// [packages.helper]
/// stage = "idle"
/// version_prefix = "/opt/helper/15.3.0"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub helper: HelperConfig,
    pub relaunch: RelaunchConfig,
    pub updates: UpdateConfig,
    /// Known packages and their install state
    pub packages: HashMap<String, PackageState>,
}

/// Load configuration from a file
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::io("read config", path, e))?;

    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Load the config at `path`, or at the default location when `None`.
///
/// A missing default file is not an error; defaults are used instead. An
/// explicitly requested file must exist.
pub fn load_or_default(path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let default_path = default_config_path();
            if default_path.exists() {
                load_config(&default_path)
            } else {
                tracing::info!("Config file not found, using default configuration");
                Ok(ConfigFile::default())
            }
        }
    }
}

/// Save configuration to a file
pub fn save_config<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| ConfigError::io("create config dir", parent, e))?;
    }

    std::fs::write(path, content)
        .map_err(|e| ConfigError::io("write config", path, e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packages::PackageStage;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_missing_explicit_config_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(matches!(
            load_or_default(Some(path.as_path())),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[relaunch]
attempts = 5
poll_interval_ms = 100
app_name = "kitch"

[packages.helper]
stage = "idle"
version_prefix = "/opt/helper/1.0"
"#,
        )
        .unwrap();

        let config: ConfigFile = load_config(&path).unwrap();
        assert_eq!(config.relaunch.attempts, 5);
        assert_eq!(config.relaunch.poll_interval, Duration::from_millis(100));
        assert_eq!(config.relaunch.app_name, "kitch");
        assert_eq!(config.helper.package, HelperConfig::default().package);

        let pkg = &config.packages["helper"];
        assert_eq!(pkg.stage, PackageStage::Idle);
        assert_eq!(pkg.version_prefix, Some(PathBuf::from("/opt/helper/1.0")));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ConfigFile::default();
        config.helper.service_address = "https://example.test".to_string();
        save_config(&path, &config).unwrap();

        let loaded: ConfigFile = load_config(&path).unwrap();
        assert_eq!(loaded.helper.service_address, "https://example.test");
        assert_eq!(loaded.relaunch.attempts, 30);
    }
}
