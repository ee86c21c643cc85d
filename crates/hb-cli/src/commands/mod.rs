//! CLI command implementations

mod call;
mod config;
mod relaunch;
mod status;

pub use call::{call_command, version_command};
pub use config::{config_init, config_path, config_show};
pub use relaunch::relaunch_command;
pub use status::status_command;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use hb_bridge::{HelperSupervisor, RpcBridge};
use hb_core::config::{self as core_config, ConfigFile};
use hb_core::{PackageTable, TracingLogger};

/// Load the config named on the command line, or the default one
pub fn load_config(config_path: Option<&PathBuf>) -> Result<ConfigFile> {
    core_config::load_or_default(config_path.map(PathBuf::as_path)).with_context(|| {
        format!(
            "Failed to load configuration from {:?}",
            config_path
                .cloned()
                .unwrap_or_else(core_config::default_config_path)
        )
    })
}

/// Bridge spawning real helpers, with package state taken from the config
pub fn build_bridge(config: &ConfigFile, logger: &TracingLogger) -> RpcBridge {
    tracing::debug!(
        package = %config.helper.package,
        packages = config.packages.len(),
        "Building helper bridge"
    );
    RpcBridge::new(
        HelperSupervisor::with_process_launcher(config.helper.clone()),
        Arc::new(PackageTable::from_config(&config.packages)),
        Arc::new(logger.child("helper")),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_reads_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[relaunch]\nattempts = 7\n").unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.relaunch.attempts, 7);
        assert_eq!(config.helper.package, "helper");
    }

    #[test]
    fn test_load_config_missing_explicit_file_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("absent.toml");

        let err = load_config(Some(&path)).unwrap_err();
        assert!(format!("{:#}", err).contains("absent.toml"));
    }
}
