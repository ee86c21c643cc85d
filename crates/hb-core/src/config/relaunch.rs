//! Relaunch handshake configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::serde_utils::duration_millis;

/// Parameters of the relaunch handshake
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelaunchConfig {
    /// Package (and executable) name of the setup helper
    pub package: String,

    /// Name of the host application, passed to the setup helper
    pub app_name: String,

    /// Number of times the relaunch log is read before giving up
    pub attempts: u32,

    /// Delay after each unsuccessful read
    #[serde(rename = "poll_interval_ms", with = "duration_millis")]
    pub poll_interval: Duration,

    /// Shared log file the setup helper writes to
    pub log_path: PathBuf,
}

impl Default for RelaunchConfig {
    fn default() -> Self {
        Self {
            package: "helper-setup".to_string(),
            app_name: "helper-bridge".to_string(),
            attempts: 30,
            poll_interval: Duration::from_millis(250),
            log_path: super::default_data_dir().join("relaunch.log"),
        }
    }
}
