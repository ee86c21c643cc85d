//! Helper process configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::serde_utils::duration_secs;

/// How helper instances are launched
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperConfig {
    /// Package name the helper is registered under
    pub package: String,

    /// Executable file name inside the package's version prefix
    pub executable: String,

    /// Local database the helper operates on
    pub db_path: PathBuf,

    /// Remote service the helper talks to
    pub service_address: String,

    /// How long to wait for a spawned helper to announce its endpoint
    #[serde(rename = "ready_timeout_secs", with = "duration_secs")]
    pub ready_timeout: Duration,
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            package: "helper".to_string(),
            executable: default_executable_name(),
            db_path: super::default_data_dir().join("db").join("helper.db"),
            service_address: "https://itch.io".to_string(),
            ready_timeout: Duration::from_secs(30),
        }
    }
}

impl HelperConfig {
    /// Fixed launch arguments: local database and service address
    pub fn launch_args(&self) -> Vec<String> {
        vec![
            "--dbpath".to_string(),
            self.db_path.display().to_string(),
            "--address".to_string(),
            self.service_address.clone(),
        ]
    }
}

fn default_executable_name() -> String {
    if cfg!(windows) {
        "helper.exe".to_string()
    } else {
        "helper".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_args_order() {
        let config = HelperConfig {
            db_path: PathBuf::from("/tmp/db/helper.db"),
            service_address: "https://svc.test".to_string(),
            ..HelperConfig::default()
        };
        assert_eq!(
            config.launch_args(),
            vec!["--dbpath", "/tmp/db/helper.db", "--address", "https://svc.test"]
        );
    }
}
