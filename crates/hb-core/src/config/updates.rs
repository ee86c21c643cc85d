//! Component update check configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::serde_utils::duration_secs;

/// How often installed components are checked for updates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateConfig {
    /// Base interval between checks
    #[serde(rename = "interval_secs", with = "duration_secs")]
    pub interval: Duration,

    /// Upper bound of the random delay added to each interval
    #[serde(rename = "wiggle_secs", with = "duration_secs")]
    pub wiggle: Duration,
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2 * 60 * 60),
            wiggle: Duration::from_secs(12 * 60),
        }
    }
}
