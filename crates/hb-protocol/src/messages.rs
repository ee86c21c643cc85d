//! Procedures and notifications understood by the helper

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::{NotificationDescriptor, RequestDescriptor};

/// Query the helper's version
pub struct VersionGet;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VersionGetParams {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionGetResult {
    /// Short version, e.g. "v15.3.0"
    pub version: String,
    /// Long version including build metadata
    pub version_string: String,
}

impl RequestDescriptor for VersionGet {
    const METHOD: &'static str = "Version.Get";
    type Params = VersionGetParams;
    type Result = VersionGetResult;
}

/// Progress of a long-running operation
pub struct Progress;

/// Progress payload, passed on untouched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressUpdate(pub Value);

impl NotificationDescriptor for Progress {
    const METHOD: &'static str = "Progress";
    type Params = ProgressUpdate;
}

/// A log line emitted by the helper
pub struct Log;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogParams {
    /// "debug", "info", "warning", "error", or anything else
    pub level: String,
    pub message: String,
}

impl NotificationDescriptor for Log {
    const METHOD: &'static str = "Log";
    type Params = LogParams;
}

/// Line the helper prints on stdout once it accepts connections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "listen-notification")]
pub struct ListenNotification {
    /// `host:port` of the RPC endpoint
    pub address: String,
}
