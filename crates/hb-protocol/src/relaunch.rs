//! Messages the setup helper writes to the shared relaunch log
//!
//! The log is newline-delimited JSON. Only the `type` field carries meaning;
//! everything else is kept as-is for diagnostics.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `type` value signalling that the host may exit
pub const READY_TO_RELAUNCH: &str = "ready-to-relaunch";

/// One line of the relaunch log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelaunchMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl RelaunchMessage {
    /// Parse one line; `None` for anything that is not a complete message
    pub fn parse_line(line: &str) -> Option<Self> {
        serde_json::from_str(line).ok()
    }

    pub fn is_ready_to_relaunch(&self) -> bool {
        self.kind == READY_TO_RELAUNCH
    }
}

/// First ready-to-relaunch message in file order, if any
pub fn find_ready_message(content: &str) -> Option<RelaunchMessage> {
    content
        .split('\n')
        .filter_map(RelaunchMessage::parse_line)
        .find(RelaunchMessage::is_ready_to_relaunch)
}
