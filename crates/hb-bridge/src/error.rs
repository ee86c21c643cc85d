//! Bridge error types

use std::path::PathBuf;

use hb_protocol::{ErrorObject, ProtocolError};
use serde_json::Value;
use thiserror::Error;

/// Error reported by the helper across the RPC boundary
///
/// A negative `code` is a transport or dispatch failure (unknown method,
/// malformed request...). A non-negative code is a fault the helper raised
/// on purpose and that the host may want to show as-is.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} (code {code})")]
pub struct RemoteError {
    pub code: i64,
    pub message: String,
    pub data: Option<Value>,
}

impl RemoteError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Whether this is a bridge-level fault rather than a business one
    pub fn is_internal(&self) -> bool {
        self.code < 0
    }

    /// Stack trace captured inside the helper, if it sent one
    pub fn remote_stack(&self) -> Option<&str> {
        self.data.as_ref()?.get("stack")?.as_str()
    }
}

impl From<ErrorObject> for RemoteError {
    fn from(e: ErrorObject) -> Self {
        Self {
            code: e.code,
            message: e.message,
            data: e.data,
        }
    }
}

/// Anything that can go wrong while talking to a helper
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Helper package is missing or not installed; nothing was started
    #[error("Cannot make helper instance: {0}")]
    Registration(String),

    /// The helper executable could not be started
    #[error("Failed to spawn helper {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The helper started but never became reachable
    #[error("Helper did not become ready: {0}")]
    NotReady(String),

    /// The session ended before a response arrived
    #[error("Connection to helper closed")]
    ConnectionClosed,

    /// Framing or (de)serialization failure
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error response from the helper
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// The remote error carried by this error, if any
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            BridgeError::Remote(remote) => Some(remote),
            BridgeError::Registration(_)
            | BridgeError::Spawn { .. }
            | BridgeError::NotReady(_)
            | BridgeError::ConnectionClosed
            | BridgeError::Protocol(_)
            | BridgeError::Io(_) => None,
        }
    }
}
