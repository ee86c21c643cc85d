//! hb-protocol: Wire protocol between a host application and its helper process
//!
//! This crate defines the JSON-RPC 2.0 envelopes exchanged with the helper,
//! the newline-delimited codec used to frame them, the typed descriptors for
//! individual procedures and notifications, and the message format the setup
//! helper writes to the shared relaunch log.

pub mod codec;
pub mod descriptor;
pub mod error;
pub mod message;
pub mod messages;
pub mod relaunch;

pub use codec::{Frame, JsonLineCodec, MAX_LINE_LENGTH};
pub use descriptor::{NotificationDescriptor, RequestDescriptor};
pub use error::ProtocolError;
pub use message::{error_codes, ErrorObject, Message, Notification, Request, RequestId, Response};
pub use relaunch::{find_ready_message, RelaunchMessage, READY_TO_RELAUNCH};
