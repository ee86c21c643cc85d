//! hb-bridge: RPC bridge to a supervised helper process
//!
//! The host application hands privileged, long-running work to an external
//! helper. Every call goes through [`RpcBridge`], which:
//!
//! 1. starts a fresh [`HelperInstance`] through the [`HelperSupervisor`],
//! 2. waits for its [`ClientSession`],
//! 3. routes the helper's log lines and warnings to the injected logger,
//! 4. performs the call, logging and classifying any failure,
//! 5. cancels the instance exactly once, whatever happened.
//!
//! [`relaunch::RelaunchCoordinator`] is independent of the RPC path: it
//! starts the setup helper detached and waits for it to announce that the
//! host may exit.

pub mod classify;
pub mod client;
pub mod error;
pub mod notify;
pub mod relaunch;
pub mod session;
pub mod supervisor;

pub use classify::{
    as_request_error, get_error_message, get_error_stack, is_internal_error, local_stack,
};
pub use client::{ClientSession, Transport};
pub use error::{BridgeError, RemoteError};
pub use notify::{setup_client, setup_logging, ProgressSink};
pub use relaunch::{
    restart_pending, AbortReason, DetachedSpawner, ProcessSpawner, RelaunchCommand,
    RelaunchCoordinator, RelaunchOutcome, RelaunchState,
};
pub use session::{RpcBridge, ScopedBridge, SetupHook};
pub use supervisor::{
    ChildProcess, HelperCommand, HelperInstance, HelperProcess, HelperSupervisor, Launcher,
    ProcessLauncher,
};
