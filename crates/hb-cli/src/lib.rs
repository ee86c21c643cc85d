//! helper-bridge CLI
//!
//! Provides the `helper-bridge` binary for calling the helper, checking its
//! version, running the relaunch handshake, and inspecting configuration.

pub mod commands;
pub mod output;
