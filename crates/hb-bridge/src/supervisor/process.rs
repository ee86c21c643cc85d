//! Real helper processes
//!
//! The helper prints a `listen-notification` JSON line on stdout once its RPC
//! endpoint accepts connections. Everything else it prints is diagnostic
//! output and goes to the debug log.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tokio::process::{Child, ChildStdout, Command};

use hb_protocol::messages::ListenNotification;

use super::{HelperCommand, HelperProcess, Launcher};
use crate::client::Transport;
use crate::error::BridgeError;

/// Launcher spawning the helper executable as a child process
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    ready_timeout: Duration,
}

impl ProcessLauncher {
    pub fn new(ready_timeout: Duration) -> Self {
        Self { ready_timeout }
    }
}

impl Launcher for ProcessLauncher {
    fn launch(&self, command: &HelperCommand) -> Result<Box<dyn HelperProcess>, BridgeError> {
        let mut child = Command::new(&command.executable)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| BridgeError::Spawn {
                path: command.executable.clone(),
                source,
            })?;

        tracing::debug!(pid = ?child.id(), "Helper spawned");
        let stdout = child.stdout.take();
        Ok(Box::new(ChildProcess {
            child,
            stdout,
            ready_timeout: self.ready_timeout,
        }))
    }
}

/// A helper running as a child of this process
pub struct ChildProcess {
    child: Child,
    stdout: Option<ChildStdout>,
    ready_timeout: Duration,
}

/// Next stdout line, decoded lossily so stray bytes never end the stream
async fn next_line(reader: &mut BufReader<ChildStdout>) -> std::io::Result<Option<String>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf).await? == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&buf).trim_end().to_string()))
}

impl ChildProcess {
    async fn wait_for_address(
        reader: &mut BufReader<ChildStdout>,
    ) -> std::io::Result<Option<String>> {
        while let Some(line) = next_line(reader).await? {
            match serde_json::from_str::<ListenNotification>(line.trim()) {
                Ok(listen) => return Ok(Some(listen.address)),
                Err(_) => tracing::debug!(target: "helper", "{}", line),
            }
        }
        Ok(None)
    }

    fn exit_description(&mut self) -> String {
        match self.child.try_wait() {
            Ok(Some(status)) => format!("helper exited ({})", status),
            _ => "helper closed stdout".to_string(),
        }
    }
}

#[async_trait]
impl HelperProcess for ChildProcess {
    async fn ready(&mut self) -> Result<Transport, BridgeError> {
        let stdout = self
            .stdout
            .take()
            .ok_or_else(|| BridgeError::NotReady("helper stdout already consumed".to_string()))?;
        let mut reader = BufReader::new(stdout);

        let address = tokio::time::timeout(self.ready_timeout, Self::wait_for_address(&mut reader))
            .await
            .map_err(|_| {
                BridgeError::NotReady(format!(
                    "no listen notification within {:?}",
                    self.ready_timeout
                ))
            })??;

        let Some(address) = address else {
            return Err(BridgeError::NotReady(self.exit_description()));
        };

        tokio::spawn(async move {
            while let Ok(Some(line)) = next_line(&mut reader).await {
                tracing::debug!(target: "helper", "{}", line);
            }
        });

        tracing::debug!(%address, "Connecting to helper");
        let stream = TcpStream::connect(&address).await?;
        Ok(Transport::from_tcp(stream))
    }

    fn terminate(&mut self) {
        if let Err(e) = self.child.start_kill() {
            tracing::debug!("Failed to kill helper: {}", e);
        }
    }
}
