//! One running helper and its release guard

use tokio_util::sync::CancellationToken;

use super::{HelperCommand, HelperProcess};
use crate::client::ClientSession;
use crate::error::BridgeError;

/// A started helper process, owned by exactly one call
///
/// Dropping the instance cancels it. Cancelling closes every session built
/// on it and terminates the process; later cancels do nothing.
pub struct HelperInstance {
    command: HelperCommand,
    process: Box<dyn HelperProcess>,
    cancel: CancellationToken,
    cancelled: bool,
}

impl HelperInstance {
    pub(crate) fn new(command: HelperCommand, process: Box<dyn HelperProcess>) -> Self {
        Self {
            command,
            process,
            cancel: CancellationToken::new(),
            cancelled: false,
        }
    }

    pub fn command(&self) -> &HelperCommand {
        &self.command
    }

    /// Wait for the helper and open a session to it
    pub async fn get_client(&mut self) -> Result<ClientSession, BridgeError> {
        if self.cancelled {
            return Err(BridgeError::ConnectionClosed);
        }
        let transport = self.process.ready().await?;
        Ok(ClientSession::new(transport, self.cancel.child_token()))
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Release the helper
    pub fn cancel(&mut self) {
        if self.cancelled {
            return;
        }
        self.cancelled = true;
        self.cancel.cancel();
        self.process.terminate();
        tracing::debug!(executable = %self.command.executable.display(), "Helper cancelled");
    }
}

impl Drop for HelperInstance {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for HelperInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelperInstance")
            .field("command", &self.command)
            .field("cancelled", &self.cancelled)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Transport;
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct DuplexProcess {
        terminations: Arc<AtomicUsize>,
        peer: Option<(tokio::io::DuplexStream, tokio::io::DuplexStream)>,
    }

    #[async_trait]
    impl HelperProcess for DuplexProcess {
        async fn ready(&mut self) -> Result<Transport, BridgeError> {
            let (client_read, helper_write) = tokio::io::duplex(1024);
            let (helper_read, client_write) = tokio::io::duplex(1024);
            self.peer = Some((helper_read, helper_write));
            Ok(Transport::new(client_read, client_write))
        }

        fn terminate(&mut self) {
            self.terminations.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn instance() -> (HelperInstance, Arc<AtomicUsize>) {
        let terminations = Arc::new(AtomicUsize::new(0));
        let process = DuplexProcess {
            terminations: terminations.clone(),
            peer: None,
        };
        let command = HelperCommand {
            executable: PathBuf::from("/opt/helper"),
            args: Vec::new(),
        };
        (HelperInstance::new(command, Box::new(process)), terminations)
    }

    #[tokio::test]
    async fn test_cancel_is_idempotent() {
        let (mut instance, terminations) = instance();
        instance.cancel();
        instance.cancel();
        drop(instance);
        assert_eq!(terminations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_drop_cancels() {
        let (instance, terminations) = instance();
        drop(instance);
        assert_eq!(terminations.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_closes_session() {
        let (mut instance, _) = instance();
        let session = instance.get_client().await.unwrap();
        assert!(!session.is_closed());

        instance.cancel();
        assert!(session.is_closed());
        let err = session
            .call_raw("Anything", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::ConnectionClosed));

        assert!(matches!(
            instance.get_client().await,
            Err(BridgeError::ConnectionClosed)
        ));
    }
}
