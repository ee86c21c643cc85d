//! Helper process supervision
//!
//! The supervisor turns a package's version prefix into a running helper.
//! Starting the process is delegated to a [`Launcher`] so that tests can
//! substitute in-memory helpers for real executables.

mod instance;
mod process;

pub use instance::HelperInstance;
pub use process::{ChildProcess, ProcessLauncher};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

use hb_core::config::HelperConfig;
use hb_core::PackageRegistry;

use crate::client::Transport;
use crate::error::BridgeError;

/// Executable and arguments for one helper launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperCommand {
    pub executable: PathBuf,
    pub args: Vec<String>,
}

/// A started helper process
#[async_trait]
pub trait HelperProcess: Send {
    /// Wait until the helper accepts calls and hand over its transport
    async fn ready(&mut self) -> Result<Transport, BridgeError>;

    /// Stop the process; called at most once per instance
    fn terminate(&mut self);
}

/// Starts helper processes
pub trait Launcher: Send + Sync {
    fn launch(&self, command: &HelperCommand) -> Result<Box<dyn HelperProcess>, BridgeError>;
}

/// Creates helper instances for the configured helper package
pub struct HelperSupervisor {
    config: HelperConfig,
    launcher: Arc<dyn Launcher>,
}

impl HelperSupervisor {
    pub fn new(config: HelperConfig, launcher: Arc<dyn Launcher>) -> Self {
        Self { config, launcher }
    }

    /// Supervisor that spawns real executables
    pub fn with_process_launcher(config: HelperConfig) -> Self {
        let launcher = Arc::new(ProcessLauncher::new(config.ready_timeout));
        Self::new(config, launcher)
    }

    pub fn config(&self) -> &HelperConfig {
        &self.config
    }

    /// Command that would be run for a helper installed under `prefix`
    pub fn command_for(&self, prefix: &Path) -> HelperCommand {
        HelperCommand {
            executable: prefix.join(&self.config.executable),
            args: self.config.launch_args(),
        }
    }

    /// Start a helper installed under `prefix`
    pub fn create(&self, prefix: Option<&Path>) -> Result<HelperInstance, BridgeError> {
        let prefix =
            prefix.ok_or_else(|| BridgeError::Registration("no version prefix".to_string()))?;

        let command = self.command_for(prefix);
        tracing::debug!(
            executable = %command.executable.display(),
            args = ?command.args,
            "Launching helper"
        );
        let process = self.launcher.launch(&command)?;
        Ok(HelperInstance::new(command, process))
    }

    /// Start the helper package as currently registered
    pub fn create_from_registry(
        &self,
        registry: &dyn PackageRegistry,
    ) -> Result<HelperInstance, BridgeError> {
        let state = registry.package(&self.config.package).ok_or_else(|| {
            BridgeError::Registration(format!("package '{}' not registered", self.config.package))
        })?;
        self.create(state.version_prefix.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hb_core::{PackageStage, PackageState, PackageTable};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingLauncher {
        launches: AtomicUsize,
    }

    struct IdleProcess;

    #[async_trait]
    impl HelperProcess for IdleProcess {
        async fn ready(&mut self) -> Result<Transport, BridgeError> {
            Err(BridgeError::NotReady("idle".into()))
        }

        fn terminate(&mut self) {}
    }

    impl Launcher for CountingLauncher {
        fn launch(&self, _: &HelperCommand) -> Result<Box<dyn HelperProcess>, BridgeError> {
            self.launches.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(IdleProcess))
        }
    }

    fn supervisor() -> (HelperSupervisor, Arc<CountingLauncher>) {
        let launcher = Arc::new(CountingLauncher::default());
        let config = HelperConfig {
            executable: "helper".into(),
            db_path: PathBuf::from("/data/helper.db"),
            service_address: "https://svc.test".into(),
            ..HelperConfig::default()
        };
        (HelperSupervisor::new(config, launcher.clone()), launcher)
    }

    #[test]
    fn test_command_layout() {
        let (supervisor, _) = supervisor();
        let command = supervisor.command_for(Path::new("/opt/helper/1.2.3"));
        assert_eq!(command.executable, PathBuf::from("/opt/helper/1.2.3/helper"));
        assert_eq!(
            command.args,
            vec!["--dbpath", "/data/helper.db", "--address", "https://svc.test"]
        );
    }

    #[test]
    fn test_missing_prefix_launches_nothing() {
        let (supervisor, launcher) = supervisor();
        let err = supervisor.create(None).unwrap_err();
        assert!(matches!(err, BridgeError::Registration(ref m) if m == "no version prefix"));
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_registry_lookup() {
        let (supervisor, launcher) = supervisor();
        let table = PackageTable::new();

        let err = supervisor.create_from_registry(&table).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot make helper instance: package 'helper' not registered"
        );

        table.insert("helper", PackageState::default());
        let err = supervisor.create_from_registry(&table).unwrap_err();
        assert!(matches!(err, BridgeError::Registration(_)));
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 0);

        table.insert(
            "helper",
            PackageState {
                stage: PackageStage::Idle,
                version_prefix: Some(PathBuf::from("/opt/helper/2.0.0")),
                available_version: None,
            },
        );
        let instance = supervisor.create_from_registry(&table).unwrap();
        assert_eq!(
            instance.command().executable,
            PathBuf::from("/opt/helper/2.0.0/helper")
        );
        assert_eq!(launcher.launches.load(Ordering::SeqCst), 1);
    }
}
