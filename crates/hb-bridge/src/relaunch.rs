//! Relaunch handshake with the setup helper
//!
//! The host starts the setup helper detached, pointing its stdout and stderr
//! at a shared log file, then polls that file until the helper writes a
//! `ready-to-relaunch` line. At that point the host's shutdown token fires
//! and the setup helper takes over.
//!
//! The coordinator never returns an error. Every problem is logged and the
//! terminal state says how far the handshake got.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use hb_core::config::RelaunchConfig;
use hb_core::{Logger, PackageRegistry, PackageStage, PackageState};
use hb_protocol::find_ready_message;

/// Executable and arguments for the setup helper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaunchCommand {
    pub executable: PathBuf,
    pub args: Vec<String>,
}

/// Starts a process the host will never wait on
pub trait DetachedSpawner: Send + Sync {
    /// Spawn `command`, sending its output to the given files (or nowhere)
    fn spawn_detached(
        &self,
        command: &RelaunchCommand,
        stdout: Option<File>,
        stderr: Option<File>,
    ) -> io::Result<()>;
}

/// [`DetachedSpawner`] backed by the OS process API
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessSpawner;

impl DetachedSpawner for ProcessSpawner {
    fn spawn_detached(
        &self,
        command: &RelaunchCommand,
        stdout: Option<File>,
        stderr: Option<File>,
    ) -> io::Result<()> {
        let mut cmd = Command::new(&command.executable);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(stdout.map_or_else(Stdio::null, Stdio::from))
            .stderr(stderr.map_or_else(Stdio::null, Stdio::from));

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const DETACHED_PROCESS: u32 = 0x0000_0008;
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;
            cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
        }

        let child = cmd.spawn()?;
        tracing::debug!(pid = child.id(), "Setup helper spawned");
        Ok(())
    }
}

/// Why the handshake gave up before polling
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    NotRegistered,
    NotIdle(PackageStage),
    NoPrefix,
    SpawnFailed(String),
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AbortReason::NotRegistered => write!(f, "setup package is not registered"),
            AbortReason::NotIdle(stage) => write!(f, "setup package is busy ({})", stage),
            AbortReason::NoPrefix => write!(f, "setup package has no version prefix"),
            AbortReason::SpawnFailed(e) => write!(f, "could not start setup helper: {}", e),
        }
    }
}

/// Handshake progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelaunchState {
    IdleCheck,
    Spawning { prefix: PathBuf },
    /// `attempt` reads have been made so far
    Polling { attempt: u32 },
    Ready { attempts: u32 },
    TimedOut { attempts: u32 },
    Aborted(AbortReason),
}

impl RelaunchState {
    pub fn outcome(&self) -> Option<RelaunchOutcome> {
        match self {
            RelaunchState::Ready { attempts } => Some(RelaunchOutcome::Ready {
                attempts: *attempts,
            }),
            RelaunchState::TimedOut { attempts } => Some(RelaunchOutcome::TimedOut {
                attempts: *attempts,
            }),
            RelaunchState::Aborted(reason) => Some(RelaunchOutcome::Aborted(reason.clone())),
            RelaunchState::IdleCheck
            | RelaunchState::Spawning { .. }
            | RelaunchState::Polling { .. } => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome().is_some()
    }
}

/// How a handshake ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelaunchOutcome {
    /// The setup helper is ready and shutdown was requested
    Ready { attempts: u32 },
    /// The sentinel never showed up
    TimedOut { attempts: u32 },
    Aborted(AbortReason),
}

/// Drives one relaunch handshake
pub struct RelaunchCoordinator {
    config: RelaunchConfig,
    registry: Arc<dyn PackageRegistry>,
    spawner: Arc<dyn DetachedSpawner>,
    logger: Arc<dyn Logger>,
    shutdown: CancellationToken,
    host_pid: u32,
    state: RelaunchState,
}

impl RelaunchCoordinator {
    pub fn new(
        config: RelaunchConfig,
        registry: Arc<dyn PackageRegistry>,
        spawner: Arc<dyn DetachedSpawner>,
        logger: Arc<dyn Logger>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            registry,
            spawner,
            logger,
            shutdown,
            host_pid: std::process::id(),
            state: RelaunchState::IdleCheck,
        }
    }

    /// Pid passed to the setup helper, defaults to this process
    pub fn with_host_pid(mut self, pid: u32) -> Self {
        self.host_pid = pid;
        self
    }

    pub fn state(&self) -> &RelaunchState {
        &self.state
    }

    /// Command that starts the setup helper installed under `prefix`
    pub fn command_for(&self, prefix: &Path) -> RelaunchCommand {
        let executable = format!("{}{}", self.config.package, std::env::consts::EXE_SUFFIX);
        RelaunchCommand {
            executable: prefix.join(executable),
            args: vec![
                "--appname".to_string(),
                self.config.app_name.clone(),
                "--relaunch".to_string(),
                "--relaunch-pid".to_string(),
                self.host_pid.to_string(),
            ],
        }
    }

    /// Run the handshake to completion
    pub async fn run(mut self) -> RelaunchOutcome {
        loop {
            if let Some(outcome) = self.state.outcome() {
                return outcome;
            }
            self.step().await;
        }
    }

    /// Advance by one transition; terminal states stay put
    pub async fn step(&mut self) {
        let next = match &self.state {
            RelaunchState::IdleCheck => self.check_idle(),
            RelaunchState::Spawning { prefix } => {
                let prefix = prefix.clone();
                self.spawn(&prefix)
            }
            RelaunchState::Polling { attempt } => {
                let attempt = *attempt;
                self.poll(attempt).await
            }
            RelaunchState::Ready { .. }
            | RelaunchState::TimedOut { .. }
            | RelaunchState::Aborted(_) => return,
        };

        tracing::debug!(from = ?self.state, to = ?next, "Relaunch transition");
        self.state = next;
    }

    fn check_idle(&self) -> RelaunchState {
        let package = &self.config.package;
        let Some(state) = self.registry.package(package) else {
            self.logger
                .warn(&format!("Package '{}' is not registered, not relaunching", package));
            return RelaunchState::Aborted(AbortReason::NotRegistered);
        };

        if state.stage != PackageStage::Idle {
            self.logger.warn(&format!(
                "Wanted {} stage idle but got '{}', not relaunching",
                package, state.stage
            ));
            return RelaunchState::Aborted(AbortReason::NotIdle(state.stage));
        }

        match state.version_prefix {
            Some(prefix) => RelaunchState::Spawning { prefix },
            None => {
                self.logger
                    .warn(&format!("No prefix for {}, not relaunching", package));
                RelaunchState::Aborted(AbortReason::NoPrefix)
            }
        }
    }

    fn spawn(&self, prefix: &Path) -> RelaunchState {
        let command = self.command_for(prefix);
        let (stdout, stderr) = match self.open_log() {
            Ok((out, err)) => (Some(out), Some(err)),
            Err(e) => {
                self.logger
                    .warn(&format!("Could not set up stdout/stderr for relaunch: {}", e));
                (None, None)
            }
        };

        self.logger.info(&format!(
            "Starting {} {}",
            command.executable.display(),
            command.args.join(" ")
        ));
        if let Err(e) = self.spawner.spawn_detached(&command, stdout, stderr) {
            self.logger
                .warn(&format!("Could not start {}: {}", self.config.package, e));
            return RelaunchState::Aborted(AbortReason::SpawnFailed(e.to_string()));
        }

        if self.config.attempts == 0 {
            return RelaunchState::TimedOut { attempts: 0 };
        }
        RelaunchState::Polling { attempt: 0 }
    }

    /// Truncate the shared log and open one append handle per stream
    fn open_log(&self) -> io::Result<(File, File)> {
        let path = &self.config.log_path;
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let open = || OpenOptions::new().create(true).append(true).open(path);
        Ok((open()?, open()?))
    }

    async fn poll(&self, attempt: u32) -> RelaunchState {
        let attempts = attempt + 1;
        let path = &self.config.log_path;

        match tokio::fs::read(path).await {
            Ok(bytes) => {
                if find_ready_message(&String::from_utf8_lossy(&bytes)).is_some() {
                    self.logger.info(&format!(
                        "{} is ready to relaunch!",
                        self.config.package
                    ));
                    self.shutdown.cancel();
                    return RelaunchState::Ready { attempts };
                }
            }
            Err(e) => {
                self.logger.warn(&format!(
                    "While polling {} log (attempt {}): {}",
                    self.config.package, attempts, e
                ));
            }
        }

        if attempts >= self.config.attempts {
            self.logger.warn(&format!(
                "{} did not signal readiness after {} attempts",
                self.config.package, attempts
            ));
            return RelaunchState::TimedOut { attempts };
        }

        tokio::time::sleep(self.config.poll_interval).await;
        RelaunchState::Polling { attempt: attempts }
    }
}

/// State of the host's own package when it is waiting for a restart
///
/// Hosts use this to offer a restart to the user before starting a
/// [`RelaunchCoordinator`].
pub fn restart_pending(registry: &dyn PackageRegistry, app_name: &str) -> Option<PackageState> {
    registry
        .package(app_name)
        .filter(|state| state.stage == PackageStage::NeedRestart)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hb_core::PackageTable;

    struct NullLogger;

    impl Logger for NullLogger {
        fn debug(&self, _: &str) {}
        fn info(&self, _: &str) {}
        fn warn(&self, _: &str) {}
        fn error(&self, _: &str) {}
    }

    fn coordinator(table: PackageTable) -> RelaunchCoordinator {
        RelaunchCoordinator::new(
            RelaunchConfig {
                package: "setup".into(),
                app_name: "host-app".into(),
                ..RelaunchConfig::default()
            },
            Arc::new(table),
            Arc::new(ProcessSpawner),
            Arc::new(NullLogger),
            CancellationToken::new(),
        )
        .with_host_pid(4242)
    }

    #[test]
    fn test_relaunch_arguments() {
        let coordinator = coordinator(PackageTable::new());
        let command = coordinator.command_for(Path::new("/opt/setup/1.0.0"));
        assert_eq!(
            command.executable,
            PathBuf::from(format!("/opt/setup/1.0.0/setup{}", std::env::consts::EXE_SUFFIX))
        );
        assert_eq!(
            command.args,
            vec!["--appname", "host-app", "--relaunch", "--relaunch-pid", "4242"]
        );
    }

    #[tokio::test]
    async fn test_terminal_state_is_sticky() {
        let mut coordinator = coordinator(PackageTable::new());
        coordinator.step().await;
        assert_eq!(
            coordinator.state(),
            &RelaunchState::Aborted(AbortReason::NotRegistered)
        );
        coordinator.step().await;
        assert!(coordinator.state().is_terminal());
    }

    #[test]
    fn test_restart_pending_only_for_need_restart() {
        let table = PackageTable::new();
        assert!(restart_pending(&table, "host-app").is_none());

        table.insert("host-app", PackageState::default());
        assert!(restart_pending(&table, "host-app").is_none());

        table.insert(
            "host-app",
            PackageState {
                stage: PackageStage::NeedRestart,
                version_prefix: None,
                available_version: Some("2.1.0".into()),
            },
        );
        let pending = restart_pending(&table, "host-app").unwrap();
        assert_eq!(pending.available_version.as_deref(), Some("2.1.0"));
    }
}
