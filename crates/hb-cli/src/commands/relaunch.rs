//! Relaunch command implementation

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use crate::output::{print_info, print_success, print_warning};
use hb_bridge::{restart_pending, ProcessSpawner, RelaunchCoordinator, RelaunchOutcome};
use hb_core::config::ConfigFile;
use hb_core::{PackageTable, TracingLogger};

/// Execute the relaunch command
///
/// Hands over to the setup helper and reports how the handshake ended. Only
/// a spawn problem or a busy setup package is surfaced as a warning; neither
/// is an error for the caller.
pub async fn relaunch_command(
    config: &ConfigFile,
    logger: &TracingLogger,
    pid: Option<u32>,
) -> Result<()> {
    let relaunch = &config.relaunch;
    let registry = Arc::new(PackageTable::from_config(&config.packages));

    if let Some(pending) = restart_pending(registry.as_ref(), &relaunch.app_name) {
        print_info(&format!(
            "{} {} is waiting for a restart",
            relaunch.app_name,
            pending.available_version.as_deref().unwrap_or("update")
        ));
    }

    let shutdown = CancellationToken::new();
    let mut coordinator = RelaunchCoordinator::new(
        relaunch.clone(),
        registry,
        Arc::new(ProcessSpawner),
        Arc::new(logger.child("relaunch")),
        shutdown.clone(),
    );
    if let Some(pid) = pid {
        coordinator = coordinator.with_host_pid(pid);
    }

    print_info(&format!(
        "Waiting for {} (log: {})",
        relaunch.package,
        relaunch.log_path.display()
    ));

    match coordinator.run().await {
        RelaunchOutcome::Ready { attempts } => {
            print_success(&format!(
                "{} is ready to relaunch (after {} checks)",
                relaunch.package, attempts
            ));
            if shutdown.is_cancelled() {
                print_info("Host may exit now");
            }
        }
        RelaunchOutcome::TimedOut { attempts } => {
            print_warning(&format!(
                "{} did not signal readiness after {} checks",
                relaunch.package, attempts
            ));
        }
        RelaunchOutcome::Aborted(reason) => {
            print_warning(&format!("Relaunch aborted: {}", reason));
        }
    }

    Ok(())
}
