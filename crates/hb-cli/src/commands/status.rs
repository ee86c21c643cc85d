//! Status command implementation

use std::time::SystemTime;

use anyhow::Result;

use crate::output::{format_duration, format_packages, format_until, print_info, print_warning};
use hb_bridge::restart_pending;
use hb_core::config::{ConfigFile, UpdateConfig};
use hb_core::schedule::UpdateSchedule;
use hb_core::{PackageRegistry, PackageStage, PackageTable};

/// Execute the status command
///
/// Shows package state as configured, whether the host is waiting for a
/// restart, and when the next component update check would run.
pub fn status_command(config: &ConfigFile, detailed: bool) -> Result<()> {
    let registry = PackageTable::from_config(&config.packages);

    println!("{}", format_packages(&config.packages));
    println!();

    match registry.package(&config.helper.package) {
        Some(state) if state.version_prefix.is_some() => {
            print_info(&format!("Helper package '{}' is installed", config.helper.package));
        }
        Some(_) => print_warning(&format!(
            "Helper package '{}' has no version prefix",
            config.helper.package
        )),
        None => print_warning(&format!(
            "Helper package '{}' is not registered",
            config.helper.package
        )),
    }

    if let Some(pending) = restart_pending(&registry, &config.relaunch.app_name) {
        print_info(&format!(
            "{} {} is waiting for a restart",
            config.relaunch.app_name,
            pending.available_version.as_deref().unwrap_or("update")
        ));
    }

    let setup_done = registry
        .package(&config.helper.package)
        .map(|state| state.stage == PackageStage::Idle && state.version_prefix.is_some())
        .unwrap_or(false);
    print_info(&describe_update_checks(
        &config.updates,
        setup_done,
        SystemTime::now(),
    ));

    if detailed {
        println!();
        println!("Helper executable: {}", config.helper.executable);
        println!("Helper database:   {}", config.helper.db_path.display());
        println!("Service address:   {}", config.helper.service_address);
        println!("Relaunch log:      {}", config.relaunch.log_path.display());
        println!(
            "Relaunch polling:  {} attempts every {:?}",
            config.relaunch.attempts, config.relaunch.poll_interval
        );
    }

    Ok(())
}

/// When the next component update checks would run if the host started now
///
/// The first check runs as soon as setup is done; every later one is pushed
/// out by the interval plus a random delay.
fn describe_update_checks(updates: &UpdateConfig, setup_done: bool, now: SystemTime) -> String {
    let mut schedule = UpdateSchedule::new(updates, now);
    if !schedule.is_due(setup_done, now) {
        return format!(
            "Component update checks start after the helper is installed, then every {} (+ up to {})",
            format_duration(updates.interval),
            format_duration(updates.wiggle)
        );
    }

    let following = schedule.reschedule(now);
    format!(
        "Component update check: due now, next one {} (every {} + up to {})",
        format_until(following, now),
        format_duration(updates.interval),
        format_duration(updates.wiggle)
    )
}
