//! Output formatting utilities for the CLI
//!
//! Tables for package state, human-readable durations, and colored status
//! lines.

use std::time::{Duration, SystemTime};

use tabled::{settings::Style, Table, Tabled};

use hb_core::PackageState;

/// Format registered packages as an ASCII table, sorted by name
pub fn format_packages<'a, I>(packages: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a PackageState)>,
{
    #[derive(Tabled)]
    struct PackageRow {
        #[tabled(rename = "PACKAGE")]
        name: String,
        #[tabled(rename = "STAGE")]
        stage: String,
        #[tabled(rename = "PREFIX")]
        prefix: String,
        #[tabled(rename = "AVAILABLE")]
        available: String,
    }

    let mut rows: Vec<PackageRow> = packages
        .into_iter()
        .map(|(name, state)| PackageRow {
            name: name.clone(),
            stage: state.stage.to_string(),
            prefix: state
                .version_prefix
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string()),
            available: state
                .available_version
                .clone()
                .unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    if rows.is_empty() {
        return "No packages registered".to_string();
    }
    rows.sort_by(|a, b| a.name.cmp(&b.name));

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Time until `when`, or "now" when it has passed
pub fn format_until(when: SystemTime, now: SystemTime) -> String {
    match when.duration_since(now) {
        Ok(d) if !d.is_zero() => format!("in {}", format_duration(d)),
        _ => "now".to_string(),
    }
}

/// Format duration in human-readable form
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix, to stderr
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow, to stderr
pub fn print_warning(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan
pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}
