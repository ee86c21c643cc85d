//! helper-bridge CLI
//!
//! Thin front end over the bridge library:
//! - one-shot JSON-RPC calls against a freshly started helper
//! - the helper version probe
//! - the relaunch handshake with the setup helper
//! - status and configuration inspection

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hb_core::TracingLogger;
use helper_bridge::commands;

#[derive(Parser)]
#[command(name = "helper-bridge")]
#[command(author, version, about = "Call a supervised helper process over JSON-RPC")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, env = "HELPER_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Call a helper method and print the JSON result
    Call {
        /// Method name, e.g. "Fetch.Caves"
        method: String,
        /// Params as a JSON value (defaults to {})
        params: Option<String>,
    },

    /// Ask the helper for its version
    Version,

    /// Hand over to the setup helper and wait until it is ready
    Relaunch {
        /// Pid the setup helper waits on (defaults to this process)
        #[arg(long)]
        pid: Option<u32>,
    },

    /// Show package state, pending restarts and the update schedule
    Status {
        /// Show helper and relaunch settings too
        #[arg(short, long)]
        detailed: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Show config file path
    Path,
    /// Write the default configuration
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let logger = TracingLogger::new("helper-bridge");
    let verbose = cli.verbose > 0;
    let config_path = cli.config.as_ref();

    match cli.command {
        Commands::Call { method, params } => {
            let config = commands::load_config(config_path)?;
            commands::call_command(&config, &logger, &method, params.as_deref(), verbose).await?;
        }

        Commands::Version => {
            let config = commands::load_config(config_path)?;
            commands::version_command(&config, &logger, verbose).await?;
        }

        Commands::Relaunch { pid } => {
            let config = commands::load_config(config_path)?;
            commands::relaunch_command(&config, &logger, pid).await?;
        }

        Commands::Status { detailed } => {
            let config = commands::load_config(config_path)?;
            commands::status_command(&config, detailed)?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_show(config_path)?,
            ConfigAction::Path => commands::config_path(config_path)?,
            ConfigAction::Init { force } => commands::config_init(config_path, force)?,
        },
    }

    Ok(())
}
