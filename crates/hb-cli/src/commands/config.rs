//! Config command implementations

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::output::{print_error, print_info, print_success, print_warning};
use hb_core::config::{self, ConfigFile};

fn resolve(config_path: Option<&PathBuf>) -> PathBuf {
    config_path
        .cloned()
        .unwrap_or_else(config::default_config_path)
}

/// Show the effective configuration, defaults included
pub fn config_show(config_path: Option<&PathBuf>) -> Result<()> {
    let path = resolve(config_path);

    if path.exists() {
        print_info(&format!("Configuration file: {:?}", path));
    } else {
        print_warning(&format!("No configuration file found at {:?}", path));
        print_info("Showing defaults. Run 'helper-bridge config init' to create one");
    }
    println!();

    let effective = if path.exists() {
        super::load_config(Some(&path))?
    } else {
        ConfigFile::default()
    };
    println!("{}", toml::to_string_pretty(&effective)?);

    Ok(())
}

/// Print the config file location
pub fn config_path(config_path: Option<&PathBuf>) -> Result<()> {
    println!("{}", resolve(config_path).display());
    Ok(())
}

/// Write the default configuration
pub fn config_init(config_path: Option<&PathBuf>, force: bool) -> Result<()> {
    let path = resolve(config_path);

    if path.exists() && !force {
        print_error(&format!("Config file already exists: {:?}", path));
        print_info("Use --force to overwrite");
        return Ok(());
    }

    config::save_config(&path, &ConfigFile::default())
        .with_context(|| format!("Failed to write config file: {:?}", path))?;
    print_success(&format!("Created configuration file: {:?}", path));

    Ok(())
}
