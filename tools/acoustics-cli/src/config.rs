//! Config command - print the effective configuration

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use nether_acoustics::AcousticsConfig;
use nether_acoustics::config::{self, CONFIG_FILE_NAME};

/// Arguments for the config command
#[derive(Args)]
pub struct ConfigArgs {
    /// Config file to load (default: acoustics.toml in the platform config directory)
    #[arg(long)]
    pub path: Option<PathBuf>,
}

/// Execute the config command
pub fn execute(args: ConfigArgs) -> Result<()> {
    let config = load_config(args.path.as_deref())?;
    match &args.path {
        Some(path) => println!("# Loaded from {}", path.display()),
        None => match config::config_dir() {
            Some(dir) => println!("# Config file: {}", dir.join(CONFIG_FILE_NAME).display()),
            None => println!("# No config directory on this platform; using defaults"),
        },
    }
    print!("{}", config.to_toml_string()?);
    Ok(())
}

/// Explicit paths must load cleanly; the platform default falls back to defaults
pub fn load_config(path: Option<&Path>) -> Result<AcousticsConfig> {
    match path {
        Some(path) => AcousticsConfig::load_from(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(config::load()),
    }
}
