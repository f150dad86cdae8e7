//! Nether Acoustics CLI - headless driver for the acoustics runtime
//!
//! # Commands
//!
//! - `nether-acoustics config` - Print the effective configuration
//! - `nether-acoustics inspect-ir` - Decode an impulse response WAV
//! - `nether-acoustics bake` - Build a scene against the native engine
//! - `nether-acoustics probe` - Run the occlusion loop for fixed positions
//!
//! `bake` and `probe` need the `native` feature (links `OpenPL`).
//! Log verbosity follows `RUST_LOG`, defaulting to `info`.

mod bake;
mod config;
mod inspect;
mod manifest;
mod probe;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Nether Acoustics - headless driver for the acoustics runtime
#[derive(Parser)]
#[command(name = "nether-acoustics")]
#[command(about = "Bake and probe acoustic scenes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, validate and print the effective configuration
    Config(config::ConfigArgs),

    /// Decode an impulse response and print its properties
    InspectIr(inspect::InspectArgs),

    /// Build a scene from a manifest and report voxel statistics
    Bake(bake::BakeArgs),

    /// Run the occlusion loop against static positions
    Probe(probe::ProbeArgs),
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config(args) => config::execute(args),
        Commands::InspectIr(args) => inspect::execute(args),
        Commands::Bake(args) => bake::execute(args),
        Commands::Probe(args) => probe::execute(args),
    }
}
