//! Inspect-ir command - decode an impulse response WAV

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use nether_acoustics::ImpulseResponse;

/// Arguments for the inspect-ir command
#[derive(Args)]
pub struct InspectArgs {
    /// Impulse response file (.wav)
    pub wav: PathBuf,
}

/// Execute the inspect-ir command
pub fn execute(args: InspectArgs) -> Result<()> {
    let response = ImpulseResponse::from_wav_path(&args.wav)
        .with_context(|| format!("Failed to decode impulse response: {}", args.wav.display()))?;
    let payload = response
        .parameter_data()
        .context("Failed to encode convolution payload")?;

    println!("=== Impulse Response ===");
    println!("  File:        {}", args.wav.display());
    println!("  Channels:    {}", response.channels());
    println!("  Sample rate: {} Hz", response.sample_rate());
    println!("  Frames:      {}", response.frames());
    println!("  Duration:    {:.3} s", response.duration().as_secs_f64());
    println!("  Peak:        {:.4}", response.peak());
    println!("  Payload:     {} bytes", payload.len());
    Ok(())
}
