//! Probe command - run the occlusion loop for fixed positions
//!
//! Bakes the scene, then ticks the simulation loop with a static listener
//! and emitter, logging every normalized occlusion value.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use glam::Vec3;

/// Arguments for the probe command
#[derive(Args)]
pub struct ProbeArgs {
    /// Scene manifest (.toml) listing the acoustic geometry
    pub scene: PathBuf,

    /// Listener position as X,Y,Z
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    pub listener: Vec3,

    /// Emitter position as X,Y,Z
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    pub emitter: Vec3,

    /// Number of ticks to run
    #[arg(long, default_value_t = 10)]
    pub ticks: u64,

    /// Config file (default: acoustics.toml in the platform config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Execute the probe command
#[cfg(feature = "native")]
pub fn execute(args: ProbeArgs) -> Result<()> {
    use anyhow::Context;
    use nether_acoustics::{SimulationLoop, SimulationSettings, StaticPosition, TracingSink};

    let config = crate::config::load_config(args.config.as_deref())?;
    let (context, report) =
        crate::bake::build_scene(&args.scene, &config, nether_acoustics::ffi::LinkedEngine)?;
    crate::bake::print_setup(&report);

    context
        .set_listener_position(args.listener)
        .context("Failed to set listener position")?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("Failed to start the probe runtime")?;
    let simulation = SimulationLoop::new(SimulationSettings::from(&config.simulation))
        .with_tick_limit(args.ticks);
    let report = runtime.block_on(simulation.run(
        &context,
        &TracingSink,
        &StaticPosition(args.listener),
        &StaticPosition(args.emitter),
    ));

    println!(
        "  Ticks:    {} ({} forwarded, {} failed)",
        report.ticks, report.forwarded, report.failed
    );
    if let Some(value) = report.last_value {
        println!("  {}: {:.4}", config.simulation.parameter_name, value);
    }
    Ok(())
}

#[cfg(not(feature = "native"))]
pub fn execute(args: ProbeArgs) -> Result<()> {
    bail!(
        "Cannot probe {}: no native engine linked (rebuild with `--features native`)",
        args.scene.display()
    )
}

/// Parse `X,Y,Z`
pub fn parse_vec3(value: &str) -> Result<Vec3> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<Vec<_>, _>>()?;
    let [x, y, z] = parts[..] else {
        bail!("expected three comma-separated numbers, got {value:?}");
    };
    Ok(Vec3::new(x, y, z))
}
