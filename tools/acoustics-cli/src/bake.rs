//! Bake command - build a scene and report voxel statistics

use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::Args;
use nether_acoustics::{
    AcousticContext, AcousticsConfig, PropagationEngine, SceneBuilder, SetupReport,
};

use crate::manifest::SceneManifest;

/// Arguments for the bake command
#[derive(Args)]
pub struct BakeArgs {
    /// Scene manifest (.toml) listing the acoustic geometry
    pub scene: PathBuf,

    /// Config file (default: acoustics.toml in the platform config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// Execute the bake command
#[cfg(feature = "native")]
pub fn execute(args: BakeArgs) -> Result<()> {
    use anyhow::Context;

    let config = crate::config::load_config(args.config.as_deref())?;
    let (context, report) =
        build_scene(&args.scene, &config, nether_acoustics::ffi::LinkedEngine)?;

    println!("=== Bake ===");
    println!("  Scene:    {}", args.scene.display());
    print_setup(&report);

    let voxels = context
        .voxels()
        .context("Failed to read back the voxel grid")?;
    let solid = voxels.iter().filter(|voxel| voxel.is_solid()).count();
    println!("  Voxels:   {} ({} solid)", voxels.len(), solid);
    Ok(())
}

#[cfg(not(feature = "native"))]
pub fn execute(args: BakeArgs) -> Result<()> {
    bail!(
        "Cannot bake {}: no native engine linked (rebuild with `--features native`)",
        args.scene.display()
    )
}

/// Load a manifest and run setup, failing if setup stopped early
#[cfg_attr(not(feature = "native"), allow(dead_code))]
pub fn build_scene<E: PropagationEngine>(
    scene: &Path,
    config: &AcousticsConfig,
    engine: E,
) -> Result<(AcousticContext<E>, SetupReport)> {
    let manifest = SceneManifest::load(scene)?;
    let geometry = manifest.geometry()?;
    let builder = SceneBuilder::from_config(&config.scene)?;

    let (context, report) = builder.build(engine, &geometry);
    if let Some(failure) = report.failure {
        bail!("Scene setup stopped at {}: {}", failure.stage, failure.error);
    }
    Ok((context, report))
}

#[cfg_attr(not(feature = "native"), allow(dead_code))]
pub fn print_setup(report: &SetupReport) {
    println!("  Meshes:   {} ingested", report.ingest.records.len());
    for (name, reason) in &report.ingest.skipped {
        println!("    skipped {name}: {reason}");
    }
    for (name, error) in &report.ingest.failed {
        println!("    failed  {name}: {error}");
    }
    if let Some(opened) = report.debug_view {
        println!(
            "  Debug view: {}",
            if opened { "opened" } else { "unavailable" }
        );
    }
}
