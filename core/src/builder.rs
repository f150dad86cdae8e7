//! Ordered scene setup
//!
//! [`SceneBuilder::build`] runs the setup sequence against a fresh
//! [`AcousticContext`]: debug registration, system, scene, voxel grid,
//! geometry ingestion, voxel fill and the optional debug view. A failed
//! system, scene or voxel grid stops the sequence; later stages are never
//! attempted. Skipped or failed meshes are reported but never stop it.

use nether_acoustics_shared::NativeError;

use crate::config::{ConfigError, SceneConfig};
use crate::context::{AcousticContext, VoxelGridDescriptor};
use crate::engine::PropagationEngine;
use crate::marshal::{AcousticGeometry, IngestReport};

/// Setup stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStage {
    DebugCallback,
    System,
    Scene,
    VoxelGrid,
    Geometry,
    FillVoxels,
    DebugView,
}

impl std::fmt::Display for SetupStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::DebugCallback => "debug callback",
            Self::System => "system",
            Self::Scene => "scene",
            Self::VoxelGrid => "voxel grid",
            Self::Geometry => "geometry",
            Self::FillVoxels => "voxel fill",
            Self::DebugView => "debug view",
        };
        f.write_str(name)
    }
}

/// The stage that stopped setup and its error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetupFailure {
    pub stage: SetupStage,
    pub error: NativeError,
}

/// What [`SceneBuilder::build`] did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SetupReport {
    /// Stages that ran to completion
    pub completed: Vec<SetupStage>,
    /// Set when a stage stopped the sequence
    pub failure: Option<SetupFailure>,
    pub ingest: IngestReport,
    /// Whether the debug view opened; `None` when it was not requested
    pub debug_view: Option<bool>,
}

impl SetupReport {
    /// Every mandatory stage completed
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }

    pub fn reached(&self, stage: SetupStage) -> bool {
        self.completed.contains(&stage)
    }

    fn fail(&mut self, stage: SetupStage, error: NativeError) {
        tracing::error!(%stage, "Scene setup stopped: {}", error);
        self.failure = Some(SetupFailure { stage, error });
    }
}

/// Builds a ready-to-simulate scene from host geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneBuilder {
    grid: VoxelGridDescriptor,
    debug_view: bool,
}

impl SceneBuilder {
    pub fn new(grid: VoxelGridDescriptor) -> Self {
        Self {
            grid,
            debug_view: false,
        }
    }

    pub fn from_config(config: &SceneConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(config.voxel_grid()?).with_debug_view(config.debug_view))
    }

    /// Request the engine's visualization once the grid is filled
    pub fn with_debug_view(mut self, enabled: bool) -> Self {
        self.debug_view = enabled;
        self
    }

    pub fn grid(&self) -> &VoxelGridDescriptor {
        &self.grid
    }

    /// Run setup. The context is returned even when setup stops early so
    /// the caller owns (and eventually releases) whatever was created.
    pub fn build<'a, E, I>(&self, engine: E, objects: I) -> (AcousticContext<E>, SetupReport)
    where
        E: PropagationEngine,
        I: IntoIterator<Item = &'a AcousticGeometry>,
    {
        let mut context = AcousticContext::new(engine);
        let report = self.build_into(&mut context, objects);
        (context, report)
    }

    /// Run setup against an existing, still empty context
    pub fn build_into<'a, E, I>(&self, context: &mut AcousticContext<E>, objects: I) -> SetupReport
    where
        E: PropagationEngine,
        I: IntoIterator<Item = &'a AcousticGeometry>,
    {
        let mut report = SetupReport::default();

        // Log routing is best-effort; setup continues without it
        match context.register_debug_callback() {
            Ok(()) => report.completed.push(SetupStage::DebugCallback),
            Err(error) => tracing::warn!("Continuing without native log routing: {}", error),
        }

        if let Err(error) = context.create_system() {
            report.fail(SetupStage::System, error);
            return report;
        }
        report.completed.push(SetupStage::System);

        if let Err(error) = context.create_scene() {
            report.fail(SetupStage::Scene, error);
            return report;
        }
        report.completed.push(SetupStage::Scene);

        if let Err(error) = context.create_voxels(self.grid) {
            report.fail(SetupStage::VoxelGrid, error);
            return report;
        }
        report.completed.push(SetupStage::VoxelGrid);

        report.ingest = context.add_geometry_batch(objects);
        report.completed.push(SetupStage::Geometry);
        tracing::info!(
            ingested = report.ingest.records.len(),
            skipped = report.ingest.skipped.len(),
            failed = report.ingest.failed.len(),
            "Acoustic geometry ingested"
        );

        if let Err(error) = context.fill_voxels() {
            report.fail(SetupStage::FillVoxels, error);
            return report;
        }
        report.completed.push(SetupStage::FillVoxels);

        if self.debug_view {
            let opened = context.open_debug_view();
            report.debug_view = Some(opened);
            if opened {
                report.completed.push(SetupStage::DebugView);
            }
        }

        report
    }
}
