//! Explicit owner of one engine instance and its resources
//!
//! [`AcousticContext`] holds the engine, the debug registration, the
//! system/scene handle pair, the voxel grid and every mesh it ingested. All
//! orchestration goes through it; nothing is reachable from a global.
//!
//! Ordering rules are checked here before the engine is called: a scene
//! needs a bound system, a voxel grid needs a bound scene, and geometry
//! ingestion and voxel fill need a voxel grid. A violated rule reports
//! `ERR_INVALID_PARAM` without reaching the engine.

use glam::Vec3;
use nether_acoustics_shared::{NativeError, NativeResult, PlVector, RawHandle};

use crate::debug::DebugRegistration;
use crate::engine::PropagationEngine;
use crate::error::CheckResult;
use crate::handle::{ReleaseStatus, SceneHandle, SystemHandle};
use crate::marshal::{AcousticGeometry, GeometryMarshaler, IngestError, IngestReport, MeshRecord};

/// Voxel grid allocation parameters. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelGridDescriptor {
    extent: Vec3,
    cell_size: f32,
}

impl VoxelGridDescriptor {
    /// Grid covering `extent` (full size along each axis) with cubic cells
    pub fn new(extent: Vec3, cell_size: f32) -> NativeResult<Self> {
        let valid_extent = extent.is_finite() && extent.min_element() > 0.0;
        let valid_cell = cell_size.is_finite() && cell_size > 0.0;
        if !valid_extent || !valid_cell {
            tracing::error!(?extent, cell_size, "Invalid voxel grid dimensions");
            return Err(NativeError::InvalidParam);
        }
        Ok(Self { extent, cell_size })
    }

    pub fn extent(&self) -> Vec3 {
        self.extent
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Cells along each axis, rounding partial cells up
    pub fn cells_per_axis(&self) -> [u32; 3] {
        let cells = (self.extent / self.cell_size).ceil();
        [cells.x as u32, cells.y as u32, cells.z as u32]
    }
}

/// One voxel as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelSample {
    pub location: Vec3,
    pub absorptivity: f32,
}

impl VoxelSample {
    /// Voxel touched by geometry
    pub fn is_solid(&self) -> bool {
        self.absorptivity > 0.0
    }
}

/// Resources released by [`AcousticContext::shutdown`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    pub scene: ReleaseStatus,
    pub system: ReleaseStatus,
}

/// Context object holding one engine instance and its resources
pub struct AcousticContext<E: PropagationEngine> {
    engine: E,
    debug: DebugRegistration,
    system: SystemHandle,
    scene: SceneHandle,
    voxel_grid: Option<VoxelGridDescriptor>,
    meshes: Vec<MeshRecord>,
    marshaler: GeometryMarshaler,
}

impl<E: PropagationEngine> AcousticContext<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            debug: DebugRegistration::default(),
            system: SystemHandle::new(),
            scene: SceneHandle::new(),
            voxel_grid: None,
            meshes: Vec::new(),
            marshaler: GeometryMarshaler::new(),
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn system(&self) -> &SystemHandle {
        &self.system
    }

    pub fn scene(&self) -> &SceneHandle {
        &self.scene
    }

    pub fn voxel_grid(&self) -> Option<&VoxelGridDescriptor> {
        self.voxel_grid.as_ref()
    }

    /// Meshes ingested and not yet removed
    pub fn meshes(&self) -> &[MeshRecord] {
        &self.meshes
    }

    pub fn marshaler(&self) -> &GeometryMarshaler {
        &self.marshaler
    }

    /// Scene bound and voxel grid created: ready to simulate
    pub fn is_ready(&self) -> bool {
        self.system.has_handle() && self.scene.has_handle() && self.voxel_grid.is_some()
    }

    pub fn register_debug_callback(&mut self) -> NativeResult<()> {
        self.debug.register(&self.engine)
    }

    pub fn create_system(&mut self) -> NativeResult<()> {
        self.system.create(&self.engine).checked("System.Create")
    }

    pub fn create_scene(&mut self) -> NativeResult<()> {
        self.scene
            .create(&self.engine, &self.system)
            .checked("System.CreateScene")
    }

    pub fn create_voxels(&mut self, grid: VoxelGridDescriptor) -> NativeResult<()> {
        if self.voxel_grid.is_some() {
            tracing::error!("Voxel grid already created for this scene");
            return Err(NativeError::InvalidParam).checked("Scene.CreateVoxels");
        }
        let scene = self.bound_scene("Scene.CreateVoxels")?;
        self.engine
            .scene_create_voxels(scene, PlVector::from(grid.extent), grid.cell_size)
            .into_result()
            .checked("Scene.CreateVoxels")?;
        let [x, y, z] = grid.cells_per_axis();
        tracing::info!(
            extent = ?grid.extent,
            cell_size = grid.cell_size,
            "Voxel grid created ({}x{}x{} cells)",
            x,
            y,
            z
        );
        self.voxel_grid = Some(grid);
        Ok(())
    }

    /// Ingest one acoustic object
    pub fn add_geometry(&mut self, object: &AcousticGeometry) -> Result<MeshRecord, IngestError> {
        self.require_voxel_grid("Scene.AddMesh")?;
        let record = self.marshaler.ingest(&self.engine, &self.scene, object)?;
        self.meshes.push(record);
        Ok(record)
    }

    /// Ingest a batch; skips and failures are reported, never fatal
    pub fn add_geometry_batch<'a, I>(&mut self, objects: I) -> IngestReport
    where
        I: IntoIterator<Item = &'a AcousticGeometry>,
    {
        if self.require_voxel_grid("Scene.AddMesh").is_err() {
            return IngestReport {
                failed: objects
                    .into_iter()
                    .map(|object| (object.name.clone(), NativeError::InvalidParam))
                    .collect(),
                ..IngestReport::default()
            };
        }
        let report = self
            .marshaler
            .ingest_all(&self.engine, &self.scene, objects);
        self.meshes
            .extend(report.records.iter().map(|(_, record)| *record));
        report
    }

    /// Remove a mesh this context ingested
    pub fn remove_mesh(&mut self, record: MeshRecord) -> NativeResult<()> {
        let Some(position) = self.meshes.iter().position(|r| *r == record) else {
            tracing::error!(index = record.index(), "Mesh record is not part of this scene");
            return Err(NativeError::InvalidParam).checked("Scene.RemoveMesh");
        };
        let scene = self.bound_scene("Scene.RemoveMesh")?;
        self.engine
            .scene_remove_mesh(scene, record.index())
            .into_result()
            .checked("Scene.RemoveMesh")?;
        self.meshes.remove(position);
        Ok(())
    }

    /// Rasterize every ingested mesh into the voxel grid
    pub fn fill_voxels(&mut self) -> NativeResult<()> {
        self.require_voxel_grid("Scene.FillVoxels")?;
        let scene = self.bound_scene("Scene.FillVoxels")?;
        self.engine
            .scene_fill_voxels_with_geometry(scene)
            .into_result()
            .checked("Scene.FillVoxels")
    }

    /// Ask the engine to open its visualization. Failures are only logged.
    pub fn open_debug_view(&self) -> bool {
        let Ok(scene) = self.bound_scene("Scene.Debug") else {
            return false;
        };
        match self.engine.scene_debug(scene).into_result() {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!("Scene.Debug failed: {}", error);
                false
            }
        }
    }

    pub fn set_listener_position(&self, position: Vec3) -> NativeResult<()> {
        let system = self.bound_system("System.SetListenerPosition")?;
        self.engine
            .system_set_listener_position(system, position.into())
            .into_result()
            .checked("System.SetListenerPosition")
    }

    pub fn listener_position(&self) -> NativeResult<Vec3> {
        let system = self.bound_system("System.GetListenerPosition")?;
        let mut position = PlVector::ZERO;
        self.engine
            .system_get_listener_position(system, &mut position)
            .into_result()
            .checked("System.GetListenerPosition")?;
        Ok(position.into())
    }

    /// Run one propagation pass for a listener at `listener`
    pub fn simulate(&self, listener: Vec3) -> NativeResult<()> {
        let scene = self.bound_scene("Scene.Simulate")?;
        self.engine
            .scene_simulate(scene, listener.into())
            .into_result()
            .checked("Scene.Simulate")
    }

    /// Raw occlusion at `point`, in the engine's own range
    pub fn occlusion(&self, point: Vec3) -> NativeResult<f32> {
        let scene = self.bound_scene("Scene.GetOcclusion")?;
        let mut occlusion = 0.0;
        self.engine
            .scene_get_occlusion(scene, point.into(), &mut occlusion)
            .into_result()
            .checked("Scene.GetOcclusion")?;
        Ok(occlusion)
    }

    pub fn voxel_count(&self) -> NativeResult<usize> {
        let scene = self.bound_scene("Scene.GetVoxelsCount")?;
        let mut count = 0;
        self.engine
            .scene_get_voxels_count(scene, &mut count)
            .into_result()
            .checked("Scene.GetVoxelsCount")?;
        usize::try_from(count)
            .map_err(|_| NativeError::Failed)
            .checked("Scene.GetVoxelsCount")
    }

    pub fn voxel(&self, index: usize) -> NativeResult<VoxelSample> {
        let scene = self.bound_scene("Scene.GetVoxel")?;
        let index = i32::try_from(index)
            .map_err(|_| NativeError::InvalidParam)
            .checked("Scene.GetVoxel")?;

        let mut location = PlVector::ZERO;
        self.engine
            .scene_get_voxel_location(scene, index, &mut location)
            .into_result()
            .checked("Scene.GetVoxelLocation")?;

        let mut absorptivity = 0.0;
        self.engine
            .scene_get_voxel_absorptivity(scene, index, &mut absorptivity)
            .into_result()
            .checked("Scene.GetVoxelAbsorptivity")?;

        Ok(VoxelSample {
            location: location.into(),
            absorptivity,
        })
    }

    /// Every voxel in the grid
    pub fn voxels(&self) -> NativeResult<Vec<VoxelSample>> {
        let count = self.voxel_count()?;
        (0..count).map(|index| self.voxel(index)).collect()
    }

    /// Release scene, then system, then unregister the log sink.
    ///
    /// Idempotent; also run on drop. Every step is attempted even if an
    /// earlier one fails.
    pub fn shutdown(&mut self) -> ShutdownReport {
        let scene = self
            .scene
            .release(&self.engine)
            .checked("Scene.Release")
            .unwrap_or(ReleaseStatus::Released);
        let system = self
            .system
            .release(&self.engine)
            .checked("System.Release")
            .unwrap_or(ReleaseStatus::Released);
        // Failure is already logged by the registration itself
        let _ = self.debug.unregister(&self.engine);

        self.meshes.clear();
        self.voxel_grid = None;
        ShutdownReport { scene, system }
    }

    fn bound_system(&self, call: &'static str) -> NativeResult<RawHandle> {
        self.system.raw().ok_or_else(|| {
            tracing::error!("{} requires a bound system handle", call);
            NativeError::InvalidParam
        })
    }

    fn bound_scene(&self, call: &'static str) -> NativeResult<RawHandle> {
        self.scene.raw().ok_or_else(|| {
            tracing::error!("{} requires a bound scene handle", call);
            NativeError::InvalidParam
        })
    }

    fn require_voxel_grid(&self, call: &'static str) -> NativeResult<()> {
        if self.voxel_grid.is_some() {
            Ok(())
        } else {
            tracing::error!("{} requires a voxel grid; create voxels first", call);
            Err(NativeError::InvalidParam)
        }
    }
}

impl<E: PropagationEngine> Drop for AcousticContext<E> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl<E: PropagationEngine> std::fmt::Debug for AcousticContext<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcousticContext")
            .field("system", &self.system.state())
            .field("scene", &self.scene.state())
            .field("voxel_grid", &self.voxel_grid)
            .field("meshes", &self.meshes.len())
            .field("debug_registered", &self.debug.is_registered())
            .finish()
    }
}
