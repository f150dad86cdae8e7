//! The native propagation engine boundary
//!
//! [`PropagationEngine`] has one method per native entry point, with the
//! same shape as the C ABI: every call returns a [`ResultCode`] and writes
//! its outputs through `&mut` out-parameters. The linked implementation
//! lives in [`crate::ffi`]; tests substitute a recording fake.
//!
//! Implementations only ever receive handles that the same engine produced
//! (see [`crate::handle::NativeHandle`]), and are never called concurrently
//! for the same system/scene pair.

use nether_acoustics_shared::{DebugCallback, PlQuaternion, PlVector, RawHandle, ResultCode};

/// Foreign-function boundary to the opaque acoustic propagation engine
pub trait PropagationEngine {
    /// Register (or with `None`, unregister) the synchronous log sink
    fn debug_initialize(&self, callback: Option<DebugCallback>) -> ResultCode;

    fn system_create(&self, out_system: &mut RawHandle) -> ResultCode;

    fn system_release(&self, system: RawHandle) -> ResultCode;

    /// Create a scene owned by `system`
    fn system_create_scene(&self, system: RawHandle, out_scene: &mut RawHandle) -> ResultCode;

    fn system_set_listener_position(&self, system: RawHandle, position: PlVector) -> ResultCode;

    fn system_get_listener_position(&self, system: RawHandle, out_position: &mut PlVector)
    -> ResultCode;

    fn scene_release(&self, scene: RawHandle) -> ResultCode;

    /// Allocate the voxel grid for `scene`
    fn scene_create_voxels(&self, scene: RawHandle, extent: PlVector, cell_size: f32)
    -> ResultCode;

    /// Ingest one mesh.
    ///
    /// # Safety
    ///
    /// `vertices` must be valid for reads of `vertex_count` elements and
    /// `indices` for reads of `index_count` elements for the whole call.
    /// The engine must not retain either pointer after returning.
    #[allow(clippy::too_many_arguments)]
    unsafe fn scene_add_mesh(
        &self,
        scene: RawHandle,
        position: &PlVector,
        rotation: &PlQuaternion,
        scale: &PlVector,
        vertices: *const PlVector,
        vertex_count: i32,
        indices: *const i32,
        index_count: i32,
        out_index: &mut i32,
    ) -> ResultCode;

    fn scene_remove_mesh(&self, scene: RawHandle, index: i32) -> ResultCode;

    /// Rasterize every ingested mesh into the grid and derive absorptivity
    fn scene_fill_voxels_with_geometry(&self, scene: RawHandle) -> ResultCode;

    /// Open the engine's out-of-process visualization
    fn scene_debug(&self, scene: RawHandle) -> ResultCode;

    fn scene_get_voxels_count(&self, scene: RawHandle, out_count: &mut i32) -> ResultCode;

    fn scene_get_voxel_location(
        &self,
        scene: RawHandle,
        index: i32,
        out_location: &mut PlVector,
    ) -> ResultCode;

    fn scene_get_voxel_absorptivity(
        &self,
        scene: RawHandle,
        index: i32,
        out_absorptivity: &mut f32,
    ) -> ResultCode;

    /// Run one propagation pass for the given listener position
    fn scene_simulate(&self, scene: RawHandle, listener: PlVector) -> ResultCode;

    /// Sample the raw occlusion value at `point`
    fn scene_get_occlusion(&self, scene: RawHandle, point: PlVector, out_occlusion: &mut f32)
    -> ResultCode;
}
