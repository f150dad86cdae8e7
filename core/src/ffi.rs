//! Linked native engine
//!
//! Raw `extern "C"` declarations for the propagation library and the
//! [`LinkedEngine`] that forwards [`PropagationEngine`] calls to them.
//! Only built with the `native` feature, which links `OpenPL`.

use std::ffi::c_int;

use nether_acoustics_shared::{DebugCallback, PlQuaternion, PlVector, RawHandle, ResultCode};

use crate::engine::PropagationEngine;

#[link(name = "OpenPL")]
unsafe extern "C" {
    #[link_name = "PL_Debug_Initialize"]
    fn pl_debug_initialize(callback: Option<DebugCallback>) -> c_int;

    #[link_name = "PL_System_Create"]
    fn pl_system_create(out_system: *mut RawHandle) -> c_int;

    #[link_name = "PL_System_Release"]
    fn pl_system_release(system: RawHandle) -> c_int;

    #[link_name = "PL_System_CreateScene"]
    fn pl_system_create_scene(system: RawHandle, out_scene: *mut RawHandle) -> c_int;

    #[link_name = "PL_System_SetListenerPosition"]
    fn pl_system_set_listener_position(system: RawHandle, position: PlVector) -> c_int;

    #[link_name = "PL_System_GetListenerPosition"]
    fn pl_system_get_listener_position(system: RawHandle, out_position: *mut PlVector) -> c_int;

    #[link_name = "PL_Scene_Release"]
    fn pl_scene_release(scene: RawHandle) -> c_int;

    #[link_name = "PL_Scene_CreateVoxels"]
    fn pl_scene_create_voxels(scene: RawHandle, extent: PlVector, cell_size: f32) -> c_int;

    #[link_name = "PL_Scene_AddMesh"]
    fn pl_scene_add_mesh(
        scene: RawHandle,
        position: *const PlVector,
        rotation: *const PlQuaternion,
        scale: *const PlVector,
        vertices: *const PlVector,
        vertex_count: c_int,
        indices: *const c_int,
        index_count: c_int,
        out_index: *mut c_int,
    ) -> c_int;

    #[link_name = "PL_Scene_RemoveMesh"]
    fn pl_scene_remove_mesh(scene: RawHandle, index: c_int) -> c_int;

    #[link_name = "PL_Scene_FillVoxelsWithGeometry"]
    fn pl_scene_fill_voxels_with_geometry(scene: RawHandle) -> c_int;

    #[link_name = "PL_Scene_Debug"]
    fn pl_scene_debug(scene: RawHandle) -> c_int;

    #[link_name = "PL_Scene_GetVoxelsCount"]
    fn pl_scene_get_voxels_count(scene: RawHandle, out_count: *mut c_int) -> c_int;

    #[link_name = "PL_Scene_GetVoxelLocation"]
    fn pl_scene_get_voxel_location(
        scene: RawHandle,
        out_location: *mut PlVector,
        index: c_int,
    ) -> c_int;

    // Exported under this spelling by the library.
    #[link_name = "PL_Scene_GetVoxelAbsorpivity"]
    fn pl_scene_get_voxel_absorptivity(
        scene: RawHandle,
        out_absorptivity: *mut f32,
        index: c_int,
    ) -> c_int;

    #[link_name = "PL_Scene_Simulate"]
    fn pl_scene_simulate(scene: RawHandle, listener: PlVector) -> c_int;

    #[link_name = "PL_Scene_GetOcclusion"]
    fn pl_scene_get_occlusion(scene: RawHandle, point: PlVector, out_occlusion: *mut f32)
    -> c_int;
}

/// [`PropagationEngine`] backed by the linked native library
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkedEngine;

// SAFETY (all methods below): every pointer handed to C is derived from a
// live Rust reference for the duration of the call, and handles are only
// those previously returned by the library itself.
impl PropagationEngine for LinkedEngine {
    fn debug_initialize(&self, callback: Option<DebugCallback>) -> ResultCode {
        ResultCode::from_raw(unsafe { pl_debug_initialize(callback) })
    }

    fn system_create(&self, out_system: &mut RawHandle) -> ResultCode {
        ResultCode::from_raw(unsafe { pl_system_create(out_system) })
    }

    fn system_release(&self, system: RawHandle) -> ResultCode {
        ResultCode::from_raw(unsafe { pl_system_release(system) })
    }

    fn system_create_scene(&self, system: RawHandle, out_scene: &mut RawHandle) -> ResultCode {
        ResultCode::from_raw(unsafe { pl_system_create_scene(system, out_scene) })
    }

    fn system_set_listener_position(&self, system: RawHandle, position: PlVector) -> ResultCode {
        ResultCode::from_raw(unsafe { pl_system_set_listener_position(system, position) })
    }

    fn system_get_listener_position(
        &self,
        system: RawHandle,
        out_position: &mut PlVector,
    ) -> ResultCode {
        ResultCode::from_raw(unsafe { pl_system_get_listener_position(system, out_position) })
    }

    fn scene_release(&self, scene: RawHandle) -> ResultCode {
        ResultCode::from_raw(unsafe { pl_scene_release(scene) })
    }

    fn scene_create_voxels(
        &self,
        scene: RawHandle,
        extent: PlVector,
        cell_size: f32,
    ) -> ResultCode {
        ResultCode::from_raw(unsafe { pl_scene_create_voxels(scene, extent, cell_size) })
    }

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
    ) -> ResultCode {
        // SAFETY: the caller upholds the vertex/index pointer contract.
        let raw = unsafe {
            pl_scene_add_mesh(
                scene,
                position,
                rotation,
                scale,
                vertices,
                vertex_count,
                indices,
                index_count,
                out_index,
            )
        };
        ResultCode::from_raw(raw)
    }

    fn scene_remove_mesh(&self, scene: RawHandle, index: i32) -> ResultCode {
        ResultCode::from_raw(unsafe { pl_scene_remove_mesh(scene, index) })
    }

    fn scene_fill_voxels_with_geometry(&self, scene: RawHandle) -> ResultCode {
        ResultCode::from_raw(unsafe { pl_scene_fill_voxels_with_geometry(scene) })
    }

    fn scene_debug(&self, scene: RawHandle) -> ResultCode {
        ResultCode::from_raw(unsafe { pl_scene_debug(scene) })
    }

    fn scene_get_voxels_count(&self, scene: RawHandle, out_count: &mut i32) -> ResultCode {
        ResultCode::from_raw(unsafe { pl_scene_get_voxels_count(scene, out_count) })
    }

    fn scene_get_voxel_location(
        &self,
        scene: RawHandle,
        index: i32,
        out_location: &mut PlVector,
    ) -> ResultCode {
        ResultCode::from_raw(unsafe { pl_scene_get_voxel_location(scene, out_location, index) })
    }

    fn scene_get_voxel_absorptivity(
        &self,
        scene: RawHandle,
        index: i32,
        out_absorptivity: &mut f32,
    ) -> ResultCode {
        ResultCode::from_raw(unsafe {
            pl_scene_get_voxel_absorptivity(scene, out_absorptivity, index)
        })
    }

    fn scene_simulate(&self, scene: RawHandle, listener: PlVector) -> ResultCode {
        ResultCode::from_raw(unsafe { pl_scene_simulate(scene, listener) })
    }

    fn scene_get_occlusion(
        &self,
        scene: RawHandle,
        point: PlVector,
        out_occlusion: &mut f32,
    ) -> ResultCode {
        ResultCode::from_raw(unsafe { pl_scene_get_occlusion(scene, point, out_occlusion) })
    }
}
