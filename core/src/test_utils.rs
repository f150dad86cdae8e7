//! Shared test utilities for integration and unit tests

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::ffi::{CString, c_int};
use std::rc::Rc;

use glam::Vec3;
use nether_acoustics_shared::{
    DebugCallback, DebugLevel, PlQuaternion, PlVector, RawHandle, ResultCode,
};

use crate::engine::PropagationEngine;
use crate::marshal::{AcousticGeometry, MeshData, PinLedger, Transform};
use crate::middleware::{
    ChannelGroupId, ConvolutionHost, EffectType, MiddlewareError, ParameterSink,
};
use crate::simulation::{Positioned, TrackedEmitter};

// ============================================================================
// Fake Engine
// ============================================================================

/// One entry point of the engine boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    DebugInitialize,
    SystemCreate,
    SystemRelease,
    SystemCreateScene,
    SystemSetListenerPosition,
    SystemGetListenerPosition,
    SceneRelease,
    SceneCreateVoxels,
    SceneAddMesh,
    SceneRemoveMesh,
    SceneFillVoxels,
    SceneDebug,
    SceneGetVoxelsCount,
    SceneGetVoxelLocation,
    SceneGetVoxelAbsorptivity,
    SceneSimulate,
    SceneGetOcclusion,
}

/// Mesh as the fake engine copied it out of the pinned buffers
#[derive(Debug, Clone, PartialEq)]
pub struct IngestedMesh {
    pub index: i32,
    pub position: PlVector,
    pub rotation: PlQuaternion,
    pub scale: PlVector,
    pub vertices: Vec<PlVector>,
    pub indices: Vec<i32>,
    /// Buffers the marshaler reported as pinned while the call ran
    pub pins_during_call: Option<usize>,
}

#[derive(Default)]
struct FakeState {
    calls: Vec<Call>,
    fail_next: HashMap<Call, VecDeque<ResultCode>>,
    fail_always: HashMap<Call, ResultCode>,
    null_handles: bool,
    panic_on_add_mesh: bool,
    next_handle: usize,
    live_handles: HashSet<usize>,
    invalid_releases: usize,
    callback: Option<DebugCallback>,
    pin_ledger: Option<PinLedger>,
    meshes: Vec<IngestedMesh>,
    next_mesh_index: i32,
    removed_meshes: Vec<i32>,
    voxel_grid: Option<(PlVector, f32)>,
    voxels: Vec<(PlVector, f32)>,
    listener: PlVector,
    simulated: Vec<Vec3>,
    queried: Vec<Vec3>,
    occlusion: VecDeque<f32>,
    default_occlusion: f32,
}

impl FakeState {
    fn outcome(&mut self, call: Call) -> ResultCode {
        self.calls.push(call);
        if let Some(code) = self.fail_next.get_mut(&call).and_then(VecDeque::pop_front) {
            return code;
        }
        self.fail_always.get(&call).copied().unwrap_or(ResultCode::Ok)
    }

    fn allocate_handle(&mut self) -> RawHandle {
        if self.null_handles {
            return RawHandle::NULL;
        }
        self.next_handle += 0x10;
        let address = 0x1000 + self.next_handle;
        self.live_handles.insert(address);
        RawHandle::from_ptr(std::ptr::without_provenance_mut(address))
    }

    fn release_handle(&mut self, handle: RawHandle) {
        if !self.live_handles.remove(&handle.as_ptr().addr()) {
            self.invalid_releases += 1;
        }
    }

    fn is_live(&self, handle: RawHandle) -> bool {
        self.live_handles.contains(&handle.as_ptr().addr())
    }
}

/// Recording, fault-injectable stand-in for the native engine.
///
/// Clones share state, so a test can keep one clone for inspection while
/// the context owns another.
#[derive(Clone, Default)]
pub struct FakeEngine {
    state: Rc<RefCell<FakeState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    pub fn count(&self, call: Call) -> usize {
        self.state.borrow().calls.iter().filter(|c| **c == call).count()
    }

    /// Fail the next `call` with `code`; queued failures apply in order
    pub fn fail_next(&self, call: Call, code: ResultCode) {
        self.state
            .borrow_mut()
            .fail_next
            .entry(call)
            .or_default()
            .push_back(code);
    }

    pub fn fail_always(&self, call: Call, code: ResultCode) {
        self.state.borrow_mut().fail_always.insert(call, code);
    }

    /// Report `OK` from create calls without producing a handle
    pub fn return_null_handles(&self, enabled: bool) {
        self.state.borrow_mut().null_handles = enabled;
    }

    pub fn panic_on_add_mesh(&self, enabled: bool) {
        self.state.borrow_mut().panic_on_add_mesh = enabled;
    }

    /// Record the ledger's live count whenever `AddMesh` runs
    pub fn observe_pins(&self, ledger: &PinLedger) {
        self.state.borrow_mut().pin_ledger = Some(ledger.clone());
    }

    pub fn debug_callback(&self) -> Option<DebugCallback> {
        self.state.borrow().callback
    }

    /// Deliver a message through the registered callback, as the engine would
    pub fn emit_debug(&self, message: &str, level: DebugLevel) -> Option<ResultCode> {
        let callback = self.debug_callback()?;
        let message = CString::new(message).ok()?;
        // SAFETY: `message` is NUL-terminated and outlives the call.
        let raw = unsafe { callback(message.as_ptr(), level as c_int) };
        Some(ResultCode::from_raw(raw))
    }

    pub fn meshes(&self) -> Vec<IngestedMesh> {
        self.state.borrow().meshes.clone()
    }

    pub fn removed_meshes(&self) -> Vec<i32> {
        self.state.borrow().removed_meshes.clone()
    }

    pub fn live_handle_count(&self) -> usize {
        self.state.borrow().live_handles.len()
    }

    /// Releases of handles that were never created or already released
    pub fn invalid_releases(&self) -> usize {
        self.state.borrow().invalid_releases
    }

    pub fn voxel_grid(&self) -> Option<(PlVector, f32)> {
        self.state.borrow().voxel_grid
    }

    /// Voxels reported after `FillVoxelsWithGeometry`
    pub fn set_voxels(&self, voxels: Vec<(PlVector, f32)>) {
        self.state.borrow_mut().voxels = voxels;
    }

    /// Queue raw occlusion values, returned one per `GetOcclusion`
    pub fn script_occlusion(&self, values: impl IntoIterator<Item = f32>) {
        self.state.borrow_mut().occlusion.extend(values);
    }

    /// Value returned once the script is exhausted
    pub fn set_default_occlusion(&self, value: f32) {
        self.state.borrow_mut().default_occlusion = value;
    }

    pub fn simulated_positions(&self) -> Vec<Vec3> {
        self.state.borrow().simulated.clone()
    }

    pub fn query_points(&self) -> Vec<Vec3> {
        self.state.borrow().queried.clone()
    }
}

impl PropagationEngine for FakeEngine {
    fn debug_initialize(&self, callback: Option<DebugCallback>) -> ResultCode {
        let mut state = self.state.borrow_mut();
        let code = state.outcome(Call::DebugInitialize);
        if code.is_ok() {
            state.callback = callback;
        }
        code
    }

    fn system_create(&self, out_system: &mut RawHandle) -> ResultCode {
        let mut state = self.state.borrow_mut();
        let code = state.outcome(Call::SystemCreate);
        if code.is_ok() {
            *out_system = state.allocate_handle();
        }
        code
    }

    fn system_release(&self, system: RawHandle) -> ResultCode {
        let mut state = self.state.borrow_mut();
        let code = state.outcome(Call::SystemRelease);
        state.release_handle(system);
        code
    }

    fn system_create_scene(&self, system: RawHandle, out_scene: &mut RawHandle) -> ResultCode {
        let mut state = self.state.borrow_mut();
        let code = state.outcome(Call::SystemCreateScene);
        if !state.is_live(system) {
            return ResultCode::ErrInvalidParam;
        }
        if code.is_ok() {
            *out_scene = state.allocate_handle();
        }
        code
    }

    fn system_set_listener_position(&self, _system: RawHandle, position: PlVector) -> ResultCode {
        let mut state = self.state.borrow_mut();
        let code = state.outcome(Call::SystemSetListenerPosition);
        if code.is_ok() {
            state.listener = position;
        }
        code
    }

    fn system_get_listener_position(
        &self,
        _system: RawHandle,
        out_position: &mut PlVector,
    ) -> ResultCode {
        let mut state = self.state.borrow_mut();
        let code = state.outcome(Call::SystemGetListenerPosition);
        if code.is_ok() {
            *out_position = state.listener;
        }
        code
    }

    fn scene_release(&self, scene: RawHandle) -> ResultCode {
        let mut state = self.state.borrow_mut();
        let code = state.outcome(Call::SceneRelease);
        state.release_handle(scene);
        code
    }

    fn scene_create_voxels(
        &self,
        _scene: RawHandle,
        extent: PlVector,
        cell_size: f32,
    ) -> ResultCode {
        let mut state = self.state.borrow_mut();
        let code = state.outcome(Call::SceneCreateVoxels);
        if code.is_ok() {
            state.voxel_grid = Some((extent, cell_size));
        }
        code
    }

    unsafe fn scene_add_mesh(
        &self,
        _scene: RawHandle,
        position: &PlVector,
        rotation: &PlQuaternion,
        scale: &PlVector,
        vertices: *const PlVector,
        vertex_count: i32,
        indices: *const i32,
        index_count: i32,
        out_index: &mut i32,
    ) -> ResultCode {
        let (code, should_panic, ledger) = {
            let mut state = self.state.borrow_mut();
            let code = state.outcome(Call::SceneAddMesh);
            (code, state.panic_on_add_mesh, state.pin_ledger.clone())
        };
        if should_panic {
            panic!("injected AddMesh panic");
        }
        if !code.is_ok() {
            return code;
        }
        if vertex_count < 0 || index_count < 0 || index_count % 3 != 0 {
            return ResultCode::ErrInvalidParam;
        }
        if (vertex_count > 0 && vertices.is_null()) || (index_count > 0 && indices.is_null()) {
            return ResultCode::ErrMemory;
        }

        // SAFETY: the caller guarantees both pointers are valid for reads of
        // the given counts for the duration of this call.
        let vertices = if vertex_count == 0 {
            Vec::new()
        } else {
            unsafe { std::slice::from_raw_parts(vertices, vertex_count as usize) }.to_vec()
        };
        let indices = if index_count == 0 {
            Vec::new()
        } else {
            unsafe { std::slice::from_raw_parts(indices, index_count as usize) }.to_vec()
        };
        if indices.iter().any(|&i| i < 0 || i >= vertex_count) {
            return ResultCode::ErrInvalidParam;
        }

        let mut state = self.state.borrow_mut();
        let index = state.next_mesh_index;
        state.next_mesh_index += 1;
        state.meshes.push(IngestedMesh {
            index,
            position: *position,
            rotation: *rotation,
            scale: *scale,
            vertices,
            indices,
            pins_during_call: ledger.map(|ledger| ledger.live()),
        });
        *out_index = index;
        ResultCode::Ok
    }

    fn scene_remove_mesh(&self, _scene: RawHandle, index: i32) -> ResultCode {
        let mut state = self.state.borrow_mut();
        let code = state.outcome(Call::SceneRemoveMesh);
        if code.is_ok() {
            state.removed_meshes.push(index);
        }
        code
    }

    fn scene_fill_voxels_with_geometry(&self, _scene: RawHandle) -> ResultCode {
        self.state.borrow_mut().outcome(Call::SceneFillVoxels)
    }

    fn scene_debug(&self, _scene: RawHandle) -> ResultCode {
        self.state.borrow_mut().outcome(Call::SceneDebug)
    }

    fn scene_get_voxels_count(&self, _scene: RawHandle, out_count: &mut i32) -> ResultCode {
        let mut state = self.state.borrow_mut();
        let code = state.outcome(Call::SceneGetVoxelsCount);
        if code.is_ok() {
            *out_count = state.voxels.len() as i32;
        }
        code
    }

    fn scene_get_voxel_location(
        &self,
        _scene: RawHandle,
        index: i32,
        out_location: &mut PlVector,
    ) -> ResultCode {
        let mut state = self.state.borrow_mut();
        let code = state.outcome(Call::SceneGetVoxelLocation);
        if !code.is_ok() {
            return code;
        }
        match usize::try_from(index).ok().and_then(|i| state.voxels.get(i)) {
            Some((location, _)) => {
                *out_location = *location;
                ResultCode::Ok
            }
            None => ResultCode::ErrInvalidParam,
        }
    }

    fn scene_get_voxel_absorptivity(
        &self,
        _scene: RawHandle,
        index: i32,
        out_absorptivity: &mut f32,
    ) -> ResultCode {
        let mut state = self.state.borrow_mut();
        let code = state.outcome(Call::SceneGetVoxelAbsorptivity);
        if !code.is_ok() {
            return code;
        }
        match usize::try_from(index).ok().and_then(|i| state.voxels.get(i)) {
            Some((_, absorptivity)) => {
                *out_absorptivity = *absorptivity;
                ResultCode::Ok
            }
            None => ResultCode::ErrInvalidParam,
        }
    }

    fn scene_simulate(&self, _scene: RawHandle, listener: PlVector) -> ResultCode {
        let mut state = self.state.borrow_mut();
        let code = state.outcome(Call::SceneSimulate);
        if code.is_ok() {
            state.simulated.push(listener.into());
        }
        code
    }

    fn scene_get_occlusion(
        &self,
        _scene: RawHandle,
        point: PlVector,
        out_occlusion: &mut f32,
    ) -> ResultCode {
        let mut state = self.state.borrow_mut();
        let code = state.outcome(Call::SceneGetOcclusion);
        if code.is_ok() {
            state.queried.push(point.into());
            *out_occlusion = state
                .occlusion
                .pop_front()
                .unwrap_or(state.default_occlusion);
        }
        code
    }
}

// ============================================================================
// Geometry Fixtures
// ============================================================================

/// Unit quad (two triangles) in the XZ plane
pub fn quad_mesh() -> MeshData {
    MeshData::new(
        vec![
            Vec3::new(-0.5, 0.0, -0.5),
            Vec3::new(0.5, 0.0, -0.5),
            Vec3::new(0.5, 0.0, 0.5),
            Vec3::new(-0.5, 0.0, 0.5),
        ],
        vec![0, 1, 2, 0, 2, 3],
    )
}

pub fn wall(name: &str, position: Vec3) -> AcousticGeometry {
    AcousticGeometry::new(
        name,
        quad_mesh(),
        Transform {
            position,
            ..Transform::default()
        },
    )
}

pub fn unreadable_wall(name: &str) -> AcousticGeometry {
    let mut object = wall(name, Vec3::ZERO);
    if let Some(mesh) = object.mesh.as_mut() {
        mesh.readable = false;
    }
    object
}

// ============================================================================
// Middleware Fakes
// ============================================================================

/// Parameter sink that records every update
#[derive(Default)]
pub struct RecordingSink {
    updates: RefCell<Vec<(String, f32)>>,
    reject: Cell<bool>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn updates(&self) -> Vec<(String, f32)> {
        self.updates.borrow().clone()
    }

    pub fn values(&self) -> Vec<f32> {
        self.updates.borrow().iter().map(|(_, value)| *value).collect()
    }

    pub fn reject_updates(&self, reject: bool) {
        self.reject.set(reject);
    }
}

impl ParameterSink for RecordingSink {
    fn set_scalar_parameter(&self, name: &str, value: f32) -> Result<(), MiddlewareError> {
        if self.reject.get() {
            return Err(MiddlewareError::ParameterRejected {
                name: name.to_string(),
                reason: "rejected by test".to_string(),
            });
        }
        self.updates.borrow_mut().push((name.to_string(), value));
        Ok(())
    }
}

/// Convolution host with a fixed effect chain per channel group
#[derive(Default)]
pub struct FakeConvolutionHost {
    pub sink: RecordingSink,
    groups: HashMap<ChannelGroupId, Vec<EffectType>>,
    injected: RefCell<Vec<(ChannelGroupId, usize, i32, Vec<u8>)>>,
    scans: Cell<usize>,
}

impl FakeConvolutionHost {
    pub fn with_group(mut self, group: ChannelGroupId, effects: Vec<EffectType>) -> Self {
        self.groups.insert(group, effects);
        self
    }

    /// `(group, effect index, slot, payload)` for every accepted injection
    pub fn injected(&self) -> Vec<(ChannelGroupId, usize, i32, Vec<u8>)> {
        self.injected.borrow().clone()
    }

    /// Number of effect-chain scans
    pub fn scans(&self) -> usize {
        self.scans.get()
    }

    fn effects(&self, group: ChannelGroupId) -> Result<&[EffectType], MiddlewareError> {
        self.groups
            .get(&group)
            .map(Vec::as_slice)
            .ok_or(MiddlewareError::ChannelGroupUnavailable(group))
    }
}

impl ParameterSink for FakeConvolutionHost {
    fn set_scalar_parameter(&self, name: &str, value: f32) -> Result<(), MiddlewareError> {
        self.sink.set_scalar_parameter(name, value)
    }
}

impl ConvolutionHost for FakeConvolutionHost {
    fn effect_count(&self, group: ChannelGroupId) -> Result<usize, MiddlewareError> {
        self.scans.set(self.scans.get() + 1);
        Ok(self.effects(group)?.len())
    }

    fn effect_type(
        &self,
        group: ChannelGroupId,
        index: usize,
    ) -> Result<EffectType, MiddlewareError> {
        self.effects(group)?
            .get(index)
            .copied()
            .ok_or(MiddlewareError::EffectUnavailable { group, index })
    }

    fn set_effect_parameter_data(
        &self,
        group: ChannelGroupId,
        index: usize,
        slot: i32,
        data: &[u8],
    ) -> Result<(), MiddlewareError> {
        self.effect_type(group, index)?;
        self.injected
            .borrow_mut()
            .push((group, index, slot, data.to_vec()));
        Ok(())
    }
}

// ============================================================================
// Scripted Positions
// ============================================================================

/// Emitter whose liveness is driven by the test
pub struct ScriptedEmitter {
    position: Cell<Vec3>,
    exists: Cell<bool>,
    active: Cell<bool>,
    active_for: Option<(tokio::time::Instant, std::time::Duration)>,
}

impl ScriptedEmitter {
    pub fn new(position: Vec3) -> Self {
        Self {
            position: Cell::new(position),
            exists: Cell::new(true),
            active: Cell::new(true),
            active_for: None,
        }
    }

    /// Live until `duration` of (tokio) time has passed since creation
    pub fn active_for(position: Vec3, duration: std::time::Duration) -> Self {
        Self {
            active_for: Some((tokio::time::Instant::now(), duration)),
            ..Self::new(position)
        }
    }

    pub fn move_to(&self, position: Vec3) {
        self.position.set(position);
    }

    pub fn destroy(&self) {
        self.exists.set(false);
    }

    pub fn set_active(&self, active: bool) {
        self.active.set(active);
    }
}

impl Positioned for ScriptedEmitter {
    fn world_position(&self) -> Vec3 {
        self.position.get()
    }
}

impl TrackedEmitter for ScriptedEmitter {
    fn exists(&self) -> bool {
        self.exists.get()
    }

    fn is_active(&self) -> bool {
        let within_window = self
            .active_for
            .is_none_or(|(start, duration)| start.elapsed() < duration);
        self.active.get() && within_window
    }
}
