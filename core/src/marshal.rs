//! Host geometry -> engine geometry
//!
//! Each acoustic object is flattened into two contiguous buffers (vertex
//! positions and triangle indices), pinned for exactly one `AddMesh` call,
//! and released on every exit path. Release happens in `Drop`, so success,
//! a reported failure and an unwinding panic all free the pins.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use bytemuck::Pod;
use glam::{Quat, Vec3};
use nether_acoustics_shared::{NativeError, NativeResult, PlQuaternion, PlVector};

use crate::engine::PropagationEngine;
use crate::error::CheckResult;
use crate::handle::SceneHandle;

/// World transform of a host object
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    /// Non-uniform world scale
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

/// Model-space mesh as the host stores it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vec3>,
    /// Triangle list, three indices per face
    pub indices: Vec<u32>,
    /// Whether the host allows CPU reads of the vertex data
    pub readable: bool,
}

impl MeshData {
    pub fn new(vertices: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self {
            vertices,
            indices,
            readable: true,
        }
    }
}

/// Host object tagged as acoustic geometry
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcousticGeometry {
    pub name: String,
    pub mesh: Option<MeshData>,
    pub transform: Transform,
}

impl AcousticGeometry {
    pub fn new(name: impl Into<String>, mesh: MeshData, transform: Transform) -> Self {
        Self {
            name: name.into(),
            mesh: Some(mesh),
            transform,
        }
    }

    /// Mesh data if this object can be ingested
    pub fn qualify(&self) -> Result<&MeshData, SkipReason> {
        let mesh = self.mesh.as_ref().ok_or(SkipReason::MissingMesh)?;
        if !mesh.readable {
            return Err(SkipReason::Unreadable);
        }
        Ok(mesh)
    }
}

/// Why an object was left out of the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    MissingMesh,
    Unreadable,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingMesh => write!(f, "no mesh data"),
            Self::Unreadable => write!(f, "mesh data is not host-readable"),
        }
    }
}

/// Engine-assigned index of an ingested mesh, used to remove it later
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshRecord(i32);

impl MeshRecord {
    pub(crate) const fn new(index: i32) -> Self {
        Self(index)
    }

    pub const fn index(self) -> i32 {
        self.0
    }
}

/// Outcome of ingesting one object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestError {
    Skipped(SkipReason),
    Native(NativeError),
}

impl From<NativeError> for IngestError {
    fn from(error: NativeError) -> Self {
        Self::Native(error)
    }
}

/// Outcome of ingesting a batch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IngestReport {
    pub records: Vec<(String, MeshRecord)>,
    pub skipped: Vec<(String, SkipReason)>,
    pub failed: Vec<(String, NativeError)>,
}

impl IngestReport {
    /// Number of `AddMesh` calls the batch issued
    pub fn attempted(&self) -> usize {
        self.records.len() + self.failed.len()
    }
}

/// Counts buffers currently pinned for an engine call
#[derive(Debug, Clone, Default)]
pub struct PinLedger {
    live: Arc<AtomicUsize>,
}

impl PinLedger {
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    fn acquire(&self) {
        self.live.fetch_add(1, Ordering::AcqRel);
    }

    fn release(&self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Contiguous buffer whose address is stable until it is dropped
struct PinnedBuffer<T: Pod> {
    data: Box<[T]>,
    ledger: PinLedger,
}

impl<T: Pod> PinnedBuffer<T> {
    fn new(data: Box<[T]>, ledger: &PinLedger) -> Self {
        ledger.acquire();
        Self {
            data,
            ledger: ledger.clone(),
        }
    }

    fn as_ptr(&self) -> *const T {
        self.data.as_ptr()
    }

    fn count(&self) -> NativeResult<i32> {
        i32::try_from(self.data.len()).map_err(|_| NativeError::InvalidParam)
    }
}

impl<T: Pod> Drop for PinnedBuffer<T> {
    fn drop(&mut self) {
        self.ledger.release();
    }
}

/// Converts host meshes into engine geometry
#[derive(Debug, Clone, Default)]
pub struct GeometryMarshaler {
    pins: PinLedger,
}

impl GeometryMarshaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger of buffers pinned by this marshaler (zero between calls)
    pub fn pin_ledger(&self) -> &PinLedger {
        &self.pins
    }

    /// Ingest one object into `scene`.
    ///
    /// Objects without mesh data or with unreadable mesh data are skipped
    /// (and logged) before any buffer is built.
    pub fn ingest<E: PropagationEngine + ?Sized>(
        &self,
        engine: &E,
        scene: &SceneHandle,
        object: &AcousticGeometry,
    ) -> Result<MeshRecord, IngestError> {
        let mesh = object.qualify().map_err(|reason| {
            tracing::warn!(mesh = %object.name, "Skipping acoustic geometry: {}", reason);
            IngestError::Skipped(reason)
        })?;
        let Some(scene_raw) = scene.raw() else {
            tracing::error!(mesh = %object.name, "Cannot ingest geometry without a bound scene");
            return Err(IngestError::Native(NativeError::InvalidParam));
        };

        let indices = mesh
            .indices
            .iter()
            .map(|&index| i32::try_from(index))
            .collect::<Result<Box<[i32]>, _>>()
            .map_err(|_| NativeError::InvalidParam)
            .checked("Scene.AddMesh")?;
        let vertices: Box<[PlVector]> =
            bytemuck::cast_slice::<Vec3, PlVector>(&mesh.vertices).into();

        let position = PlVector::from(object.transform.position);
        let rotation = PlQuaternion::from(object.transform.rotation);
        let scale = PlVector::from(object.transform.scale);

        let vertex_buffer = PinnedBuffer::new(vertices, &self.pins);
        let index_buffer = PinnedBuffer::new(indices, &self.pins);
        let vertex_count = vertex_buffer.count().checked("Scene.AddMesh")?;
        let index_count = index_buffer.count().checked("Scene.AddMesh")?;

        let mut out_index = -1;
        // SAFETY: both buffers are owned locally and outlive the call; the
        // counts are their exact lengths.
        let code = unsafe {
            engine.scene_add_mesh(
                scene_raw,
                &position,
                &rotation,
                &scale,
                vertex_buffer.as_ptr(),
                vertex_count,
                index_buffer.as_ptr(),
                index_count,
                &mut out_index,
            )
        };
        drop(index_buffer);
        drop(vertex_buffer);

        code.into_result().checked("Scene.AddMesh")?;
        tracing::debug!(
            mesh = %object.name,
            index = out_index,
            vertices = vertex_count,
            indices = index_count,
            "Mesh ingested"
        );
        Ok(MeshRecord::new(out_index))
    }

    /// Ingest every object; one bad object never aborts the batch
    pub fn ingest_all<'a, E, I>(&self, engine: &E, scene: &SceneHandle, objects: I) -> IngestReport
    where
        E: PropagationEngine + ?Sized,
        I: IntoIterator<Item = &'a AcousticGeometry>,
    {
        let mut report = IngestReport::default();
        for object in objects {
            match self.ingest(engine, scene, object) {
                Ok(record) => report.records.push((object.name.clone(), record)),
                Err(IngestError::Skipped(reason)) => {
                    report.skipped.push((object.name.clone(), reason))
                }
                Err(IngestError::Native(error)) => {
                    report.failed.push((object.name.clone(), error))
                }
            }
        }
        report
    }
}
