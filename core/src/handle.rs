//! Lifecycle of one opaque engine resource
//!
//! A [`NativeHandle`] moves `Unbound -> Bound -> Released`. `Released` is
//! terminal: releasing again reports [`ReleaseStatus::AlreadyReleased`]
//! without touching the engine, so a resource is freed at most once.

use std::marker::PhantomData;

use nether_acoustics_shared::{NativeError, NativeResult, RawHandle, ResultCode};

use crate::engine::PropagationEngine;

/// Where a handle is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Unbound,
    Bound,
    Released,
}

/// What a call to [`NativeHandle::release`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseStatus {
    /// The engine was asked to free the resource
    Released,
    /// Already released earlier; the engine was not called
    AlreadyReleased,
    /// Never bound; there was nothing to free
    NotBound,
}

/// Resource kind a handle refers to
pub trait HandleKind {
    /// Name used in log output (`System`, `Scene`)
    const NAME: &'static str;

    fn release_raw<E: PropagationEngine + ?Sized>(engine: &E, raw: RawHandle) -> ResultCode;
}

/// Simulation engine instance
#[derive(Debug)]
pub enum System {}

/// Spatial scene owned by a system
#[derive(Debug)]
pub enum Scene {}

impl HandleKind for System {
    const NAME: &'static str = "System";

    fn release_raw<E: PropagationEngine + ?Sized>(engine: &E, raw: RawHandle) -> ResultCode {
        engine.system_release(raw)
    }
}

impl HandleKind for Scene {
    const NAME: &'static str = "Scene";

    fn release_raw<E: PropagationEngine + ?Sized>(engine: &E, raw: RawHandle) -> ResultCode {
        engine.scene_release(raw)
    }
}

/// One opaque engine resource and its create/release state
#[derive(Debug)]
pub struct NativeHandle<K: HandleKind> {
    raw: RawHandle,
    state: HandleState,
    _kind: PhantomData<K>,
}

pub type SystemHandle = NativeHandle<System>;
pub type SceneHandle = NativeHandle<Scene>;

impl<K: HandleKind> Default for NativeHandle<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: HandleKind> NativeHandle<K> {
    /// A handle that does not refer to anything yet
    pub const fn new() -> Self {
        Self {
            raw: RawHandle::NULL,
            state: HandleState::Unbound,
            _kind: PhantomData,
        }
    }

    pub fn state(&self) -> HandleState {
        self.state
    }

    /// True only while bound to a live engine resource
    pub fn has_handle(&self) -> bool {
        self.state == HandleState::Bound
    }

    /// Raw token, present only while bound
    pub fn raw(&self) -> Option<RawHandle> {
        self.has_handle().then_some(self.raw)
    }

    /// Free the engine resource.
    ///
    /// The handle becomes `Released` whether or not the engine reports
    /// success: the free has been attempted and must not be issued twice.
    pub fn release<E: PropagationEngine + ?Sized>(
        &mut self,
        engine: &E,
    ) -> NativeResult<ReleaseStatus> {
        match self.state {
            HandleState::Unbound => Ok(ReleaseStatus::NotBound),
            HandleState::Released => {
                tracing::debug!("{} handle already released", K::NAME);
                Ok(ReleaseStatus::AlreadyReleased)
            }
            HandleState::Bound => {
                let code = K::release_raw(engine, self.raw);
                self.raw = RawHandle::NULL;
                self.state = HandleState::Released;
                code.into_result().map(|()| ReleaseStatus::Released)
            }
        }
    }

    /// Bind the output of a create call, or stay `Unbound` on failure.
    fn bind(&mut self, code: ResultCode, raw: RawHandle) -> NativeResult<()> {
        code.into_result()?;
        if raw.is_null() {
            // Engine claimed success but produced nothing
            return Err(NativeError::Memory);
        }
        self.raw = raw;
        self.state = HandleState::Bound;
        Ok(())
    }

    fn ensure_unbound(&self) -> NativeResult<()> {
        if self.state == HandleState::Unbound {
            Ok(())
        } else {
            tracing::error!(
                "{} handle is {:?}; create is only valid on an unbound handle",
                K::NAME,
                self.state
            );
            Err(NativeError::InvalidParam)
        }
    }
}

impl NativeHandle<System> {
    /// Create the engine instance
    pub fn create<E: PropagationEngine + ?Sized>(&mut self, engine: &E) -> NativeResult<()> {
        self.ensure_unbound()?;
        let mut raw = RawHandle::NULL;
        let code = engine.system_create(&mut raw);
        self.bind(code, raw)
    }
}

impl NativeHandle<Scene> {
    /// Create a scene owned by `system`.
    ///
    /// Fails without calling the engine when `system` is not bound.
    pub fn create<E: PropagationEngine + ?Sized>(
        &mut self,
        engine: &E,
        system: &SystemHandle,
    ) -> NativeResult<()> {
        self.ensure_unbound()?;
        let Some(system_raw) = system.raw() else {
            tracing::error!("Scene creation requires a bound system handle");
            return Err(NativeError::InvalidParam);
        };
        let mut raw = RawHandle::NULL;
        let code = engine.system_create_scene(system_raw, &mut raw);
        self.bind(code, raw)
    }
}
