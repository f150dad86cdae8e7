//! Nether Acoustics - runtime binding for a native acoustic propagation engine
//!
//! This crate drives an opaque, natively linked propagation engine: it owns
//! the engine's resources, marshals host geometry across the foreign
//! boundary, sequences scene setup and runs the per-tick occlusion loop that
//! feeds an audio middleware.
//!
//! # Architecture
//!
//! - [`PropagationEngine`] - The foreign boundary as a trait ([`ffi::LinkedEngine`] with `native`)
//! - [`NativeHandle`] - Create/release lifecycle of one engine resource
//! - [`GeometryMarshaler`] - Pins mesh buffers for exactly one `AddMesh` call
//! - [`AcousticContext`] - Owns the engine, handles and ingested meshes
//! - [`SceneBuilder`] - Ordered, short-circuiting scene setup
//! - [`SimulationLoop`] - Cooperative simulate/query/forward task
//! - [`ParameterSink`] / [`ConvolutionHost`] - Audio middleware capabilities

pub mod builder;
pub mod config;
pub mod context;
pub mod debug;
pub mod engine;
pub mod error;
#[cfg(feature = "native")]
pub mod ffi;
pub mod handle;
#[cfg(test)]
mod integration;
pub mod marshal;
pub mod middleware;
pub mod simulation;
#[cfg(test)]
pub mod test_utils;

pub use builder::{SceneBuilder, SetupFailure, SetupReport, SetupStage};
pub use config::{AcousticsConfig, ConfigError};
pub use context::{AcousticContext, ShutdownReport, VoxelGridDescriptor, VoxelSample};
pub use debug::{DebugRegistration, NATIVE_LOG_TARGET};
pub use engine::PropagationEngine;
pub use error::CheckResult;
pub use handle::{HandleState, NativeHandle, ReleaseStatus, SceneHandle, SystemHandle};
pub use marshal::{
    AcousticGeometry, GeometryMarshaler, IngestError, IngestReport, MeshData, MeshRecord,
    SkipReason, Transform,
};
pub use middleware::{
    ChannelGroupId, ConvolutionHost, EffectType, ImpulseResponse, ImpulseResponseError,
    ImpulseResponseInjector, InjectionOutcome, MiddlewareError, ParameterSink, TracingSink,
};
pub use simulation::{
    CancelFlag, LoopReport, OcclusionNormalization, Positioned, QueryPointPolicy,
    SimulationLoop, SimulationSettings, StaticPosition, StopReason, TickOutcome, TrackedEmitter,
};

// Re-export boundary types for convenience
pub use nether_acoustics_shared::{NativeError, NativeResult, ResultCode};
