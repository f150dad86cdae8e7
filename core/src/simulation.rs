//! Per-tick simulation and occlusion loop
//!
//! [`SimulationLoop::run`] is a cooperative task: each iteration checks
//! liveness, re-simulates for the current listener position, samples the
//! occlusion at the policy's query point and forwards the normalized value
//! to a [`ParameterSink`]. The only suspension point is the sleep between
//! iterations; cancellation is observed at the top of an iteration, never
//! during a native call.

mod policy;

pub use policy::{OcclusionNormalization, QueryPointPolicy};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use glam::Vec3;
use nether_acoustics_shared::NativeError;

use crate::config::SimulationConfig;
use crate::context::AcousticContext;
use crate::engine::PropagationEngine;
use crate::middleware::{MiddlewareError, ParameterSink};

/// Anything with a world-space position (listener, emitter)
pub trait Positioned {
    fn world_position(&self) -> Vec3;
}

/// Sound source the loop follows
pub trait TrackedEmitter: Positioned {
    /// The host object still exists
    fn exists(&self) -> bool;

    /// The source is currently playing
    fn is_active(&self) -> bool;

    fn is_live(&self) -> bool {
        self.exists() && self.is_active()
    }
}

/// A fixed point, for listeners or emitters that never move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticPosition(pub Vec3);

impl Positioned for StaticPosition {
    fn world_position(&self) -> Vec3 {
        self.0
    }
}

/// A fixed emitter never stops; bound its run with a tick limit or cancel flag
impl TrackedEmitter for StaticPosition {
    fn exists(&self) -> bool {
        true
    }

    fn is_active(&self) -> bool {
        true
    }
}

/// Cooperative stop request, observed between iterations
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Loop parameters
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    pub tick_interval: Duration,
    pub parameter_name: String,
    pub query_point: QueryPointPolicy,
    pub normalization: OcclusionNormalization,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self::from(&SimulationConfig::default())
    }
}

impl From<&SimulationConfig> for SimulationSettings {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            parameter_name: config.parameter_name.clone(),
            query_point: config.query_point,
            normalization: config.normalization,
        }
    }
}

/// Result of one iteration
#[derive(Debug)]
pub enum TickOutcome {
    /// Normalized value handed to the sink
    Forwarded { raw: f32, value: f32 },
    /// `Simulate` failed; no occlusion was sampled this tick
    SimulateFailed(NativeError),
    /// `GetOcclusion` failed; nothing was forwarded this tick
    OcclusionFailed(NativeError),
    /// The sink rejected the value
    SinkFailed(MiddlewareError),
}

/// Why the loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Emitter gone or no longer active
    EmitterInactive,
    Cancelled,
    TickLimit,
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct LoopReport {
    pub ticks: u64,
    pub forwarded: u64,
    pub failed: u64,
    pub last_value: Option<f32>,
    pub stop: StopReason,
}

/// Drives simulate/query/forward once per tick
#[derive(Debug, Clone)]
pub struct SimulationLoop {
    settings: SimulationSettings,
    cancel: CancelFlag,
    max_ticks: Option<u64>,
}

impl SimulationLoop {
    pub fn new(settings: SimulationSettings) -> Self {
        Self {
            settings,
            cancel: CancelFlag::new(),
            max_ticks: None,
        }
    }

    /// Share an externally owned cancel flag
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Stop right after the `ticks`-th iteration even if the emitter stays live
    pub fn with_tick_limit(mut self, ticks: u64) -> Self {
        self.max_ticks = Some(ticks);
        self
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    /// Handle that stops this loop at the next iteration boundary
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// One iteration for the given listener and emitter positions
    pub fn tick<E, S>(
        &self,
        context: &AcousticContext<E>,
        sink: &S,
        listener: Vec3,
        emitter: Vec3,
    ) -> TickOutcome
    where
        E: PropagationEngine,
        S: ParameterSink + ?Sized,
    {
        if let Err(error) = context.simulate(listener) {
            return TickOutcome::SimulateFailed(error);
        }

        let point = self.settings.query_point.query_point(listener, emitter);
        let raw = match context.occlusion(point) {
            Ok(raw) => raw,
            Err(error) => return TickOutcome::OcclusionFailed(error),
        };
        let value = self.settings.normalization.normalize(raw);

        match sink.set_scalar_parameter(&self.settings.parameter_name, value) {
            Ok(()) => TickOutcome::Forwarded { raw, value },
            Err(error) => {
                tracing::warn!(
                    parameter = %self.settings.parameter_name,
                    value,
                    "Failed to forward occlusion: {}",
                    error
                );
                TickOutcome::SinkFailed(error)
            }
        }
    }

    /// Run until the emitter stops being live, the flag is cancelled or the
    /// tick limit is reached.
    pub async fn run<E, S, L, T>(
        &self,
        context: &AcousticContext<E>,
        sink: &S,
        listener: &L,
        emitter: &T,
    ) -> LoopReport
    where
        E: PropagationEngine,
        S: ParameterSink + ?Sized,
        L: Positioned + ?Sized,
        T: TrackedEmitter + ?Sized,
    {
        let mut ticks = 0u64;
        let mut forwarded = 0u64;
        let mut failed = 0u64;
        let mut last_value = None;

        let stop = loop {
            if self.cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            if !emitter.is_live() {
                break StopReason::EmitterInactive;
            }
            if self.max_ticks.is_some_and(|max| ticks >= max) {
                break StopReason::TickLimit;
            }

            let listener_position = listener.world_position();
            let emitter_position = emitter.world_position();
            match self.tick(context, sink, listener_position, emitter_position) {
                TickOutcome::Forwarded { raw, value } => {
                    tracing::debug!(tick = ticks, raw, value, "Occlusion forwarded");
                    forwarded += 1;
                    last_value = Some(value);
                }
                _ => failed += 1,
            }
            ticks += 1;
            if self.max_ticks.is_some_and(|max| ticks >= max) {
                break StopReason::TickLimit;
            }

            tokio::time::sleep(self.settings.tick_interval).await;
        };

        tracing::info!(ticks, forwarded, failed, ?stop, "Simulation loop stopped");
        LoopReport {
            ticks,
            forwarded,
            failed,
            last_value,
            stop,
        }
    }
}
