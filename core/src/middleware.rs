//! Audio middleware adapters
//!
//! Backends are described by capability traits rather than a runtime
//! switch. Every backend implements [`ParameterSink`]; backends that host a
//! convolution reverb also implement [`ConvolutionHost`], which lets an
//! [`ImpulseResponseInjector`] load a decoded impulse response into the
//! reverb once the effect graph is up.

mod impulse;

pub use impulse::{ImpulseResponse, ImpulseResponseError};

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::config::MiddlewareConfig;
use crate::simulation::TrackedEmitter;

#[derive(Debug, thiserror::Error)]
pub enum MiddlewareError {
    #[error("parameter '{name}' was rejected: {reason}")]
    ParameterRejected { name: String, reason: String },
    #[error("channel group {0} is not available")]
    ChannelGroupUnavailable(ChannelGroupId),
    #[error("effect {index} on channel group {group} is not available")]
    EffectUnavailable { group: ChannelGroupId, index: usize },
    #[error("effect {index} on channel group {group} rejected parameter data: {reason}")]
    ParameterDataRejected {
        group: ChannelGroupId,
        index: usize,
        reason: String,
    },
    #[error("impulse response payload: {0}")]
    Payload(#[from] ImpulseResponseError),
}

/// Minimum capability: named scalar parameters
pub trait ParameterSink {
    fn set_scalar_parameter(&self, name: &str, value: f32) -> Result<(), MiddlewareError>;
}

impl<S: ParameterSink + ?Sized> ParameterSink for &S {
    fn set_scalar_parameter(&self, name: &str, value: f32) -> Result<(), MiddlewareError> {
        (**self).set_scalar_parameter(name, value)
    }
}

/// Sink that only logs each value; used when no audio backend is attached
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl ParameterSink for TracingSink {
    fn set_scalar_parameter(&self, name: &str, value: f32) -> Result<(), MiddlewareError> {
        tracing::info!(parameter = name, value, "Parameter update");
        Ok(())
    }
}

/// Backend-defined identifier of a mixer channel group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelGroupId(pub u64);

impl std::fmt::Display for ChannelGroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind of an effect attached to a channel group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectType {
    ConvolutionReverb,
    /// Any other backend effect, by its backend type id
    Other(u32),
}

/// Backend that exposes per-channel-group effects with raw parameter data
pub trait ConvolutionHost: ParameterSink {
    fn effect_count(&self, group: ChannelGroupId) -> Result<usize, MiddlewareError>;

    fn effect_type(&self, group: ChannelGroupId, index: usize)
    -> Result<EffectType, MiddlewareError>;

    /// Write an opaque parameter block into effect `index`, slot `slot`
    fn set_effect_parameter_data(
        &self,
        group: ChannelGroupId,
        index: usize,
        slot: i32,
        data: &[u8],
    ) -> Result<(), MiddlewareError>;
}

/// First convolution reverb attached to `group`, if any
pub fn find_convolution_reverb<H: ConvolutionHost + ?Sized>(
    host: &H,
    group: ChannelGroupId,
) -> Result<Option<usize>, MiddlewareError> {
    for index in 0..host.effect_count(group)? {
        if host.effect_type(group, index)? == EffectType::ConvolutionReverb {
            return Ok(Some(index));
        }
    }
    Ok(None)
}

/// What an injection attempt did
#[derive(Debug)]
pub enum InjectionOutcome {
    Injected { effect_index: usize },
    /// Emitter no longer existed after the startup delay
    EmitterGone,
    /// No convolution reverb on the channel group
    EffectNotFound,
    Failed(MiddlewareError),
    /// This injector already made its one attempt
    AlreadyAttempted,
}

/// Loads an impulse response into a convolution reverb, at most once
#[derive(Debug)]
pub struct ImpulseResponseInjector {
    response: ImpulseResponse,
    group: ChannelGroupId,
    parameter_slot: i32,
    startup_delay: Duration,
    attempted: AtomicBool,
}

impl ImpulseResponseInjector {
    pub fn new(
        response: ImpulseResponse,
        group: ChannelGroupId,
        parameter_slot: i32,
        startup_delay: Duration,
    ) -> Self {
        Self {
            response,
            group,
            parameter_slot,
            startup_delay,
            attempted: AtomicBool::new(false),
        }
    }

    /// Build the injector described by a `[middleware]` section.
    ///
    /// Returns `Ok(None)` when no impulse response is configured. The WAV is
    /// decoded up front, so a broken file is reported before any audio runs.
    pub fn from_config(
        config: &MiddlewareConfig,
        group: ChannelGroupId,
    ) -> Result<Option<Self>, ImpulseResponseError> {
        let Some(path) = &config.impulse_response else {
            return Ok(None);
        };
        tracing::debug!("Loading impulse response {}", path.display());
        let response = ImpulseResponse::from_wav_path(path)?;
        Ok(Some(Self::new(
            response,
            group,
            config.parameter_slot,
            config.startup_delay(),
        )))
    }

    pub fn response(&self) -> &ImpulseResponse {
        &self.response
    }

    pub fn group(&self) -> ChannelGroupId {
        self.group
    }

    pub fn parameter_slot(&self) -> i32 {
        self.parameter_slot
    }

    pub fn startup_delay(&self) -> Duration {
        self.startup_delay
    }

    pub fn has_attempted(&self) -> bool {
        self.attempted.load(Ordering::Acquire)
    }

    /// Wait for the startup delay, then inject into the first convolution
    /// reverb on the channel group. Never retried: every call after the
    /// first returns [`InjectionOutcome::AlreadyAttempted`].
    pub async fn run<H, T>(&self, host: &H, emitter: &T) -> InjectionOutcome
    where
        H: ConvolutionHost + ?Sized,
        T: TrackedEmitter + ?Sized,
    {
        if self.attempted.swap(true, Ordering::AcqRel) {
            return InjectionOutcome::AlreadyAttempted;
        }

        tokio::time::sleep(self.startup_delay).await;

        if !emitter.exists() {
            tracing::warn!("Emitter disappeared before impulse response injection; abandoning");
            return InjectionOutcome::EmitterGone;
        }

        let outcome = self.inject(host);
        match &outcome {
            InjectionOutcome::Injected { effect_index } => tracing::info!(
                group = %self.group,
                effect = effect_index,
                channels = self.response.channels(),
                frames = self.response.frames(),
                "Impulse response injected"
            ),
            InjectionOutcome::EffectNotFound => tracing::warn!(
                group = %self.group,
                "No convolution reverb found on channel group; abandoning injection"
            ),
            InjectionOutcome::Failed(error) => {
                tracing::error!(group = %self.group, "Impulse response injection failed: {}", error)
            }
            InjectionOutcome::EmitterGone | InjectionOutcome::AlreadyAttempted => {}
        }
        outcome
    }

    fn inject<H: ConvolutionHost + ?Sized>(&self, host: &H) -> InjectionOutcome {
        let effect_index = match find_convolution_reverb(host, self.group) {
            Ok(Some(index)) => index,
            Ok(None) => return InjectionOutcome::EffectNotFound,
            Err(error) => return InjectionOutcome::Failed(error),
        };
        let payload = match self.response.parameter_data() {
            Ok(payload) => payload,
            Err(error) => return InjectionOutcome::Failed(error.into()),
        };
        match host.set_effect_parameter_data(
            self.group,
            effect_index,
            self.parameter_slot,
            &payload,
        ) {
            Ok(()) => InjectionOutcome::Injected { effect_index },
            Err(error) => InjectionOutcome::Failed(error),
        }
    }
}
