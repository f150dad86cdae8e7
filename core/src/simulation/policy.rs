//! Query point and normalization policies

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// How the occlusion query point is assembled from listener and emitter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryPointPolicy {
    /// `(emitter.x, listener.y, emitter.z)`
    #[default]
    EmitterPlanarListenerHeight,
    /// `(listener.x, emitter.y, listener.z)`
    ListenerPlanarEmitterHeight,
}

impl QueryPointPolicy {
    pub fn query_point(self, listener: Vec3, emitter: Vec3) -> Vec3 {
        match self {
            Self::EmitterPlanarListenerHeight => Vec3::new(emitter.x, listener.y, emitter.z),
            Self::ListenerPlanarEmitterHeight => Vec3::new(listener.x, emitter.y, listener.z),
        }
    }
}

/// How a raw engine occlusion value is mapped into `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcclusionNormalization {
    /// `clamp(raw, 0, 1)`
    #[default]
    Clamp,
    /// `clamp(raw - 1, 0, 1)`
    ClampOffsetOne,
}

impl OcclusionNormalization {
    /// Monotonic in `raw`; NaN maps to 0
    pub fn normalize(self, raw: f32) -> f32 {
        if raw.is_nan() {
            return 0.0;
        }
        let shifted = match self {
            Self::Clamp => raw,
            Self::ClampOffsetOne => raw - 1.0,
        };
        shifted.clamp(0.0, 1.0)
    }
}
