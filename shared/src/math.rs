//! Vector types as laid out on the native side
//!
//! Plain `#[repr(C)]` PODs mirroring the engine's vector and quaternion
//! structs, with conversions to and from glam.

use bytemuck::{Pod, Zeroable};
use glam::{Quat, Vec3};

/// Three-component vector (12 bytes, X/Y/Z order)
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct PlVector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl PlVector {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Same value in all three components
    pub const fn splat(value: f32) -> Self {
        Self::new(value, value, value)
    }
}

impl From<Vec3> for PlVector {
    fn from(v: Vec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<PlVector> for Vec3 {
    fn from(v: PlVector) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

impl From<[f32; 3]> for PlVector {
    fn from([x, y, z]: [f32; 3]) -> Self {
        Self::new(x, y, z)
    }
}

/// Quaternion rotation (16 bytes, X/Y/Z/W order)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PlQuaternion {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl PlQuaternion {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };
}

impl Default for PlQuaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl From<Quat> for PlQuaternion {
    fn from(q: Quat) -> Self {
        Self {
            x: q.x,
            y: q.y,
            z: q.z,
            w: q.w,
        }
    }
}

impl From<PlQuaternion> for Quat {
    fn from(q: PlQuaternion) -> Self {
        Quat::from_xyzw(q.x, q.y, q.z, q.w)
    }
}
