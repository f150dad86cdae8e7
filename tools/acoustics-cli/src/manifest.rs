//! Scene manifest parsing
//!
//! A scene manifest lists the acoustic geometry to bake, one `[[objects]]`
//! table per host object:
//!
//! ```toml
//! [[objects]]
//! name = "floor"
//! vertices = [[-5.0, 0.0, -5.0], [5.0, 0.0, -5.0], [5.0, 0.0, 5.0], [-5.0, 0.0, 5.0]]
//! indices = [0, 1, 2, 0, 2, 3]
//! position = [0.0, 0.0, 0.0]   # optional
//! rotation = [0.0, 0.0, 0.0, 1.0]   # optional, quaternion xyzw
//! scale = [1.0, 1.0, 1.0]   # optional
//! readable = true   # optional
//! ```
//!
//! An object without vertices is kept and reported as skipped, the same as
//! a host object without mesh data.

use std::path::Path;

use anyhow::{Context, Result, bail};
use glam::{Quat, Vec3};
use nether_acoustics::{AcousticGeometry, MeshData, Transform};
use serde::Deserialize;

/// Scene manifest structure
#[derive(Debug, Deserialize)]
pub struct SceneManifest {
    #[serde(default)]
    pub objects: Vec<ObjectEntry>,
}

/// One acoustic geometry object
#[derive(Debug, Deserialize)]
pub struct ObjectEntry {
    pub name: String,
    #[serde(default)]
    pub vertices: Vec<[f32; 3]>,
    #[serde(default)]
    pub indices: Vec<u32>,
    #[serde(default)]
    pub position: [f32; 3],
    #[serde(default = "default_rotation")]
    pub rotation: [f32; 4],
    #[serde(default = "default_scale")]
    pub scale: [f32; 3],
    #[serde(default = "default_readable")]
    pub readable: bool,
}

fn default_rotation() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

fn default_scale() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_readable() -> bool {
    true
}

impl ObjectEntry {
    /// Convert to engine geometry, rejecting transforms and vertices that
    /// would reach the native engine as NaN or infinity
    pub fn to_geometry(&self) -> Result<AcousticGeometry> {
        let finite = |values: &[f32]| values.iter().all(|value| value.is_finite());
        if !finite(&self.position) || !finite(&self.scale) {
            bail!("Object '{}' has a non-finite position or scale", self.name);
        }
        let Some(rotation) = Quat::from_array(self.rotation).try_normalize() else {
            bail!(
                "Object '{}' has rotation {:?} which is not a valid quaternion",
                self.name,
                self.rotation
            );
        };
        if let Some(index) = self.vertices.iter().position(|vertex| !finite(vertex)) {
            bail!("Object '{}' has a non-finite vertex at index {}", self.name, index);
        }

        let mesh = (!self.vertices.is_empty()).then(|| MeshData {
            vertices: self.vertices.iter().copied().map(Vec3::from_array).collect(),
            indices: self.indices.clone(),
            readable: self.readable,
        });
        Ok(AcousticGeometry {
            name: self.name.clone(),
            mesh,
            transform: Transform {
                position: Vec3::from_array(self.position),
                rotation,
                scale: Vec3::from_array(self.scale),
            },
        })
    }
}

impl SceneManifest {
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!("Loading scene manifest {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene manifest: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse scene manifest: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn geometry(&self) -> Result<Vec<AcousticGeometry>> {
        self.objects.iter().map(ObjectEntry::to_geometry).collect()
    }
}
