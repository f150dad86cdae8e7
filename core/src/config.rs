//! Configuration management (acoustics.toml)
//!
//! Scene, simulation and middleware settings, stored as TOML in the
//! platform-specific config directory. Every field has a default, so an
//! empty or partial file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::context::VoxelGridDescriptor;
use crate::simulation::{OcclusionNormalization, QueryPointPolicy};

/// File name inside [`config_dir`]
pub const CONFIG_FILE_NAME: &str = "acoustics.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read or write config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("no config directory available on this platform")]
    NoConfigDir,
}

/// Acoustics configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AcousticsConfig {
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub middleware: MiddlewareConfig,
}

/// Scene setup settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Full size of the simulated volume along X/Y/Z (default: 10x10x10)
    #[serde(default = "default_extent")]
    pub extent: [f32; 3],
    /// Edge length of one voxel (default: 1.0)
    #[serde(default = "default_voxel_size")]
    pub voxel_size: f32,
    /// Open the engine's visualization after setup (default: false)
    #[serde(default)]
    pub debug_view: bool,
}

/// Per-tick simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Delay between ticks in milliseconds (default: 100)
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Middleware parameter receiving the occlusion value (default: "Occlusion")
    #[serde(default = "default_parameter_name")]
    pub parameter_name: String,
    /// How the occlusion query point is assembled from listener and emitter
    #[serde(default)]
    pub query_point: QueryPointPolicy,
    /// How the raw engine value is mapped into [0, 1]
    #[serde(default)]
    pub normalization: OcclusionNormalization,
}

/// Audio middleware settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiddlewareConfig {
    /// Impulse response WAV to inject into the convolution reverb, if any
    #[serde(default)]
    pub impulse_response: Option<PathBuf>,
    /// Wait before looking for the reverb effect, in milliseconds (default: 1000)
    #[serde(default = "default_startup_delay_ms")]
    pub startup_delay_ms: u64,
    /// Effect parameter slot receiving the impulse response (default: 0)
    #[serde(default)]
    pub parameter_slot: i32,
}

fn default_extent() -> [f32; 3] {
    [10.0, 10.0, 10.0]
}
fn default_voxel_size() -> f32 {
    1.0
}
fn default_tick_interval_ms() -> u64 {
    100
}
fn default_parameter_name() -> String {
    "Occlusion".to_string()
}
fn default_startup_delay_ms() -> u64 {
    1000
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            extent: default_extent(),
            voxel_size: default_voxel_size(),
            debug_view: false,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            parameter_name: default_parameter_name(),
            query_point: QueryPointPolicy::default(),
            normalization: OcclusionNormalization::default(),
        }
    }
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            impulse_response: None,
            startup_delay_ms: default_startup_delay_ms(),
            parameter_slot: 0,
        }
    }
}

impl SceneConfig {
    pub fn extent(&self) -> Vec3 {
        Vec3::from_array(self.extent)
    }

    /// Voxel grid described by this section
    pub fn voxel_grid(&self) -> Result<VoxelGridDescriptor, ConfigError> {
        VoxelGridDescriptor::new(self.extent(), self.voxel_size).map_err(|_| {
            ConfigError::Invalid(format!(
                "scene.extent {:?} and scene.voxel_size {} must be positive and finite",
                self.extent, self.voxel_size
            ))
        })
    }
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl MiddlewareConfig {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }
}

impl AcousticsConfig {
    /// Reject values the runtime cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scene.voxel_grid()?;
        if self.simulation.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "simulation.tick_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.simulation.parameter_name.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "simulation.parameter_name must not be empty".to_string(),
            ));
        }
        if let Some(path) = &self.middleware.impulse_response
            && !path.is_file()
        {
            return Err(ConfigError::Invalid(format!(
                "middleware.impulse_response {} does not exist",
                path.display()
            )));
        }
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load and validate a config file, surfacing every error
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write this config to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }
}

/// Returns the platform-specific configuration directory.
///
/// On Windows: `%APPDATA%\Nethercore\Acoustics\config`
/// On macOS: `~/Library/Application Support/io.nethercore.Acoustics`
/// On Linux: `~/.config/acoustics`
///
/// Returns `None` if the home directory cannot be determined.
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "nethercore", "acoustics")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Loads the configuration from the platform config directory.
///
/// Returns defaults if the file doesn't exist; a file that exists but
/// fails to parse or validate is logged and replaced by defaults.
pub fn load() -> AcousticsConfig {
    let Some(path) = config_dir().map(|dir| dir.join(CONFIG_FILE_NAME)) else {
        return AcousticsConfig::default();
    };
    if !path.exists() {
        return AcousticsConfig::default();
    }
    AcousticsConfig::load_from(&path).unwrap_or_else(|error| {
        tracing::warn!("Ignoring {}: {}", path.display(), error);
        AcousticsConfig::default()
    })
}

/// Saves the configuration to the platform config directory.
pub fn save(config: &AcousticsConfig) -> Result<(), ConfigError> {
    let dir = config_dir().ok_or(ConfigError::NoConfigDir)?;
    config.save_to(&dir.join(CONFIG_FILE_NAME))
}
