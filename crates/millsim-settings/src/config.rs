//! Configuration for the milling simulator
//!
//! Provides configuration file handling and validation. Supports JSON and
//! TOML file formats, with a default location in the platform configuration
//! directory.
//!
//! Configuration is organized into logical sections:
//! - Block settings (grid resolution, world extent, safety floor)
//! - Tool settings (fallback cutter, blade height)
//! - Simulation settings (traversal speed, sampling density)

use glam::Vec3;
use millsim_core::{ToolShape, ToolSpec};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ConfigError, ConfigResult, SettingsResult};

/// Stock block settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockSettings {
    /// Heightmap cells along X
    pub grid_width: u32,
    /// Heightmap cells along Z
    pub grid_height: u32,
    /// World-space extent (x, y, z)
    pub size: Vec3,
    /// World-space translation; the block is centred on it in x/z and its
    /// base sits at `position.y`
    pub position: Vec3,
    /// Normalized height below which cutting is reported as over-depth
    pub min_height: f32,
}

impl Default for BlockSettings {
    fn default() -> Self {
        Self {
            grid_width: 1000,
            grid_height: 1000,
            size: Vec3::new(10.0, 4.0, 10.0),
            position: Vec3::ZERO,
            min_height: 0.0,
        }
    }
}

/// Cutter settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    /// Tip profile used when a program name does not encode one
    pub shape: ToolShape,
    /// Radius used when a program name does not encode one
    pub radius: f32,
    /// Length of the cutting part above the tip, in world units
    pub blade_height: f32,
}

impl ToolSettings {
    /// Fallback tool as a [`ToolSpec`]
    pub fn tool_spec(&self) -> ToolSpec {
        ToolSpec::new(self.shape, self.radius)
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            shape: ToolShape::Flat,
            radius: 0.5,
            blade_height: 2.0,
        }
    }
}

/// Path traversal settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Scene units travelled per second of `update` time
    pub speed: f32,
    /// Sample spacing as a fraction of the tool radius
    pub sample_factor: f32,
    /// Minimum |Δy| for a segment to count as vertical
    pub vertical_epsilon: f32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            speed: 1.0,
            sample_factor: 0.1,
            vertical_epsilon: 1e-4,
        }
    }
}

/// Complete simulator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Stock block
    pub block: BlockSettings,
    /// Cutter defaults
    pub tool: ToolSettings,
    /// Traversal parameters
    pub simulation: SimulationSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Json,
    Toml,
}

fn format_of(path: &Path) -> ConfigResult<Format> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(Format::Json),
        Some("toml") => Ok(Format::Toml),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Default config file location: `<config dir>/millsim/config.toml`
    pub fn default_path() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("millsim").join("config.toml"))
            .ok_or(ConfigError::UnsupportedPlatform)
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = format_of(path)?;
        let content = std::fs::read_to_string(path)?;

        let config: Self = match format {
            Format::Json => serde_json::from_str(&content)?,
            Format::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load config from `path` if it exists, otherwise return defaults
    pub fn load_or_default(path: &Path) -> SettingsResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            info!(path = %path.display(), "No configuration file, using defaults");
            Ok(Self::default())
        }
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match format_of(path)? {
            Format::Json => serde_json::to_string_pretty(self)?,
            Format::Toml => toml::to_string_pretty(self)?,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, content)?;
        debug!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let block = &self.block;
        if block.grid_width == 0 {
            return Err(ConfigError::out_of_range("block.grid_width", 0));
        }
        if block.grid_height == 0 {
            return Err(ConfigError::out_of_range("block.grid_height", 0));
        }
        if !(block.size.x > 0.0 && block.size.y > 0.0 && block.size.z > 0.0) {
            return Err(ConfigError::out_of_range("block.size", block.size));
        }
        if !(0.0..=1.0).contains(&block.min_height) {
            return Err(ConfigError::out_of_range(
                "block.min_height",
                block.min_height,
            ));
        }

        if !(self.tool.radius > 0.0) {
            return Err(ConfigError::out_of_range("tool.radius", self.tool.radius));
        }
        if !(self.tool.blade_height > 0.0) {
            return Err(ConfigError::out_of_range(
                "tool.blade_height",
                self.tool.blade_height,
            ));
        }

        let sim = &self.simulation;
        if !(sim.speed > 0.0) {
            return Err(ConfigError::out_of_range("simulation.speed", sim.speed));
        }
        if !(sim.sample_factor > 0.0 && sim.sample_factor <= 1.0) {
            return Err(ConfigError::out_of_range(
                "simulation.sample_factor",
                sim.sample_factor,
            ));
        }
        if !(sim.vertical_epsilon >= 0.0) {
            return Err(ConfigError::out_of_range(
                "simulation.vertical_epsilon",
                sim.vertical_epsilon,
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SettingsError;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_validate() {
        let config = Config::new();
        assert!(config.validate().is_ok());
        assert_eq!(config.block.grid_width, 1000);
        assert_eq!(config.block.size, Vec3::new(10.0, 4.0, 10.0));
        assert_eq!(config.tool.blade_height, 2.0);
        assert_eq!(config.simulation.sample_factor, 0.1);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = Config::default();
        config.block.min_height = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValueOutOfRange { ref key, .. }) if key == "block.min_height"
        ));

        let mut config = Config::default();
        config.tool.radius = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.simulation.speed = f32::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.block.grid_width = 256;
        config.tool.shape = ToolShape::Ball;
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.simulation.speed = 4.0;
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.simulation.speed, 4.0);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[tool]\nshape = \"ball\"\nradius = 0.8\n").unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.tool.shape, ToolShape::Ball);
        assert_eq!(loaded.tool.radius, 0.8);
        assert_eq!(loaded.tool.blade_height, 2.0);
        assert_eq!(loaded.block, BlockSettings::default());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "").unwrap();

        assert!(matches!(
            Config::load_from_file(&path),
            Err(SettingsError::Config(ConfigError::UnsupportedFormat(_)))
        ));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_file_is_rejected_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[block]\ngrid_width = 0\n").unwrap();

        assert!(matches!(
            Config::load_from_file(&path),
            Err(SettingsError::Config(ConfigError::ValueOutOfRange { .. }))
        ));
    }
}
