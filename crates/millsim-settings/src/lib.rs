//! millsim Settings Crate
//!
//! Handles simulator configuration: stock block geometry, default tooling and
//! path traversal parameters, persisted as JSON or TOML.

pub mod config;
pub mod error;

pub use config::{BlockSettings, Config, SimulationSettings, ToolSettings};
pub use error::{ConfigError, ConfigResult, SettingsError, SettingsResult};
