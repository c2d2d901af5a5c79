//! # millsim Core
//!
//! Core types shared by every millsim crate:
//! - the error taxonomy (load-time errors, configuration, simulation)
//! - cutter geometry ([`ToolShape`], [`ToolSpec`]) and the tool-suffix convention
//! - program-to-scene coordinate conversion for waypoints

pub mod error;
pub mod geometry;
pub mod tool;

pub use error::{Error, ProgramError, Result, SimulationError, StockError, ToolSpecError};
pub use geometry::{program_to_scene, PROGRAM_TO_SCENE_SCALE};
pub use tool::{ToolShape, ToolSpec};
