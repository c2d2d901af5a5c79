//! Parsed machining commands

use glam::Vec3;
use millsim_core::program_to_scene;
use serde::{Deserialize, Serialize};

/// A single parsed program line
///
/// `Invalid` marks a line with a recognized command code whose parameters
/// failed to parse. It does not end the program.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// G01 linear move to a program-space point
    LinearMove {
        /// Target X in program units
        x: f32,
        /// Target Y in program units
        y: f32,
        /// Target Z in program units
        z: f32,
    },
    /// Recognized command with unparseable parameters
    Invalid,
}

impl Command {
    /// Check if this command failed to parse
    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid)
    }

    /// Scene-space waypoint for a move; `None` for invalid commands
    pub fn to_waypoint(&self) -> Option<Vec3> {
        match *self {
            Self::LinearMove { x, y, z } => Some(program_to_scene(x, y, z)),
            Self::Invalid => None,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LinearMove { x, y, z } => write!(f, "G01 X{:.3} Y{:.3} Z{:.3}", x, y, z),
            Self::Invalid => write!(f, "<invalid>"),
        }
    }
}

/// Convert a command sequence into scene-space waypoints, skipping invalid entries
pub fn waypoints<'a>(commands: impl IntoIterator<Item = &'a Command>) -> Vec<Vec3> {
    commands
        .into_iter()
        .filter_map(Command::to_waypoint)
        .collect()
}
