//! Cutter geometry
//!
//! A cutter is a cylinder with either a flat or a hemispherical tip. Program
//! files encode the tool in the last four characters of their name:
//! `.f<RR>` for a flat end mill and `.k<RR>` for a ball end mill, where `RR` is
//! the diameter in tenths of a scene unit (i.e. millimetres before scaling).

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ToolSpecError;
use crate::geometry::PROGRAM_TO_SCENE_SCALE;

/// Cutter tip profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolShape {
    /// Flat-bottomed cylinder
    #[default]
    Flat,
    /// Hemispherical tip
    Ball,
}

impl ToolShape {
    /// Whether the tip is spherical
    pub fn is_spherical(&self) -> bool {
        matches!(self, Self::Ball)
    }
}

impl std::fmt::Display for ToolShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Flat => write!(f, "Flat End Mill"),
            Self::Ball => write!(f, "Ball End Mill"),
        }
    }
}

/// Shape and radius of a cutter, in scene units
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Tip profile
    pub shape: ToolShape,
    /// Radius in scene units
    pub radius: f32,
}

impl ToolSpec {
    /// Create a tool specification
    pub fn new(shape: ToolShape, radius: f32) -> Self {
        Self { shape, radius }
    }

    /// Derive the tool from a program path such as `paths/1.k16`
    pub fn from_path(path: &Path) -> Result<Self, ToolSpecError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_file_name(&name)
    }

    /// Derive the tool from the last four characters of a file name
    pub fn from_file_name(name: &str) -> Result<Self, ToolSpecError> {
        let chars: Vec<char> = name.chars().collect();
        if chars.len() < 4 || chars[chars.len() - 4] != '.' {
            return Err(ToolSpecError::MissingSuffix {
                name: name.to_string(),
            });
        }

        let suffix = &chars[chars.len() - 3..];
        let shape = match suffix[0].to_ascii_lowercase() {
            'f' => ToolShape::Flat,
            'k' => ToolShape::Ball,
            other => {
                return Err(ToolSpecError::UnknownShape {
                    name: name.to_string(),
                    shape: other,
                })
            }
        };

        let size: String = suffix[1..].iter().collect();
        if !size.chars().all(|c| c.is_ascii_digit()) {
            return Err(ToolSpecError::InvalidSize {
                name: name.to_string(),
                size,
            });
        }
        let diameter: u32 = size.parse().map_err(|_| ToolSpecError::InvalidSize {
            name: name.to_string(),
            size: size.clone(),
        })?;
        if diameter == 0 {
            return Err(ToolSpecError::ZeroRadius);
        }

        Ok(Self {
            shape,
            radius: diameter as f32 * PROGRAM_TO_SCENE_SCALE * 0.5,
        })
    }
}
