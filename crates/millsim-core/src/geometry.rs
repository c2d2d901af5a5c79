//! Program-space to scene-space conversion

use glam::Vec3;

/// Program units (millimetres) to scene units
pub const PROGRAM_TO_SCENE_SCALE: f32 = 0.1;

/// Convert a program-space point into a scene-space waypoint.
///
/// The machine and the scene use different axis conventions:
/// `(x, y, z)` becomes `(-x, -z, y)` before uniform scaling.
pub fn program_to_scene(x: f32, y: f32, z: f32) -> Vec3 {
    Vec3::new(-x, -z, y) * PROGRAM_TO_SCENE_SCALE
}
