//! Tool masks
//!
//! A mask is the cutter's cross-section rasterized at the block's cell pitch.
//! Each value is the height of the tool surface above the tool tip, in
//! normalized grid height units. Cells of the bounding rectangle that lie
//! outside the circular footprint hold [`NO_CONTACT`].

use glam::Vec2;
use millsim_core::{ToolShape, ToolSpec};

/// Mask value for cells the tool never touches
pub const NO_CONTACT: f32 = 1.0;

/// Height of a ball tip above its lowest point at planar distance `d` from
/// the tool axis, divided by `height_scale` (the block's world height).
///
/// Only meaningful for `0 <= d <= radius`.
pub fn ball_offset(radius: f32, d: f32, height_scale: f32) -> f32 {
    let under = (radius * radius - d * d).max(0.0);
    (radius - under.sqrt()) / height_scale
}

/// Rectangular grid of depth offsets
#[derive(Debug, Clone, PartialEq)]
pub struct MillingMask {
    width: u32,
    height: u32,
    values: Vec<f32>,
}

impl MillingMask {
    /// Create a mask with every cell set to `value`
    pub fn filled(width: u32, height: u32, value: f32) -> Self {
        Self {
            width,
            height,
            values: vec![value; (width as usize) * (height as usize)],
        }
    }

    /// Create a mask from row-major values
    ///
    /// Returns `None` if `values` does not hold exactly `width * height` cells.
    pub fn from_values(width: u32, height: u32, values: Vec<f32>) -> Option<Self> {
        if values.len() != (width as usize) * (height as usize) {
            return None;
        }
        Some(Self {
            width,
            height,
            values,
        })
    }

    /// Rasterize a cutter footprint
    ///
    /// `pitch` is the block's world size per cell along (x, z) and
    /// `height_scale` its world height, so that mask values share the block's
    /// normalized units. The mask is `2n + 1` cells wide on each axis with the
    /// tool axis on the centre cell.
    pub fn for_tool(tool: &ToolSpec, pitch: Vec2, height_scale: f32) -> Self {
        let half_x = (tool.radius / pitch.x).ceil().max(0.0) as u32;
        let half_y = (tool.radius / pitch.y).ceil().max(0.0) as u32;
        let width = half_x * 2 + 1;
        let height = half_y * 2 + 1;

        let mut values = Vec::with_capacity((width as usize) * (height as usize));
        for j in 0..height {
            for i in 0..width {
                let dx = (i as f32 - half_x as f32) * pitch.x;
                let dy = (j as f32 - half_y as f32) * pitch.y;
                let d = (dx * dx + dy * dy).sqrt();

                let value = if d > tool.radius {
                    NO_CONTACT
                } else {
                    match tool.shape {
                        ToolShape::Flat => 0.0,
                        ToolShape::Ball => ball_offset(tool.radius, d, height_scale),
                    }
                };
                values.push(value);
            }
        }

        Self {
            width,
            height,
            values,
        }
    }

    /// Width in cells
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in cells
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Centre cell, where the tool axis sits
    pub fn center(&self) -> (u32, u32) {
        (self.width / 2, self.height / 2)
    }

    /// Row-major values
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Value at a mask cell
    pub fn get(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.values
            .get((y as usize) * (self.width as usize) + x as usize)
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_mask_shape() {
        let tool = ToolSpec::new(ToolShape::Flat, 0.5);
        let mask = MillingMask::for_tool(&tool, Vec2::splat(0.25), 4.0);

        assert_eq!((mask.width(), mask.height()), (5, 5));
        assert_eq!(mask.center(), (2, 2));
        assert_eq!(mask.get(2, 2), Some(0.0));
        assert_eq!(mask.get(4, 2), Some(0.0));
        // Corner is outside the circle
        assert_eq!(mask.get(0, 0), Some(NO_CONTACT));
    }

    #[test]
    fn test_ball_mask_center_and_edge() {
        let tool = ToolSpec::new(ToolShape::Ball, 0.5);
        let mask = MillingMask::for_tool(&tool, Vec2::splat(0.125), 2.0);

        assert_eq!(mask.width(), 9);
        assert_eq!(mask.get(4, 4), Some(0.0));
        let rim = mask.get(8, 4).unwrap();
        assert!((rim - 0.25).abs() < 1e-5, "rim offset {rim}");
    }

    #[test]
    fn test_ball_offset_increases_with_distance() {
        let radius = 0.8;
        let mut last = -1.0;
        for step in 0..80 {
            let d = step as f32 * 0.01;
            let offset = ball_offset(radius, d, 4.0);
            assert!(offset > last, "offset must increase at d={d}");
            last = offset;
        }
    }

    #[test]
    fn test_ball_offset_formula() {
        let expected = (0.5 - (0.25f32 - 0.09).sqrt()) / 2.0;
        assert!((ball_offset(0.5, 0.3, 2.0) - expected).abs() < 1e-6);
    }

    #[test]
    fn test_from_values_checks_length() {
        assert!(MillingMask::from_values(2, 2, vec![0.0; 3]).is_none());
        let mask = MillingMask::from_values(2, 1, vec![0.1, 0.2]).unwrap();
        assert_eq!(mask.get(1, 0), Some(0.2));
        assert_eq!(mask.get(2, 0), None);
    }
}
