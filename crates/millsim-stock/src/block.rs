//! Heightmap stock block
//!
//! The block is a `width × height` grid of normalized heights. In the scene it
//! is a box centred on [`position`](Block::position) (in x/z) with its base at
//! `position.y` and its extent given by [`size`](Block::size); a cell value
//! `h` sits at world height `position.y + h * size.y`.

use glam::{Vec2, Vec3};
use millsim_core::StockError;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::mask::{MillingMask, NO_CONTACT};
use crate::surface::HeightmapSurface;

/// Outcome of a single carve
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarveResult {
    /// The tool shank would have struck material above its clearance line
    pub collision_error: bool,
    /// A cell was cut below the block's safety floor
    pub depth_error: bool,
    /// At least one cell changed
    pub was_milled: bool,
}

impl CarveResult {
    /// Whether either safety flag is set
    pub fn is_unsafe(&self) -> bool {
        self.collision_error || self.depth_error
    }
}

/// Rectangle of grid cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    /// First column
    pub x: u32,
    /// First row
    pub y: u32,
    /// Number of columns
    pub width: u32,
    /// Number of rows
    pub height: u32,
}

impl Region {
    /// Smallest region covering both
    pub fn union(&self, other: &Region) -> Region {
        let x0 = self.x.min(other.x);
        let y0 = self.y.min(other.y);
        let x1 = (self.x + self.width).max(other.x + other.width);
        let y1 = (self.y + self.height).max(other.y + other.height);
        Region {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
    }
}

/// Overlap between a placed mask and the grid
struct Clip {
    /// First mask column/row inside the grid
    mask_x: u32,
    mask_y: u32,
    /// Matching grid cell
    region: Region,
}

/// Millable stock block
pub struct Block {
    heights: Vec<f32>,
    width: u32,
    height: u32,
    min_height: f32,
    size: Vec3,
    position: Vec3,
    dirty: Option<Region>,
    surface: Option<Box<dyn HeightmapSurface>>,
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("min_height", &self.min_height)
            .field("size", &self.size)
            .field("position", &self.position)
            .field("dirty", &self.dirty)
            .field("has_surface", &self.surface.is_some())
            .finish()
    }
}

impl Block {
    /// Allocate a `width × height` grid of untouched stock
    ///
    /// The block starts as a unit cube at the origin; see
    /// [`set_block_size`](Self::set_block_size) and
    /// [`set_block_position`](Self::set_block_position).
    pub fn new(width: u32, height: u32, min_height: f32) -> Result<Self, StockError> {
        if width == 0 || height == 0 {
            return Err(StockError::InvalidDimensions { width, height });
        }
        if !(0.0..=1.0).contains(&min_height) {
            return Err(StockError::InvalidMinHeight(min_height));
        }

        Ok(Self {
            heights: vec![1.0; (width as usize) * (height as usize)],
            width,
            height,
            min_height,
            size: Vec3::ONE,
            position: Vec3::ZERO,
            dirty: None,
            surface: None,
        })
    }

    /// Grid width in cells
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Normalized safety floor
    pub fn min_height(&self) -> f32 {
        self.min_height
    }

    /// Row-major heights, `width * height` values
    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    /// Height of one cell
    pub fn height_at(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.heights[self.index(x, y)])
    }

    /// World-space extent of the block
    pub fn size(&self) -> Vec3 {
        self.size
    }

    /// World-space translation of the block
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Set the world-space extent
    pub fn set_block_size(&mut self, size: Vec3) -> Result<(), StockError> {
        if size.x <= 0.0 || size.y <= 0.0 || size.z <= 0.0 {
            return Err(StockError::InvalidSize {
                x: size.x,
                y: size.y,
                z: size.z,
            });
        }
        self.size = size;
        Ok(())
    }

    /// Set the world-space translation
    pub fn set_block_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// World distance between neighbouring cells along (x, z)
    pub fn cell_pitch(&self) -> Vec2 {
        Vec2::new(
            self.size.x / self.width as f32,
            self.size.z / self.height as f32,
        )
    }

    /// Grid cell containing a world position (may be outside the grid)
    pub fn world_to_cell(&self, world: Vec3) -> (i32, i32) {
        let u = (world.x - self.position.x) / self.size.x + 0.5;
        let v = (world.z - self.position.z) / self.size.z + 0.5;
        (
            (u * self.width as f32).floor() as i32,
            (v * self.height as f32).floor() as i32,
        )
    }

    /// World (x, z) of a cell's lower corner
    pub fn cell_to_world(&self, x: u32, y: u32) -> Vec2 {
        let pitch = self.cell_pitch();
        Vec2::new(
            self.position.x - 0.5 * self.size.x + x as f32 * pitch.x,
            self.position.z - 0.5 * self.size.z + y as f32 * pitch.y,
        )
    }

    /// Normalized height of a world-space Y coordinate
    pub fn normalized_height(&self, world_y: f32) -> f32 {
        (world_y - self.position.y) / self.size.y
    }

    /// Refill the grid with untouched stock
    pub fn reset(&mut self) {
        self.heights.fill(1.0);
        self.dirty = None;
        self.refresh_texture();
    }

    /// Reallocate the grid at a new resolution, untouched
    pub fn set_dimensions(&mut self, width: u32, height: u32) -> Result<(), StockError> {
        if width == 0 || height == 0 {
            return Err(StockError::InvalidDimensions { width, height });
        }
        self.width = width;
        self.height = height;
        self.heights = vec![1.0; (width as usize) * (height as usize)];
        self.dirty = None;
        self.refresh_texture();
        Ok(())
    }

    /// Attach a display surface, returning the previous one
    pub fn attach_surface(
        &mut self,
        surface: Box<dyn HeightmapSurface>,
    ) -> Option<Box<dyn HeightmapSurface>> {
        self.surface.replace(surface)
    }

    /// Cells changed since the last [`take_dirty_region`](Self::take_dirty_region)
    /// or [`refresh_texture`](Self::refresh_texture)
    pub fn take_dirty_region(&mut self) -> Option<Region> {
        self.dirty.take()
    }

    /// Carve a mask and push the changed sub-rectangle to the attached surface
    ///
    /// Same arithmetic and result as [`carve_silent`](Self::carve_silent).
    pub fn carve(
        &mut self,
        mask: &MillingMask,
        offset_x: i32,
        offset_y: i32,
        depth: f32,
        max_height: f32,
    ) -> CarveResult {
        let Some(clip) = self.clip(mask, offset_x, offset_y) else {
            return CarveResult::default();
        };
        let result = self.apply(mask, &clip, depth, max_height);

        if let Some(surface) = self.surface.as_mut() {
            let r = clip.region;
            let mut data = Vec::with_capacity((r.width as usize) * (r.height as usize));
            for y in r.y..r.y + r.height {
                let start = (y as usize) * (self.width as usize) + r.x as usize;
                data.extend_from_slice(&self.heights[start..start + r.width as usize]);
            }
            surface.upload_region(r.x, r.y, r.width, r.height, &data);
        }

        result
    }

    /// Carve a mask into the grid without touching any display surface
    ///
    /// The mask's top-left cell is placed at grid cell `(offset_x, offset_y)`.
    /// Every overlapping contact cell is lowered to `max(mask - depth, 0)` if
    /// that is below its current height; [`NO_CONTACT`] cells are skipped.
    /// `max_height` is the shank clearance above the cutting point: material
    /// left above `mask - depth + max_height` counts as a collision, and a
    /// cutting height below the safety floor is a depth error even where the
    /// cell was already lower. A footprint entirely outside the grid is a
    /// no-op with no flags set.
    pub fn carve_silent(
        &mut self,
        mask: &MillingMask,
        offset_x: i32,
        offset_y: i32,
        depth: f32,
        max_height: f32,
    ) -> CarveResult {
        match self.clip(mask, offset_x, offset_y) {
            Some(clip) => self.apply(mask, &clip, depth, max_height),
            None => CarveResult::default(),
        }
    }

    /// Whether a mask placed at `(offset_x, offset_y)` touches the grid at all
    pub fn footprint_overlaps(&self, mask: &MillingMask, offset_x: i32, offset_y: i32) -> bool {
        clip_axis(offset_x, mask.width(), self.width).is_some()
            && clip_axis(offset_y, mask.height(), self.height).is_some()
    }

    /// Push the whole grid to the attached surface
    pub fn refresh_texture(&mut self) {
        self.dirty = None;
        if let Some(surface) = self.surface.as_mut() {
            surface.upload_full(self.width, self.height, &self.heights);
        }
    }

    /// Volume of material removed, in world units
    pub fn removed_volume(&self) -> f32 {
        let pitch = self.cell_pitch();
        let cell_area = pitch.x * pitch.y;
        let removed: f32 = self.heights.iter().map(|h| 1.0 - h).sum();
        removed * cell_area * self.size.y
    }

    /// Lowest normalized height in the grid
    pub fn min_surface_height(&self) -> f32 {
        self.heights.iter().copied().fold(f32::INFINITY, f32::min)
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.width as usize) + x as usize
    }

    fn clip(&self, mask: &MillingMask, offset_x: i32, offset_y: i32) -> Option<Clip> {
        let overlap = clip_axis(offset_x, mask.width(), self.width)
            .zip(clip_axis(offset_y, mask.height(), self.height));
        let Some(((mask_x, width), (mask_y, height))) = overlap else {
            trace!("Carve at ({}, {}) is outside the stock", offset_x, offset_y);
            return None;
        };

        Some(Clip {
            mask_x,
            mask_y,
            region: Region {
                x: (offset_x as i64 + mask_x as i64) as u32,
                y: (offset_y as i64 + mask_y as i64) as u32,
                width,
                height,
            },
        })
    }

    fn apply(&mut self, mask: &MillingMask, clip: &Clip, depth: f32, max_height: f32) -> CarveResult {
        let mut result = CarveResult::default();
        let region = clip.region;

        for row in 0..region.height {
            let mask_row = (clip.mask_y + row) as usize * mask.width() as usize;
            let grid_row = (region.y + row) as usize * self.width as usize;

            for col in 0..region.width {
                let mask_value = mask.values()[mask_row + (clip.mask_x + col) as usize];
                if mask_value >= NO_CONTACT {
                    continue;
                }
                let cell = &mut self.heights[grid_row + (region.x + col) as usize];
                let previous = *cell;
                let candidate = mask_value - depth;
                let cut = candidate.max(0.0);

                if candidate + max_height < previous {
                    result.collision_error = true;
                }
                if cut < self.min_height {
                    result.depth_error = true;
                }
                if candidate < previous {
                    *cell = cut;
                    result.was_milled = true;
                }
            }
        }

        if result.was_milled {
            self.dirty = Some(match self.dirty {
                Some(dirty) => dirty.union(&region),
                None => region,
            });
        }
        if result.is_unsafe() {
            debug!(
                "Unsafe carve at ({}, {}): collision={} depth={}",
                region.x, region.y, result.collision_error, result.depth_error
            );
        }

        result
    }
}

/// Clip one axis of a placed mask against the grid
///
/// Returns the first mask index inside the grid and the overlap length, or
/// `None` when the overlap is empty.
fn clip_axis(offset: i32, mask_extent: u32, grid_extent: u32) -> Option<(u32, u32)> {
    let offset = offset as i64;
    let mask_extent = mask_extent as i64;
    let grid_extent = grid_extent as i64;

    let start = (-offset).max(0);
    let end = (offset + mask_extent - grid_extent).max(0);
    let extent = mask_extent - start - end;
    if extent <= 0 {
        return None;
    }
    Some((start as u32, extent as u32))
}
