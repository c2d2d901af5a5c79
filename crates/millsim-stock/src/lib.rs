//! # millsim Stock
//!
//! Heightmap-based stock simulation.
//!
//! The stock block is a grid of normalized heights in `[0, 1]`: `1.0` is the
//! untouched top surface and `0.0` is the base plane. Material is removed by
//! carving a [`MillingMask`] (the cutter's cross-section) into the grid; the
//! grid only ever gets lower.
//!
//! ```
//! use millsim_stock::{Block, MillingMask};
//!
//! let mut block = Block::new(16, 16, 0.1).unwrap();
//! let mask = MillingMask::filled(3, 3, 0.0);
//! let result = block.carve_silent(&mask, 4, 4, -0.5, 1.0);
//! assert!(result.was_milled);
//! assert_eq!(block.height_at(5, 5), Some(0.5));
//! ```

pub mod block;
pub mod mask;
pub mod surface;

pub use block::{Block, CarveResult, Region};
pub use mask::{ball_offset, MillingMask, NO_CONTACT};
pub use surface::{HeightmapSurface, RecordingSurface, SurfaceLog};
