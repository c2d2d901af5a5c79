//! Display surface hook
//!
//! The stock model never touches textures or GPU buffers. A view layer that
//! wants to mirror the heightmap implements [`HeightmapSurface`] and attaches
//! it to the [`Block`](crate::Block); the block pushes changed cells to it.

use parking_lot::Mutex;
use std::sync::Arc;

/// Receiver for heightmap updates
pub trait HeightmapSurface: Send {
    /// A rectangular sub-region changed; `data` is row-major,
    /// `width * height` values long
    fn upload_region(&mut self, x: u32, y: u32, width: u32, height: u32, data: &[f32]);

    /// The whole grid should be re-read
    fn upload_full(&mut self, width: u32, height: u32, data: &[f32]);
}

/// Upload counters kept by [`RecordingSurface`]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SurfaceLog {
    /// Number of region uploads received
    pub region_uploads: usize,
    /// Number of full uploads received
    pub full_uploads: usize,
    /// Last region uploaded as `(x, y, width, height)`
    pub last_region: Option<(u32, u32, u32, u32)>,
}

/// Surface that only records what it was sent
///
/// Clones share the same log, so a caller can keep one handle and attach the
/// other to a block.
#[derive(Debug, Default, Clone)]
pub struct RecordingSurface {
    log: Arc<Mutex<SurfaceLog>>,
}

impl RecordingSurface {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the uploads seen so far
    pub fn log(&self) -> SurfaceLog {
        self.log.lock().clone()
    }
}

impl HeightmapSurface for RecordingSurface {
    fn upload_region(&mut self, x: u32, y: u32, width: u32, height: u32, data: &[f32]) {
        debug_assert_eq!(data.len(), (width as usize) * (height as usize));
        let mut log = self.log.lock();
        log.region_uploads += 1;
        log.last_region = Some((x, y, width, height));
    }

    fn upload_full(&mut self, width: u32, height: u32, data: &[f32]) {
        debug_assert_eq!(data.len(), (width as usize) * (height as usize));
        self.log.lock().full_uploads += 1;
    }
}
