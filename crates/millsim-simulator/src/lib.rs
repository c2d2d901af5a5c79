//! # millsim Simulator
//!
//! Drives a cutter along a waypoint path and carves the stock block.
//!
//! [`Cutter`] owns the path traversal state and issues carves against a
//! borrowed [`Block`](millsim_stock::Block). [`Simulation`] ties a loaded
//! program, the block and the cutter together for callers that just want to
//! run a file.
//!
//! ```
//! use glam::Vec3;
//! use millsim_core::{ToolShape, ToolSpec};
//! use millsim_simulator::Cutter;
//! use millsim_stock::Block;
//!
//! let mut block = Block::new(64, 64, 0.0).unwrap();
//! block.set_block_size(Vec3::new(4.0, 1.0, 4.0)).unwrap();
//!
//! let path = vec![Vec3::new(-1.0, 0.5, 0.0), Vec3::new(1.0, 0.5, 0.0)];
//! let tool = ToolSpec::new(ToolShape::Ball, 0.25);
//! let mut cutter = Cutter::new(path, tool, 1.0, &block).unwrap();
//!
//! let report = cutter.complete_instantly(&mut block);
//! assert!(report.milled);
//! assert!(cutter.is_done());
//! ```

pub mod cutter;
pub mod events;
pub mod session;

pub use cutter::{
    validate_blade_height, Cutter, CutterOptions, CutterState, SegmentLatches, HOME_POSITION,
};
pub use events::{
    EventTotals, MillingEvent, MillingEventKind, MillingEventSink, RecordingSink,
    SimulationProgress, TracingSink, UpdateReport,
};
pub use session::{LoadedProgram, Simulation, SimulationSummary};
