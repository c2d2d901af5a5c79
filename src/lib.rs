//! # millsim
//!
//! A heightmap milling simulator. It replays a linear-move machining program
//! against a virtual stock block and reports unsafe cuts:
//! - shank collisions with material above the blade
//! - cuts below the block's safety floor
//! - flat cutters removing material on vertical moves
//!
//! ## Architecture
//!
//! millsim is organized as a workspace with multiple crates:
//!
//! 1. **millsim-core** - Tool geometry, coordinate mapping, error taxonomy
//! 2. **millsim-program** - Program parsing into commands and waypoints
//! 3. **millsim-stock** - Heightmap block, tool masks, display surface hook
//! 4. **millsim-settings** - JSON/TOML configuration
//! 5. **millsim-simulator** - Cutter traversal and simulation sessions
//! 6. **millsim** - Command-line binary that integrates all crates

pub use millsim_core::{
    program_to_scene, Error, ProgramError, Result, SimulationError, StockError, ToolShape,
    ToolSpec, ToolSpecError,
};
pub use millsim_program::{waypoints, Command, ProgramParser, StopReason};
pub use millsim_settings::{Config, ConfigError, SettingsError};
pub use millsim_simulator::{
    Cutter, CutterState, MillingEvent, MillingEventKind, MillingEventSink, SegmentLatches,
    Simulation, SimulationProgress, SimulationSummary, UpdateReport,
};
pub use millsim_stock::{Block, CarveResult, HeightmapSurface, MillingMask};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Sets up structured logging on stderr with `RUST_LOG` support, defaulting
/// to `info`. Stdout stays free for the run summary.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
