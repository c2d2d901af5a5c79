//! Error handling for millsim
//!
//! Provides error types for every layer of the simulator:
//! - Program errors (reading machining programs)
//! - Tool specification errors (tool geometry encoded in file names)
//! - Stock errors (block allocation and dimensions)
//! - Simulation errors (driving a cutter along a path)
//!
//! Unsafe cuts (collisions, over-depth, flat tool on a plunge) are not errors:
//! they are latched per segment and reported as events while the simulation
//! keeps running.
//!
//! All error types use `thiserror` for ergonomic error handling.

use std::path::PathBuf;
use thiserror::Error;

/// Program error type
///
/// Raised when a machining program cannot be loaded. Malformed lines are not
/// errors: they surface as invalid commands or end the command sequence.
#[derive(Error, Debug)]
pub enum ProgramError {
    /// The program source could not be opened or read
    #[error("Failed to read program {path}: {source}")]
    Read {
        /// Path of the program that failed to open.
        path: PathBuf,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The program parsed but produced no usable moves
    #[error("Program {path} contains no linear moves")]
    Empty {
        /// Path of the empty program.
        path: PathBuf,
    },
}

/// Tool specification error type
///
/// Raised when a program file name does not carry a `.f<RR>` / `.k<RR>`
/// tool suffix.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ToolSpecError {
    /// The file name is shorter than the four-character suffix
    #[error("File name '{name}' is too short to encode a tool")]
    MissingSuffix {
        /// The offending file name.
        name: String,
    },

    /// The shape letter is neither `f` nor `k`
    #[error("Unknown tool shape '{shape}' in '{name}'")]
    UnknownShape {
        /// The offending file name.
        name: String,
        /// The shape character found.
        shape: char,
    },

    /// The two radius digits are not decimal digits
    #[error("Invalid tool size '{size}' in '{name}'")]
    InvalidSize {
        /// The offending file name.
        name: String,
        /// The size characters found.
        size: String,
    },

    /// The tool radius is zero
    #[error("Tool radius must be greater than zero")]
    ZeroRadius,
}

/// Stock error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StockError {
    /// Grid dimensions with a zero axis
    #[error("Invalid heightmap dimensions {width}x{height}")]
    InvalidDimensions {
        /// Requested grid width in cells.
        width: u32,
        /// Requested grid height in cells.
        height: u32,
    },

    /// Safety floor outside the normalized height range
    #[error("Minimum height {0} is outside [0, 1]")]
    InvalidMinHeight(f32),

    /// World-space block size with a non-positive axis
    #[error("Invalid block size ({x}, {y}, {z})")]
    InvalidSize {
        /// Block extent along X.
        x: f32,
        /// Block extent along Y (vertical).
        y: f32,
        /// Block extent along Z.
        z: f32,
    },
}

/// Simulation error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    /// An operation needed a loaded program
    #[error("No program loaded")]
    NoProgram,

    /// A cancellable run was stopped by its caller
    #[error("Simulation cancelled at segment {segment} of {total}")]
    Cancelled {
        /// Index of the segment being processed when the run stopped.
        segment: usize,
        /// Number of segments in the path.
        total: usize,
    },

    /// Cutter parameters that cannot produce a tool mask
    #[error("Invalid cutter: {reason}")]
    InvalidCutter {
        /// Why the cutter was rejected.
        reason: String,
    },
}

/// Main error type for millsim
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Program error
    #[error(transparent)]
    Program(#[from] ProgramError),

    /// Tool specification error
    #[error(transparent)]
    ToolSpec(#[from] ToolSpecError),

    /// Stock error
    #[error(transparent)]
    Stock(#[from] StockError),

    /// Simulation error
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

impl Error {
    /// Check if this error happened while loading a program
    pub fn is_load_error(&self) -> bool {
        matches!(self, Error::Program(_) | Error::ToolSpec(_))
    }

    /// Check if this error is a cancelled run
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Simulation(SimulationError::Cancelled { .. }))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
