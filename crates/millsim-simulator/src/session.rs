//! Simulation session
//!
//! Owns one block, the loaded program and the cutter following it. Changing
//! the program, the blade height or the material replaces the cutter
//! wholesale and starts over on fresh stock.

use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use glam::Vec3;
use millsim_core::{ProgramError, Result, SimulationError, ToolSpec};
use millsim_program::{waypoints, Command, ProgramParser, SequenceWarning, StopReason};
use millsim_settings::Config;
use millsim_stock::Block;
use serde::Serialize;
use tracing::{info, warn};

use crate::cutter::{validate_blade_height, Cutter, CutterOptions};
use crate::events::{EventTotals, SimulationProgress, UpdateReport};

/// A parsed program and the tool it runs with
#[derive(Debug, Clone)]
pub struct LoadedProgram {
    pub path: PathBuf,
    pub commands: Vec<Command>,
    /// Scene-space waypoints of the valid moves
    pub waypoints: Vec<Vec3>,
    pub tool: ToolSpec,
    /// Whether `tool` came from the file name rather than the configured default
    pub tool_from_name: bool,
    pub stop_reason: Option<StopReason>,
    pub invalid_count: usize,
    pub warnings: Vec<SequenceWarning>,
}

/// End-of-run statistics
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub program: Option<PathBuf>,
    pub tool: Option<ToolSpec>,
    pub blade_height: f32,
    pub commands: usize,
    pub invalid_commands: usize,
    pub truncated: bool,
    pub segments: usize,
    pub segments_completed: usize,
    /// Unsafe segments per kind
    pub events: EventTotals,
    /// Removed material in world units
    pub removed_volume: f32,
    /// Lowest normalized surface height
    pub deepest_point: f32,
    pub done: bool,
}

/// Block, program and cutter driven together
#[derive(Debug)]
pub struct Simulation {
    config: Config,
    block: Block,
    program: Option<LoadedProgram>,
    cutter: Option<Cutter>,
    blade_height: f32,
}

impl Simulation {
    /// Build the block described by `config`
    pub fn new(config: Config) -> Result<Self> {
        let settings = &config.block;
        let mut block = Block::new(settings.grid_width, settings.grid_height, settings.min_height)?;
        block.set_block_size(settings.size)?;
        block.set_block_position(settings.position);

        let blade_height = config.tool.blade_height;
        Ok(Self {
            config,
            block,
            program: None,
            cutter: None,
            blade_height,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    /// Mutable access to the block, e.g. to attach a display surface
    pub fn block_mut(&mut self) -> &mut Block {
        &mut self.block
    }

    pub fn program(&self) -> Option<&LoadedProgram> {
        self.program.as_ref()
    }

    pub fn cutter(&self) -> Option<&Cutter> {
        self.cutter.as_ref()
    }

    pub fn blade_height(&self) -> f32 {
        self.blade_height
    }

    /// Parse a program file and start it on fresh stock
    ///
    /// The tool comes from the file name suffix when it has one and from the
    /// configured default otherwise.
    pub fn load_program(&mut self, path: impl AsRef<Path>) -> Result<&LoadedProgram> {
        let path = path.as_ref();
        let mut parser = ProgramParser::open(path)?;
        let commands = parser.all_commands();
        let stop_reason = parser.stop_reason();
        let warnings = parser.warnings().to_vec();

        if let Some(StopReason::Truncated { line, reason }) = stop_reason {
            warn!(
                "Program {} truncated at line {}: {}",
                path.display(),
                line,
                reason
            );
        }

        let points = waypoints(&commands);
        if points.is_empty() {
            return Err(ProgramError::Empty {
                path: path.to_path_buf(),
            }
            .into());
        }

        let (tool, tool_from_name) = match ToolSpec::from_path(path) {
            Ok(tool) => (tool, true),
            Err(err) => {
                let fallback = self.config.tool.tool_spec();
                info!("{}; using configured {} r={}", err, fallback.shape, fallback.radius);
                (fallback, false)
            }
        };

        let invalid_count = commands.iter().filter(|c| c.is_invalid()).count();
        info!(
            "Loaded {}: {} commands ({} invalid), {} waypoints, {} r={}",
            path.display(),
            commands.len(),
            invalid_count,
            points.len(),
            tool.shape,
            tool.radius
        );

        let program = LoadedProgram {
            path: path.to_path_buf(),
            commands,
            waypoints: points,
            tool,
            tool_from_name,
            stop_reason,
            invalid_count,
            warnings,
        };

        let cutter = self.build_cutter(&program)?;
        self.block.reset();
        self.cutter = Some(cutter);
        Ok(&*self.program.insert(program))
    }

    /// Start the loaded program over on fresh stock
    pub fn restart_material(&mut self) -> Result<()> {
        let cutter = match &self.program {
            Some(program) => Some(self.build_cutter(program)?),
            None => None,
        };
        self.block.reset();
        self.cutter = cutter;
        Ok(())
    }

    /// Change the blade height and start the loaded program over
    pub fn set_blade_height(&mut self, blade_height: f32) -> Result<()> {
        validate_blade_height(blade_height)?;
        let previous = self.blade_height;
        self.blade_height = blade_height;
        if let Err(err) = self.restart_material() {
            self.blade_height = previous;
            return Err(err);
        }
        Ok(())
    }

    /// Advance the cutter by `dt` seconds
    pub fn update(&mut self, dt: f32) -> Result<UpdateReport> {
        let cutter = self.cutter.as_mut().ok_or(SimulationError::NoProgram)?;
        Ok(cutter.update(dt, &mut self.block))
    }

    /// Finish the loaded program in one call
    pub fn complete_instantly(&mut self) -> Result<UpdateReport> {
        let cutter = self.cutter.as_mut().ok_or(SimulationError::NoProgram)?;
        Ok(cutter.complete_instantly(&mut self.block))
    }

    /// Finish the loaded program, stopping early once `cancel` is set
    pub fn complete_with<F>(&mut self, cancel: &AtomicBool, progress: F) -> Result<UpdateReport>
    where
        F: FnMut(SimulationProgress),
    {
        let cutter = self.cutter.as_mut().ok_or(SimulationError::NoProgram)?;
        Ok(cutter.complete_with(&mut self.block, cancel, progress)?)
    }

    /// Whether the loaded program has run to its last waypoint
    pub fn is_done(&self) -> bool {
        self.cutter.as_ref().is_some_and(Cutter::is_done)
    }

    pub fn summary(&self) -> SimulationSummary {
        let progress = self.cutter.as_ref().map(Cutter::progress);
        SimulationSummary {
            program: self.program.as_ref().map(|p| p.path.clone()),
            tool: self.program.as_ref().map(|p| p.tool),
            blade_height: self.blade_height,
            commands: self.program.as_ref().map_or(0, |p| p.commands.len()),
            invalid_commands: self.program.as_ref().map_or(0, |p| p.invalid_count),
            truncated: self
                .program
                .as_ref()
                .and_then(|p| p.stop_reason)
                .is_some_and(|r| r.is_truncated()),
            segments: progress.map_or(0, |p| p.total_segments),
            segments_completed: progress.map_or(0, |p| p.segment),
            events: self
                .cutter
                .as_ref()
                .map(Cutter::event_totals)
                .unwrap_or_default(),
            removed_volume: self.block.removed_volume(),
            deepest_point: self.block.min_surface_height(),
            done: self.is_done(),
        }
    }

    fn build_cutter(&self, program: &LoadedProgram) -> Result<Cutter> {
        let sim = &self.config.simulation;
        let options = CutterOptions {
            speed: sim.speed,
            sample_factor: sim.sample_factor,
            vertical_epsilon: sim.vertical_epsilon,
        };
        let cutter = Cutter::with_options(
            program.waypoints.clone(),
            program.tool,
            self.blade_height,
            &self.block,
            options,
        )?;
        Ok(cutter)
    }
}
