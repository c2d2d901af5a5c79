//! Cutter path traversal
//!
//! A [`Cutter`] walks an ordered list of waypoints and carves the block along
//! the way. Each segment is sampled on a fixed lattice of
//! `ceil(length / (radius * sample_factor))` intervals and every lattice point
//! is carved exactly once, whatever `dt` sequence drives the traversal. Carves
//! only ever lower cells, so the final grid does not depend on how the
//! traversal was paced.

use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec3;
use millsim_core::{SimulationError, ToolShape, ToolSpec};
use millsim_stock::{Block, CarveResult, MillingMask};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::events::{
    EventTotals, MillingEvent, MillingEventKind, MillingEventSink, SimulationProgress,
    TracingSink, UpdateReport,
};

/// Where the cutter rests before the first update
pub const HOME_POSITION: Vec3 = Vec3::new(0.0, 6.0, 0.0);

/// Default sample spacing as a fraction of the tool radius
pub const DEFAULT_SAMPLE_FACTOR: f32 = 0.1;

/// Default minimum |Δy| for a segment to count as vertical
pub const DEFAULT_VERTICAL_EPSILON: f32 = 1e-4;

/// Traversal state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CutterState {
    /// Segments remain
    Traversing,
    /// Snapped to the final waypoint; updates are no-ops
    Done,
}

/// Unsafe conditions already reported on the current segment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentLatches {
    pub collision: bool,
    pub depth: bool,
    pub flat_on_vertical: bool,
}

impl SegmentLatches {
    /// Latch the flags of one carve result, returning the kinds seen for the
    /// first time on this segment
    ///
    /// `flat_on_vertical` says whether the current move is a flat cutter on a
    /// vertical segment; it only counts when the carve removed material.
    pub fn observe(&mut self, result: &CarveResult, flat_on_vertical: bool) -> Vec<MillingEventKind> {
        let mut raised = Vec::new();
        if result.collision_error && !self.collision {
            self.collision = true;
            raised.push(MillingEventKind::Collision);
        }
        if result.depth_error && !self.depth {
            self.depth = true;
            raised.push(MillingEventKind::OverDepth);
        }
        if flat_on_vertical && result.was_milled && !self.flat_on_vertical {
            self.flat_on_vertical = true;
            raised.push(MillingEventKind::FlatToolOnVerticalMove);
        }
        raised
    }

    /// Whether any condition has been latched
    pub fn any(&self) -> bool {
        self.collision || self.depth || self.flat_on_vertical
    }
}

/// Traversal tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutterOptions {
    /// Scene units travelled per second of `update` time
    pub speed: f32,
    /// Sample spacing as a fraction of the tool radius
    pub sample_factor: f32,
    /// Minimum |Δy| for a segment to count as vertical
    pub vertical_epsilon: f32,
}

impl Default for CutterOptions {
    fn default() -> Self {
        Self {
            speed: 1.0,
            sample_factor: DEFAULT_SAMPLE_FACTOR,
            vertical_epsilon: DEFAULT_VERTICAL_EPSILON,
        }
    }
}

impl CutterOptions {
    fn validate(&self) -> Result<(), SimulationError> {
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(invalid(format!("speed {} must be positive", self.speed)));
        }
        if !(self.sample_factor.is_finite() && self.sample_factor > 0.0) {
            return Err(invalid(format!(
                "sample factor {} must be positive",
                self.sample_factor
            )));
        }
        if !(self.vertical_epsilon >= 0.0) {
            return Err(invalid(format!(
                "vertical epsilon {} must not be negative",
                self.vertical_epsilon
            )));
        }
        Ok(())
    }
}

fn invalid(reason: String) -> SimulationError {
    SimulationError::InvalidCutter { reason }
}

/// Check a shank clearance before building a cutter with it
pub fn validate_blade_height(blade_height: f32) -> Result<(), SimulationError> {
    if !(blade_height.is_finite() && blade_height >= 0.0) {
        return Err(invalid(format!(
            "blade height {blade_height} must not be negative"
        )));
    }
    Ok(())
}

/// A tool following a waypoint path
pub struct Cutter {
    waypoints: Vec<Vec3>,
    tool: ToolSpec,
    blade_height: f32,
    mask: MillingMask,
    options: CutterOptions,
    position: Vec3,
    index: usize,
    /// Distance travelled into the current segment
    timer: f32,
    /// Lowest lattice index of the current segment not yet carved
    next_sample: usize,
    latches: SegmentLatches,
    left_stock: bool,
    totals: EventTotals,
    sink: Box<dyn MillingEventSink>,
}

impl std::fmt::Debug for Cutter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cutter")
            .field("tool", &self.tool)
            .field("blade_height", &self.blade_height)
            .field("waypoints", &self.waypoints.len())
            .field("index", &self.index)
            .field("position", &self.position)
            .field("latches", &self.latches)
            .finish()
    }
}

impl Cutter {
    /// Create a cutter with default traversal options
    ///
    /// `block` is only read for its cell pitch and height, which size the
    /// tool mask. Events go to a [`TracingSink`].
    pub fn new(
        waypoints: Vec<Vec3>,
        tool: ToolSpec,
        blade_height: f32,
        block: &Block,
    ) -> Result<Self, SimulationError> {
        Self::with_options(waypoints, tool, blade_height, block, CutterOptions::default())
    }

    /// Create a cutter with explicit traversal options
    pub fn with_options(
        waypoints: Vec<Vec3>,
        tool: ToolSpec,
        blade_height: f32,
        block: &Block,
        options: CutterOptions,
    ) -> Result<Self, SimulationError> {
        if !(tool.radius.is_finite() && tool.radius > 0.0) {
            return Err(invalid(format!("radius {} must be positive", tool.radius)));
        }
        validate_blade_height(blade_height)?;
        options.validate()?;

        let mask = MillingMask::for_tool(&tool, block.cell_pitch(), block.size().y);
        debug!(
            "Built {}x{} mask for {} r={}",
            mask.width(),
            mask.height(),
            tool.shape,
            tool.radius
        );

        let position = match waypoints.as_slice() {
            [only] => *only,
            _ => HOME_POSITION,
        };

        Ok(Self {
            waypoints,
            tool,
            blade_height,
            mask,
            options,
            position,
            index: 0,
            timer: 0.0,
            next_sample: 0,
            latches: SegmentLatches::default(),
            left_stock: false,
            totals: EventTotals::default(),
            sink: Box::new(TracingSink),
        })
    }

    /// Replace the event sink
    pub fn with_sink(mut self, sink: Box<dyn MillingEventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn radius(&self) -> f32 {
        self.tool.radius
    }

    pub fn shape(&self) -> ToolShape {
        self.tool.shape
    }

    pub fn tool(&self) -> ToolSpec {
        self.tool
    }

    pub fn blade_height(&self) -> f32 {
        self.blade_height
    }

    pub fn options(&self) -> CutterOptions {
        self.options
    }

    /// Current world position of the tool tip
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Index of the current segment's start waypoint
    pub fn current_index(&self) -> usize {
        self.index
    }

    pub fn waypoints(&self) -> &[Vec3] {
        &self.waypoints
    }

    pub fn mask(&self) -> &MillingMask {
        &self.mask
    }

    /// Conditions already reported on the current segment
    pub fn latches(&self) -> SegmentLatches {
        self.latches
    }

    /// Events raised since construction, per kind
    pub fn event_totals(&self) -> EventTotals {
        self.totals
    }

    pub fn state(&self) -> CutterState {
        if self.index + 1 >= self.waypoints.len() {
            CutterState::Done
        } else {
            CutterState::Traversing
        }
    }

    pub fn is_done(&self) -> bool {
        self.state() == CutterState::Done
    }

    pub fn total_segments(&self) -> usize {
        self.waypoints.len().saturating_sub(1)
    }

    pub fn progress(&self) -> SimulationProgress {
        SimulationProgress {
            segment: self.index.min(self.total_segments()),
            total_segments: self.total_segments(),
        }
    }

    /// Advance along the path by `dt` seconds at the configured speed
    ///
    /// Time left over at the end of a segment carries into the next one, so a
    /// single large `dt` may finish several segments. The block's full
    /// texture is refreshed once at the end if anything was carved.
    pub fn update(&mut self, dt: f32, block: &mut Block) -> UpdateReport {
        let mut report = UpdateReport::default();
        if self.is_done() {
            return report;
        }

        self.timer += dt.max(0.0) * self.options.speed;
        while !self.is_done() {
            if !self.step_segment(block, &mut report, false) {
                break;
            }
        }

        if report.carves > 0 {
            block.refresh_texture();
        }
        report
    }

    /// Run every remaining segment to completion in one call
    pub fn complete_instantly(&mut self, block: &mut Block) -> UpdateReport {
        let mut report = UpdateReport::default();
        while !self.is_done() {
            self.step_segment(block, &mut report, true);
        }

        if report.carves > 0 {
            block.refresh_texture();
        }
        info!(
            "Completed path: {} segments, {} carves, {} events",
            report.segments_completed,
            report.carves,
            report.events.len()
        );
        report
    }

    /// Run the remaining segments, checking `cancel` before each one and
    /// calling `progress` after each one
    ///
    /// A cancelled run returns [`SimulationError::Cancelled`]; the segments
    /// already finished stay carved and a later call picks up where this one
    /// stopped.
    pub fn complete_with<F>(
        &mut self,
        block: &mut Block,
        cancel: &AtomicBool,
        mut progress: F,
    ) -> Result<UpdateReport, SimulationError>
    where
        F: FnMut(SimulationProgress),
    {
        let mut report = UpdateReport::default();
        while !self.is_done() {
            if cancel.load(Ordering::Relaxed) {
                if report.carves > 0 {
                    block.refresh_texture();
                }
                info!(
                    "Simulation cancelled at segment {} of {}",
                    self.index,
                    self.total_segments()
                );
                return Err(SimulationError::Cancelled {
                    segment: self.index,
                    total: self.total_segments(),
                });
            }
            self.step_segment(block, &mut report, true);
            progress(self.progress());
        }

        if report.carves > 0 {
            block.refresh_texture();
        }
        Ok(report)
    }

    fn intervals(&self, length: f32) -> usize {
        let step = self.tool.radius * self.options.sample_factor;
        (length / step).ceil() as usize
    }

    /// Carve the lattice points of the current segment reached so far
    ///
    /// With `finish` the whole segment counts as reached and the leftover
    /// time is dropped. Returns whether the segment was completed.
    fn step_segment(&mut self, block: &mut Block, report: &mut UpdateReport, finish: bool) -> bool {
        let start = self.waypoints[self.index];
        let end = self.waypoints[self.index + 1];
        let length = start.distance(end);
        let intervals = self.intervals(length);

        let t = if finish || length <= 0.0 {
            1.0
        } else {
            (self.timer / length).min(1.0)
        };
        let reached = if t >= 1.0 {
            intervals
        } else {
            ((t * intervals as f32).floor() as usize).min(intervals)
        };

        let vertical = (start.y - end.y).abs() > self.options.vertical_epsilon;
        let flat_on_vertical = vertical && !self.tool.shape.is_spherical();

        if reached >= self.next_sample {
            for i in (self.next_sample..=reached).rev() {
                let sample_t = if intervals == 0 {
                    1.0
                } else {
                    i as f32 / intervals as f32
                };
                self.carve_at(block, start.lerp(end, sample_t), flat_on_vertical, report);
            }
            self.next_sample = reached + 1;
        }
        self.position = start.lerp(end, t);

        if t < 1.0 {
            return false;
        }

        if finish {
            self.timer = 0.0;
        } else {
            self.timer = (self.timer - length).max(0.0);
        }
        self.index += 1;
        self.next_sample = 0;
        self.latches = SegmentLatches::default();
        self.left_stock = false;
        report.segments_completed += 1;

        if self.is_done() {
            self.position = end;
        }
        true
    }

    fn carve_at(
        &mut self,
        block: &mut Block,
        position: Vec3,
        flat_on_vertical: bool,
        report: &mut UpdateReport,
    ) {
        let (cell_x, cell_y) = block.world_to_cell(position);
        let (center_x, center_y) = self.mask.center();
        let offset_x = cell_x - center_x as i32;
        let offset_y = cell_y - center_y as i32;

        if !block.footprint_overlaps(&self.mask, offset_x, offset_y) {
            if !self.left_stock {
                self.left_stock = true;
                debug!(
                    segment = self.index,
                    "Tool footprint left the stock at ({:.3}, {:.3}, {:.3})",
                    position.x,
                    position.y,
                    position.z
                );
            }
            return;
        }

        let depth = -block.normalized_height(position.y);
        let max_height = self.blade_height / block.size().y;
        let result = block.carve_silent(&self.mask, offset_x, offset_y, depth, max_height);

        report.carves += 1;
        report.milled |= result.was_milled;

        for kind in self.latches.observe(&result, flat_on_vertical) {
            let event = MillingEvent {
                kind,
                segment: self.index,
                position,
            };
            self.sink.report(&event);
            self.totals.record(&event);
            report.events.push(event);
        }
    }
}
