//! Unsafe-cut events and progress reporting
//!
//! The cutter raises at most one event per kind per path segment. Events are
//! handed to a [`MillingEventSink`] as they happen and also returned in the
//! [`UpdateReport`] of the call that produced them.

use glam::Vec3;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Kind of unsafe condition detected while carving
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MillingEventKind {
    /// The shank would hit material above the blade
    Collision,
    /// A cell was cut below the block's safety floor
    OverDepth,
    /// A flat cutter removed material while moving vertically
    FlatToolOnVerticalMove,
}

impl std::fmt::Display for MillingEventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Collision => write!(f, "tool collision"),
            Self::OverDepth => write!(f, "cut below minimum height"),
            Self::FlatToolOnVerticalMove => write!(f, "flat cutter used on a vertical move"),
        }
    }
}

/// One unsafe condition, first seen at `position` on path segment `segment`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MillingEvent {
    /// What went wrong
    pub kind: MillingEventKind,
    /// Index of the segment's start waypoint
    pub segment: usize,
    /// Cutter position of the carve that raised it
    pub position: Vec3,
}

impl std::fmt::Display for MillingEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} on segment {} at ({:.3}, {:.3}, {:.3})",
            self.kind, self.segment, self.position.x, self.position.y, self.position.z
        )
    }
}

/// Receiver for unsafe-cut events
pub trait MillingEventSink: Send {
    /// Called once per event, in the order events are raised
    fn report(&mut self, event: &MillingEvent);
}

/// Sink that logs every event at `warn` level
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MillingEventSink for TracingSink {
    fn report(&mut self, event: &MillingEvent) {
        warn!(
            kind = ?event.kind,
            segment = event.segment,
            x = event.position.x,
            y = event.position.y,
            z = event.position.z,
            "Unsafe cut: {}",
            event.kind
        );
    }
}

/// Sink that stores events; clones share the same buffer
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<MillingEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far
    pub fn events(&self) -> Vec<MillingEvent> {
        self.events.lock().clone()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl MillingEventSink for RecordingSink {
    fn report(&mut self, event: &MillingEvent) {
        self.events.lock().push(*event);
    }
}

/// What one `update` or completion call did
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateReport {
    /// Carves that overlapped the stock
    pub carves: usize,
    /// Segments finished during the call
    pub segments_completed: usize,
    /// Events raised during the call
    pub events: Vec<MillingEvent>,
    /// Whether any cell was lowered
    pub milled: bool,
}

/// Position of a run within the path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SimulationProgress {
    /// Segments finished so far
    pub segment: usize,
    /// Segments in the path
    pub total_segments: usize,
}

impl SimulationProgress {
    /// Completed fraction in `[0, 1]`; an empty path counts as complete
    pub fn fraction(&self) -> f32 {
        if self.total_segments == 0 {
            return 1.0;
        }
        (self.segment as f32 / self.total_segments as f32).min(1.0)
    }
}

/// Count of unsafe segments per event kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTotals {
    pub collisions: usize,
    pub over_depth: usize,
    pub flat_on_vertical: usize,
}

impl EventTotals {
    pub fn record(&mut self, event: &MillingEvent) {
        match event.kind {
            MillingEventKind::Collision => self.collisions += 1,
            MillingEventKind::OverDepth => self.over_depth += 1,
            MillingEventKind::FlatToolOnVerticalMove => self.flat_on_vertical += 1,
        }
    }

    /// Total across all kinds
    pub fn total(&self) -> usize {
        self.collisions + self.over_depth + self.flat_on_vertical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(kind: MillingEventKind, segment: usize) -> MillingEvent {
        MillingEvent {
            kind,
            segment,
            position: Vec3::new(1.0, -0.5, 2.25),
        }
    }

    #[test]
    fn test_event_display() {
        let e = event(MillingEventKind::OverDepth, 3);
        assert_eq!(
            e.to_string(),
            "cut below minimum height on segment 3 at (1.000, -0.500, 2.250)"
        );
    }

    #[test]
    fn test_recording_sink_clones_share_buffer() {
        let sink = RecordingSink::new();
        let mut handle: Box<dyn MillingEventSink> = Box::new(sink.clone());

        handle.report(&event(MillingEventKind::Collision, 0));
        handle.report(&event(MillingEventKind::Collision, 1));

        assert_eq!(sink.events().len(), 2);
        sink.clear();
        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_progress_fraction() {
        let p = SimulationProgress {
            segment: 1,
            total_segments: 4,
        };
        assert_eq!(p.fraction(), 0.25);

        let empty = SimulationProgress {
            segment: 0,
            total_segments: 0,
        };
        assert_eq!(empty.fraction(), 1.0);
    }

    #[test]
    fn test_totals() {
        let mut totals = EventTotals::default();
        totals.record(&event(MillingEventKind::Collision, 0));
        totals.record(&event(MillingEventKind::FlatToolOnVerticalMove, 0));
        totals.record(&event(MillingEventKind::Collision, 1));

        assert_eq!(totals.collisions, 2);
        assert_eq!(totals.flat_on_vertical, 1);
        assert_eq!(totals.total(), 3);
    }
}
