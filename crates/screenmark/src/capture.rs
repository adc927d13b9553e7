//! Capture events delivered by the overlay.
//!
//! The overlay owns input handling; it reports each completed click as a
//! [`CaptureEvent`] and the history turns it into entries.

use serde::{Deserialize, Serialize};

use crate::entry::{EntryId, Point};

/// A completed capture gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum CaptureEvent {
    /// A single click in point mode.
    Point {
        /// Pixel column.
        x: i32,
        /// Pixel row.
        y: i32,
    },
    /// A start and end click in ruler mode.
    Ruler {
        /// Where the ruler was started.
        start: Point,
        /// Where the ruler was released.
        end: Point,
        /// Skip axis snapping (the overlay's modifier key).
        #[serde(default)]
        free: bool,
    },
}

impl CaptureEvent {
    /// The capture mode as a short name.
    #[must_use]
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Point { .. } => "point",
            Self::Ruler { .. } => "ruler",
        }
    }
}

/// The entries created by recording a capture event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    /// A point capture produced one point.
    Point(EntryId),
    /// A ruler capture produced two endpoints and a measurement.
    Ruler {
        /// The start point.
        start: EntryId,
        /// The end point, after any snapping.
        end: EntryId,
        /// The measurement between them.
        measurement: EntryId,
        /// Whether the end was snapped onto an axis.
        auto_aligned: bool,
    },
}

impl Recorded {
    /// The entry a UI should select after the capture.
    #[must_use]
    pub fn primary(&self) -> EntryId {
        match self {
            Self::Point(id) => *id,
            Self::Ruler { measurement, .. } => *measurement,
        }
    }
}
