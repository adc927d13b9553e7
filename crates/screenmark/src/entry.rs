//! Core history entry types for screenmark.
//!
//! This module defines the records that make up a history: captured points,
//! measurements between two points, and groups that organise both.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default label for newly created groups.
pub const DEFAULT_GROUP_LABEL: &str = "New Group";

/// Unique identifier of an entry within a history.
///
/// Ids come from a monotonically increasing counter and are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for EntryId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim_start_matches('#').parse().map(Self)
    }
}

/// The kind of an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// A single captured coordinate.
    Point,
    /// A distance between two points.
    Measurement,
    /// A folder of other entries.
    Group,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Point => write!(f, "point"),
            Self::Measurement => write!(f, "measurement"),
            Self::Group => write!(f, "group"),
        }
    }
}

/// A captured screen coordinate, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// Pixel column.
    pub x: i32,
    /// Pixel row.
    pub y: i32,
}

impl Point {
    /// Create a point at the given coordinates.
    #[must_use]
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Label given to a point when none is supplied.
    #[must_use]
    pub fn default_label(&self) -> String {
        format!("Point ({}, {})", self.x, self.y)
    }
}

/// A distance between two points, referenced by id.
///
/// The distance itself is derived from the endpoints on every read so that
/// it can never go stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Measurement {
    /// First endpoint.
    pub start: EntryId,
    /// Second endpoint.
    pub end: EntryId,
    /// Whether the ruler capture was snapped to an axis.
    pub auto_aligned: bool,
}

impl Measurement {
    /// Label given to a measurement when none is supplied.
    #[must_use]
    pub fn default_label(distance: f64) -> String {
        format!("Measurement {}px", distance.trunc())
    }

    /// Check whether the measurement uses the given point as an endpoint.
    #[must_use]
    pub fn references(&self, id: EntryId) -> bool {
        self.start == id || self.end == id
    }
}

/// An ordered folder of child entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    /// Child ids, in display order.
    pub children: Vec<EntryId>,
    /// Whether the group is unfolded in tree views.
    pub expanded: bool,
}

impl Default for Group {
    fn default() -> Self {
        Self {
            children: Vec::new(),
            expanded: true,
        }
    }
}

impl Group {
    /// Number of direct children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Check if the group has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}

/// The kind-specific payload of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Body {
    /// See [`Point`].
    Point(Point),
    /// See [`Measurement`].
    Measurement(Measurement),
    /// See [`Group`].
    Group(Group),
}

/// A single record in the history tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Unique id.
    pub id: EntryId,
    /// User-editable display label.
    pub label: String,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
    /// Containing group, or `None` for top-level entries.
    pub parent: Option<EntryId>,
    /// Kind-specific data.
    pub body: Body,
}

impl Entry {
    /// Create an entry stamped with the current time.
    #[must_use]
    pub fn new(id: EntryId, label: String, parent: Option<EntryId>, body: Body) -> Self {
        Self {
            id,
            label,
            created_at: Utc::now(),
            parent,
            body,
        }
    }

    /// The kind of this entry.
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        match self.body {
            Body::Point(_) => EntryKind::Point,
            Body::Measurement(_) => EntryKind::Measurement,
            Body::Group(_) => EntryKind::Group,
        }
    }

    /// The point payload, if this is a point.
    #[must_use]
    pub fn as_point(&self) -> Option<&Point> {
        match &self.body {
            Body::Point(point) => Some(point),
            _ => None,
        }
    }

    /// The measurement payload, if this is a measurement.
    #[must_use]
    pub fn as_measurement(&self) -> Option<&Measurement> {
        match &self.body {
            Body::Measurement(measurement) => Some(measurement),
            _ => None,
        }
    }

    /// The group payload, if this is a group.
    #[must_use]
    pub fn as_group(&self) -> Option<&Group> {
        match &self.body {
            Body::Group(group) => Some(group),
            _ => None,
        }
    }

    pub(crate) fn as_group_mut(&mut self) -> Option<&mut Group> {
        match &mut self.body {
            Body::Group(group) => Some(group),
            _ => None,
        }
    }

    /// Check if this entry is a group.
    #[must_use]
    pub fn is_group(&self) -> bool {
        matches!(self.body, Body::Group(_))
    }
}
