//! Persisted document layout for screenmark histories.
//!
//! The document is a versioned JSON object holding the id counter and the
//! top-level entries in order. Each entry is tagged with its `kind`; groups
//! nest their children in order. Measurement distances are never written.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::entry::{Body, Entry, EntryId, Group, Measurement, Point};
use crate::error::{Error, Result};
use crate::history::History;

/// The document version written by this build.
pub const CURRENT_VERSION: u32 = 1;

/// A whole persisted history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Layout version.
    pub version: u32,
    /// The id the next created entry will receive.
    pub next_id: u64,
    /// Top-level entries in display order.
    #[serde(default)]
    pub entries: Vec<StoredEntry>,
}

/// One persisted entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoredEntry {
    /// A captured point.
    Point {
        /// Entry id.
        id: EntryId,
        /// Display label.
        label: String,
        /// Pixel column.
        x: i32,
        /// Pixel row.
        y: i32,
        /// Creation time.
        created_at: DateTime<Utc>,
    },
    /// A measurement between two point ids.
    Measurement {
        /// Entry id.
        id: EntryId,
        /// Display label.
        label: String,
        /// First endpoint id.
        start: EntryId,
        /// Second endpoint id.
        end: EntryId,
        /// Whether the capture was snapped to an axis.
        #[serde(default)]
        auto_aligned: bool,
        /// Creation time.
        created_at: DateTime<Utc>,
    },
    /// A group and its children.
    Group {
        /// Entry id.
        id: EntryId,
        /// Display label.
        label: String,
        /// Creation time.
        created_at: DateTime<Utc>,
        /// Fold state.
        #[serde(default = "default_expanded")]
        expanded: bool,
        /// Children in display order.
        #[serde(default)]
        children: Vec<StoredEntry>,
    },
}

fn default_expanded() -> bool {
    true
}

impl StoredEntry {
    /// The id of this entry.
    #[must_use]
    pub fn id(&self) -> EntryId {
        match self {
            Self::Point { id, .. } | Self::Measurement { id, .. } | Self::Group { id, .. } => *id,
        }
    }
}

impl Document {
    /// Capture the current state of a history.
    #[must_use]
    pub fn from_history(history: &History) -> Self {
        Self {
            version: CURRENT_VERSION,
            next_id: history.next_id(),
            entries: history
                .roots()
                .iter()
                .filter_map(|id| encode_entry(history, *id))
                .collect(),
        }
    }

    /// Rebuild a history from this document.
    ///
    /// A counter that would reissue an existing id is raised past the largest
    /// id in the document.
    ///
    /// # Errors
    ///
    /// Returns an error if an id appears more than once, or if an id or the
    /// counter is `u64::MAX`, which is never issued.
    pub fn into_history(self) -> Result<History> {
        if self.next_id == u64::MAX {
            return Err(Error::invalid_document("id counter is exhausted"));
        }

        let mut entries = BTreeMap::new();
        let mut root = Vec::with_capacity(self.entries.len());

        for stored in self.entries {
            root.push(stored.id());
            decode_entry(stored, None, &mut entries)?;
        }

        let max_id = entries.keys().next_back().map_or(0, |id: &EntryId| id.0);
        let next_id = if self.next_id > max_id {
            self.next_id
        } else {
            warn!(
                "History counter {} does not exceed largest id {}; repairing",
                self.next_id, max_id
            );
            max_id
                .checked_add(1)
                .ok_or_else(|| Error::invalid_document("id counter is exhausted"))?
        };

        Ok(History::from_parts(entries, root, next_id))
    }
}

fn encode_entry(history: &History, id: EntryId) -> Option<StoredEntry> {
    let entry = history.get(id)?;
    let label = entry.label.clone();
    let created_at = entry.created_at;

    Some(match &entry.body {
        Body::Point(p) => StoredEntry::Point {
            id,
            label,
            x: p.x,
            y: p.y,
            created_at,
        },
        Body::Measurement(m) => StoredEntry::Measurement {
            id,
            label,
            start: m.start,
            end: m.end,
            auto_aligned: m.auto_aligned,
            created_at,
        },
        Body::Group(g) => StoredEntry::Group {
            id,
            label,
            created_at,
            expanded: g.expanded,
            children: g
                .children
                .iter()
                .filter_map(|child| encode_entry(history, *child))
                .collect(),
        },
    })
}

fn decode_entry(
    stored: StoredEntry,
    parent: Option<EntryId>,
    entries: &mut BTreeMap<EntryId, Entry>,
) -> Result<()> {
    let id = stored.id();
    if id.0 == u64::MAX {
        return Err(Error::invalid_document(format!("entry id {id} is out of range")));
    }
    if entries.contains_key(&id) {
        return Err(Error::invalid_document(format!("duplicate entry id {id}")));
    }

    let (label, created_at, body) = match stored {
        StoredEntry::Point {
            label,
            x,
            y,
            created_at,
            ..
        } => (label, created_at, Body::Point(Point::new(x, y))),
        StoredEntry::Measurement {
            label,
            start,
            end,
            auto_aligned,
            created_at,
            ..
        } => (
            label,
            created_at,
            Body::Measurement(Measurement {
                start,
                end,
                auto_aligned,
            }),
        ),
        StoredEntry::Group {
            label,
            created_at,
            expanded,
            children,
            ..
        } => {
            let ids = children.iter().map(StoredEntry::id).collect();
            // Reserve the id before descending so a child reusing it is caught.
            entries.insert(
                id,
                Entry {
                    id,
                    label: label.clone(),
                    created_at,
                    parent,
                    body: Body::Group(Group::default()),
                },
            );
            for child in children {
                decode_entry(child, Some(id), entries)?;
            }
            (
                label,
                created_at,
                Body::Group(Group {
                    children: ids,
                    expanded,
                }),
            )
        }
    };

    entries.insert(
        id,
        Entry {
            id,
            label,
            created_at,
            parent,
            body,
        },
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_history() -> History {
        let mut history = History::new();
        let a = history.add_point(0, 0, Some("origin"), None).unwrap();
        let g = history.add_group(Some("Header"), None).unwrap();
        let b = history.add_point(3, 4, None, Some(g)).unwrap();
        history.add_measurement(a, b, None, Some(g)).unwrap();
        history.set_expanded(g, false).unwrap();
        history
    }

    #[test]
    fn test_document_round_trip_preserves_history() {
        let history = sample_history();
        let document = Document::from_history(&history);
        let json = serde_json::to_string(&document).unwrap();

        let decoded: Document = serde_json::from_str(&json).unwrap();
        let restored = decoded.into_history().unwrap();

        let mut expected = history.clone();
        expected.mark_clean();
        assert_eq!(restored, expected);
    }

    #[test]
    fn test_document_shape() {
        let document = Document::from_history(&sample_history());
        let value = serde_json::to_value(&document).unwrap();

        assert_eq!(value["version"], 1);
        assert_eq!(value["next_id"], 5);
        assert_eq!(value["entries"][0]["kind"], "point");
        assert_eq!(value["entries"][1]["kind"], "group");
        assert_eq!(value["entries"][1]["expanded"], false);
        assert_eq!(value["entries"][1]["children"][1]["kind"], "measurement");
        assert_eq!(value["entries"][1]["children"][1]["start"], 1);
    }

    #[test]
    fn test_distance_is_never_written() {
        let document = Document::from_history(&sample_history());
        let json = serde_json::to_string(&document).unwrap();
        assert!(!json.contains("distance"));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let json = r#"{
            "version": 1, "next_id": 3,
            "entries": [
                {"kind": "point", "id": 1, "label": "a", "x": 0, "y": 0, "created_at": "2024-05-01T10:00:00Z"},
                {"kind": "group", "id": 2, "label": "g", "created_at": "2024-05-01T10:00:00Z",
                 "children": [
                    {"kind": "point", "id": 1, "label": "b", "x": 1, "y": 1, "created_at": "2024-05-01T10:00:00Z"}
                 ]}
            ]
        }"#;
        let document: Document = serde_json::from_str(json).unwrap();
        let err = document.into_history().unwrap_err();
        assert!(matches!(err, Error::InvalidDocument { .. }));
    }

    #[test]
    fn test_group_containing_itself_is_rejected() {
        let json = r#"{
            "version": 1, "next_id": 3,
            "entries": [
                {"kind": "group", "id": 2, "label": "g", "created_at": "2024-05-01T10:00:00Z",
                 "children": [
                    {"kind": "group", "id": 2, "label": "g", "created_at": "2024-05-01T10:00:00Z"}
                 ]}
            ]
        }"#;
        let document: Document = serde_json::from_str(json).unwrap();
        assert!(document.into_history().is_err());
    }

    #[test]
    fn test_stale_counter_is_repaired() {
        let json = r#"{
            "version": 1, "next_id": 1,
            "entries": [
                {"kind": "point", "id": 7, "label": "a", "x": 0, "y": 0, "created_at": "2024-05-01T10:00:00Z"}
            ]
        }"#;
        let document: Document = serde_json::from_str(json).unwrap();
        let history = document.into_history().unwrap();
        assert_eq!(history.next_id(), 8);
    }

    #[test]
    fn test_orphaned_measurement_survives_decoding() {
        let json = r#"{
            "version": 1, "next_id": 10,
            "entries": [
                {"kind": "measurement", "id": 3, "label": "gap", "start": 1, "end": 2,
                 "created_at": "2024-05-01T10:00:00Z"}
            ]
        }"#;
        let document: Document = serde_json::from_str(json).unwrap();
        let history = document.into_history().unwrap();
        assert_eq!(history.distance_of(EntryId(3)).unwrap(), None);
    }

    #[test]
    fn test_group_defaults() {
        let json = r#"{"kind": "group", "id": 1, "label": "g", "created_at": "2024-05-01T10:00:00Z"}"#;
        let stored: StoredEntry = serde_json::from_str(json).unwrap();
        assert_eq!(
            stored,
            StoredEntry::Group {
                id: EntryId(1),
                label: "g".to_string(),
                created_at: "2024-05-01T10:00:00Z".parse().unwrap(),
                expanded: true,
                children: Vec::new(),
            }
        );
    }

    #[test]
    fn test_largest_id_is_rejected() {
        let json = r#"{
            "version": 1, "next_id": 0,
            "entries": [
                {"kind": "point", "id": 18446744073709551615, "label": "a", "x": 0, "y": 0,
                 "created_at": "2024-05-01T10:00:00Z"}
            ]
        }"#;
        let document: Document = serde_json::from_str(json).unwrap();
        let err = document.into_history().unwrap_err();
        assert!(matches!(err, Error::InvalidDocument { .. }));
    }

    #[test]
    fn test_exhausted_counter_is_rejected() {
        let json = r#"{
            "version": 1, "next_id": 18446744073709551615,
            "entries": [
                {"kind": "point", "id": 1, "label": "keep me", "x": 7, "y": 7,
                 "created_at": "2024-05-01T10:00:00Z"}
            ]
        }"#;
        let document: Document = serde_json::from_str(json).unwrap();
        assert!(matches!(
            document.into_history(),
            Err(Error::InvalidDocument { .. })
        ));
    }

    #[test]
    fn test_counter_just_below_limit_is_accepted() {
        let json = r#"{
            "version": 1, "next_id": 18446744073709551614,
            "entries": [
                {"kind": "point", "id": 18446744073709551613, "label": "a", "x": 0, "y": 0,
                 "created_at": "2024-05-01T10:00:00Z"}
            ]
        }"#;
        let document: Document = serde_json::from_str(json).unwrap();
        let history = document.into_history().unwrap();
        assert_eq!(history.next_id(), u64::MAX - 1);
    }
}
