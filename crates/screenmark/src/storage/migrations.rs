//! Document versioning for screenmark histories.
//!
//! This module detects the layout version of a persisted document and
//! upgrades older layouts to the current one before it is decoded.
//!
//! Version 0 is the legacy unversioned format: a bare array of items tagged by
//! `type` (`coordinate`, `measurement`, `folder`), where measurements carry
//! their own endpoint coordinates and a cached distance.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::entry::{EntryId, Measurement, Point, DEFAULT_GROUP_LABEL};
use crate::error::{Error, Result};
use crate::geometry;
use crate::history::History;

use super::schema::{Document, StoredEntry, CURRENT_VERSION};

/// Key holding the layout version in versioned documents.
const VERSION_KEY: &str = "version";

/// Decode a persisted document of any supported version.
///
/// Returns the history and the version the document was written in.
///
/// # Errors
///
/// Returns an error if the text is not JSON, the version is unsupported, or
/// the document breaks the layout rules.
pub fn decode(text: &str) -> Result<(History, u32)> {
    let value: Value = serde_json::from_str(text)?;
    let version = document_version(&value)?;

    let document = if version < CURRENT_VERSION {
        run_migrations(value, version)?
    } else {
        serde_json::from_value::<Document>(value)?
    };

    Ok((document.into_history()?, version))
}

/// Get the layout version of a parsed document.
///
/// A bare array is the legacy unversioned format, reported as 0.
fn document_version(value: &Value) -> Result<u32> {
    match value {
        Value::Array(_) => Ok(0),
        Value::Object(map) => {
            let version = map
                .get(VERSION_KEY)
                .and_then(Value::as_u64)
                .ok_or_else(|| Error::invalid_document("missing document version"))?;
            let version = u32::try_from(version)
                .map_err(|_| Error::invalid_document(format!("invalid version: {version}")))?;
            if version > CURRENT_VERSION {
                return Err(Error::invalid_document(format!(
                    "document version {version} is newer than supported version {CURRENT_VERSION}"
                )));
            }
            Ok(version)
        }
        _ => Err(Error::invalid_document("expected an object or an array")),
    }
}

/// Run migrations from the given version to the current version.
fn run_migrations(value: Value, from_version: u32) -> Result<Document> {
    let mut current = from_version;
    let mut value = value;

    while current < CURRENT_VERSION {
        current += 1;
        value = run_migration(value, current)?;
    }

    info!(
        "Migrated history document from version {} to {}",
        from_version, CURRENT_VERSION
    );
    Ok(serde_json::from_value(value)?)
}

/// Run a single migration step producing the given version.
fn run_migration(value: Value, version: u32) -> Result<Value> {
    match version {
        1 => migrate_v0_to_v1(value),
        _ => Err(Error::invalid_document(format!(
            "unknown migration version: {version}"
        ))),
    }
}

/// An item in the legacy format.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum LegacyItem {
    Coordinate {
        x: i32,
        y: i32,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        timestamp: Option<String>,
    },
    Measurement {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        timestamp: Option<String>,
        #[serde(default)]
        auto_aligned: Option<bool>,
    },
    Folder {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        timestamp: Option<String>,
        #[serde(default)]
        expanded: Option<bool>,
        #[serde(default)]
        items: Vec<LegacyItem>,
    },
    #[serde(other)]
    Unknown,
}

/// Migration from the legacy bare-array format.
///
/// Ids are allocated in document order. Each measurement becomes its two
/// endpoint points followed by the measurement, in the same container.
fn migrate_v0_to_v1(value: Value) -> Result<Value> {
    let items: Vec<LegacyItem> = serde_json::from_value(value)?;
    let mut next_id = 1;
    let entries = convert_items(items, &mut next_id);

    let document = Document {
        version: 1,
        next_id,
        entries,
    };
    Ok(serde_json::to_value(document)?)
}

fn allocate(next_id: &mut u64) -> EntryId {
    let id = EntryId(*next_id);
    *next_id += 1;
    id
}

fn convert_items(items: Vec<LegacyItem>, next_id: &mut u64) -> Vec<StoredEntry> {
    let mut out = Vec::with_capacity(items.len());

    for item in items {
        match item {
            LegacyItem::Coordinate {
                x,
                y,
                name,
                timestamp,
            } => out.push(StoredEntry::Point {
                id: allocate(next_id),
                label: name.unwrap_or_else(|| Point::new(x, y).default_label()),
                x,
                y,
                created_at: parse_timestamp(timestamp.as_deref()),
            }),
            LegacyItem::Measurement {
                x1,
                y1,
                x2,
                y2,
                name,
                timestamp,
                auto_aligned,
            } => {
                let created_at = parse_timestamp(timestamp.as_deref());
                let (a, b) = (Point::new(x1, y1), Point::new(x2, y2));
                let start = allocate(next_id);
                let end = allocate(next_id);
                out.push(StoredEntry::Point {
                    id: start,
                    label: a.default_label(),
                    x: x1,
                    y: y1,
                    created_at,
                });
                out.push(StoredEntry::Point {
                    id: end,
                    label: b.default_label(),
                    x: x2,
                    y: y2,
                    created_at,
                });
                out.push(StoredEntry::Measurement {
                    id: allocate(next_id),
                    label: name.unwrap_or_else(|| {
                        Measurement::default_label(geometry::distance(a, b))
                    }),
                    start,
                    end,
                    auto_aligned: auto_aligned.unwrap_or(false),
                    created_at,
                });
            }
            LegacyItem::Folder {
                name,
                timestamp,
                expanded,
                items,
            } => {
                let id = allocate(next_id);
                let children = convert_items(items, next_id);
                out.push(StoredEntry::Group {
                    id,
                    label: name.unwrap_or_else(|| DEFAULT_GROUP_LABEL.to_string()),
                    created_at: parse_timestamp(timestamp.as_deref()),
                    expanded: expanded.unwrap_or(true),
                    children,
                });
            }
            LegacyItem::Unknown => warn!("Skipping legacy item of unknown type"),
        }
    }

    out
}

/// Parse an RFC 3339 or naive ISO 8601 timestamp, read as UTC.
///
/// Unparseable or missing timestamps become the current time.
fn parse_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = raw else {
        return Utc::now();
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_utc();
    }
    warn!("Unparseable legacy timestamp {:?}, using now", raw);
    Utc::now()
}
