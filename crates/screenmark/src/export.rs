//! Plain-text report of a history.
//!
//! One line per entry in display order, with group nesting shown as
//! indentation.

use std::fmt::Write as _;

use crate::entry::{Body, Entry};
use crate::history::History;

/// Default report title.
pub const DEFAULT_TITLE: &str = "Screen Coordinate Tool Export";

/// Presentation settings for [`export_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// First line of the report.
    pub title: String,
    /// Spaces per nesting level.
    pub indent: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            indent: 2,
        }
    }
}

/// Render the whole history as a report.
#[must_use]
pub fn export_text(history: &History, options: &ExportOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", options.title);
    let _ = writeln!(out, "{}", "=".repeat(options.title.chars().count()));
    out.push('\n');

    for (depth, entry) in history.walk() {
        let _ = writeln!(
            out,
            "{}{}",
            " ".repeat(depth * options.indent),
            describe(history, entry)
        );
    }
    out
}

/// One-line description of an entry, as used in reports and listings.
#[must_use]
pub fn describe(history: &History, entry: &Entry) -> String {
    format!("{} {} - {}", icon(entry), entry.label, detail(history, entry))
}

/// The marker shown before an entry's label.
#[must_use]
pub fn icon(entry: &Entry) -> &'static str {
    match entry.body {
        Body::Point(_) => "📍",
        Body::Measurement(_) => "📏",
        Body::Group(_) => "📁",
    }
}

/// The coordinates, distance or item count of an entry.
#[must_use]
pub fn detail(history: &History, entry: &Entry) -> String {
    match &entry.body {
        Body::Point(p) => format!("({}, {})", p.x, p.y),
        Body::Measurement(m) => match history.endpoints(m) {
            Some((a, b)) => {
                let distance = crate::geometry::distance(a, b).trunc();
                let aligned = if m.auto_aligned { " [Aligned]" } else { "" };
                format!(
                    "{distance}px ({},{})→({},{}){aligned}",
                    a.x, a.y, b.x, b.y
                )
            }
            None => format!("orphaned (#{} → #{})", m.start, m.end),
        },
        Body::Group(g) => format!("{} items", g.len()),
    }
}
