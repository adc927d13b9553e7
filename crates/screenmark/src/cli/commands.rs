//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::entry::EntryId;
use crate::history::SortKey;

/// Record a point.
#[derive(Debug, Args)]
pub struct PointCommand {
    /// Pixel column
    #[arg(allow_negative_numbers = true)]
    pub x: i32,

    /// Pixel row
    #[arg(allow_negative_numbers = true)]
    pub y: i32,

    /// Label instead of "Point (x, y)"
    #[arg(short, long)]
    pub label: Option<String>,

    /// Group to add the point to
    #[arg(short, long, value_name = "ID")]
    pub group: Option<EntryId>,
}

/// Record a ruler capture: two points and the measurement between them.
#[derive(Debug, Args)]
pub struct RulerCommand {
    /// Start column
    #[arg(allow_negative_numbers = true)]
    pub x1: i32,

    /// Start row
    #[arg(allow_negative_numbers = true)]
    pub y1: i32,

    /// End column
    #[arg(allow_negative_numbers = true)]
    pub x2: i32,

    /// End row
    #[arg(allow_negative_numbers = true)]
    pub y2: i32,

    /// Keep the end point exactly where it is, without snapping to an axis
    #[arg(long)]
    pub free: bool,

    /// Label for the measurement
    #[arg(short, long)]
    pub label: Option<String>,

    /// Group to add the entries to
    #[arg(short, long, value_name = "ID")]
    pub group: Option<EntryId>,
}

/// Measure between two existing points.
#[derive(Debug, Args)]
pub struct MeasureCommand {
    /// Start point id
    pub start: EntryId,

    /// End point id
    pub end: EntryId,

    /// Label instead of "Measurement Npx"
    #[arg(short, long)]
    pub label: Option<String>,

    /// Group to add the measurement to
    #[arg(short, long, value_name = "ID")]
    pub group: Option<EntryId>,
}

/// Group commands.
#[derive(Debug, Subcommand)]
pub enum GroupCommand {
    /// Create an empty group
    New {
        /// Group label
        label: String,

        /// Parent group
        #[arg(short, long, value_name = "ID")]
        parent: Option<EntryId>,
    },

    /// Wrap entries in a new group placed where the first one was
    Wrap {
        /// Entries to wrap
        #[arg(required = true)]
        ids: Vec<EntryId>,

        /// Group label
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Collapse a group in listings
    Fold {
        /// Group id
        id: EntryId,
    },

    /// Expand a group in listings
    Unfold {
        /// Group id
        id: EntryId,
    },
}

/// Move command arguments.
#[derive(Debug, Args)]
pub struct MoveCommand {
    /// Entry to move
    pub id: EntryId,

    /// Destination group (top level if omitted)
    #[arg(short, long, value_name = "ID")]
    pub into: Option<EntryId>,

    /// Position among the destination's children (end if omitted)
    #[arg(short, long, value_name = "INDEX")]
    pub at: Option<usize>,
}

/// Sort command arguments.
#[derive(Debug, Args)]
pub struct SortCommand {
    /// Group whose children to sort (top level if omitted)
    #[arg(short, long, value_name = "ID")]
    pub group: Option<EntryId>,

    /// Sort key
    #[arg(short, long, value_enum, default_value = "label")]
    pub by: SortKeyArg,

    /// Sort in descending order
    #[arg(short, long)]
    pub desc: bool,
}

/// Nearest command arguments.
#[derive(Debug, Args)]
pub struct NearestCommand {
    /// Pixel column
    #[arg(allow_negative_numbers = true)]
    pub x: i32,

    /// Pixel row
    #[arg(allow_negative_numbers = true)]
    pub y: i32,

    /// Search radius in pixels (configured hit radius if omitted)
    #[arg(short, long)]
    pub radius: Option<f64>,
}

/// List command arguments.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Only show entries whose label matches this regular expression
    #[arg(short, long, value_name = "REGEX")]
    pub filter: Option<String>,

    /// Output the stored document as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Sort key argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKeyArg {
    /// By label
    Label,
    /// By creation time
    Created,
    /// By measured distance
    Distance,
}

impl From<SortKeyArg> for SortKey {
    fn from(arg: SortKeyArg) -> Self {
        match arg {
            SortKeyArg::Label => Self::Label,
            SortKeyArg::Created => Self::CreatedAt,
            SortKeyArg::Distance => Self::Distance,
        }
    }
}
