//! Command-line interface for screenmark.
//!
//! This module provides the CLI structure for the `smark` binary. Every
//! command opens the configured history, runs one operation and exits.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, ExportCommand, GroupCommand, ListCommand, MeasureCommand, MoveCommand,
    NearestCommand, PointCommand, RulerCommand, SortCommand, SortKeyArg, StatusCommand,
};

use crate::entry::EntryId;
use crate::logging::Verbosity;

/// smark - Keep a history of screen coordinates and pixel distances
///
/// Records points and measurements, organises them into groups, and exports
/// them as a plain-text report.
#[derive(Debug, Parser)]
#[command(name = "smark")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a point
    Point(PointCommand),

    /// Record a ruler capture between two screen positions
    Ruler(RulerCommand),

    /// Measure between two existing points
    Measure(MeasureCommand),

    /// Create, fill and fold groups
    #[command(subcommand)]
    Group(GroupCommand),

    /// Rename an entry
    Rename {
        /// Entry id
        id: EntryId,
        /// New label
        label: String,
    },

    /// Delete an entry (a group is deleted with its contents)
    Delete {
        /// Entry id
        id: EntryId,
    },

    /// Move an entry into a group or to another position
    Move(MoveCommand),

    /// Sort the children of a group or the top level
    Sort(SortCommand),

    /// Print the length of a measurement
    Distance {
        /// Measurement id
        id: EntryId,
    },

    /// Find the entry closest to a screen position
    Nearest(NearestCommand),

    /// List the history as a tree
    List(ListCommand),

    /// Write the plain-text report
    Export(ExportCommand),

    /// Remove every entry
    Clear {
        /// Confirm clearing the history
        #[arg(short, long)]
        yes: bool,
    },

    /// Show history statistics
    Status(StatusCommand),

    /// View or check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
