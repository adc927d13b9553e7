//! `screenmark` - A history of screen coordinates and pixel distances
//!
//! This library keeps an ordered, groupable history of captured points and
//! the measurements between them, persists it as a JSON document, and renders
//! it as a plain-text report.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod capture;
pub mod cli;
pub mod config;
pub mod entry;
pub mod error;
pub mod export;
pub mod geometry;
pub mod history;
pub mod logging;
pub mod storage;

pub use capture::{CaptureEvent, Recorded};
pub use config::Config;
pub use entry::{Entry, EntryId, EntryKind, Group, Measurement, Point};
pub use error::{CorruptStoreWarning, Error, Result};
pub use export::{export_text, ExportOptions};
pub use history::{History, SortKey};
pub use logging::init_logging;
pub use storage::{HistoryStats, HistoryStore, LoadOutcome, StoreOptions};
