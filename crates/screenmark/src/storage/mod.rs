//! Storage layer for screenmark.
//!
//! This module provides [`HistoryStore`], which owns a [`History`] together
//! with the JSON document it is persisted to. Every mutation is written back
//! to disk as soon as it has been applied, unless autosave is turned off.

pub mod migrations;
pub mod schema;

use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::capture::{CaptureEvent, Recorded};
use crate::entry::{EntryId, EntryKind};
use crate::error::{CorruptStoreWarning, Error, Result};
use crate::export::{export_text, ExportOptions};
use crate::history::{History, SortKey};

use schema::{Document, CURRENT_VERSION};

/// How a [`HistoryStore`] persists and recovers its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreOptions {
    /// Save after every successful mutation.
    pub autosave: bool,
    /// Fail loading on a corrupt document instead of starting empty.
    pub strict_load: bool,
    /// Copy a corrupt document aside before it can be overwritten.
    pub backup_corrupt: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            autosave: true,
            strict_load: false,
            backup_corrupt: true,
        }
    }
}

/// What [`HistoryStore::load`] found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No document exists yet; the history is empty.
    Missing,
    /// A current document was loaded.
    Loaded {
        /// Number of entries loaded.
        entries: usize,
    },
    /// An older document was loaded and upgraded in memory.
    Migrated {
        /// The version found on disk.
        from_version: u32,
        /// Number of entries after migration.
        entries: usize,
    },
    /// The document was unreadable; the history is empty.
    Corrupt(CorruptStoreWarning),
}

/// A history bound to the JSON document it is persisted to.
///
/// Construct one per process and hand it to the UI; there is no global
/// instance.
#[derive(Debug)]
pub struct HistoryStore {
    /// Path to the history document.
    path: PathBuf,
    /// The in-memory history.
    history: History,
    /// Persistence behaviour.
    options: StoreOptions,
}

impl HistoryStore {
    /// Create a store with an empty history, without touching the disk.
    #[must_use]
    pub fn new(path: impl AsRef<Path>, options: StoreOptions) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            history: History::new(),
            options,
        }
    }

    /// Create a store and load its document.
    ///
    /// # Errors
    ///
    /// See [`HistoryStore::load`].
    pub fn open(path: impl AsRef<Path>, options: StoreOptions) -> Result<(Self, LoadOutcome)> {
        let mut store = Self::new(path, options);
        let outcome = store.load()?;
        Ok((store, outcome))
    }

    /// Get the path to the history document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read access to the history.
    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The persistence options in effect.
    #[must_use]
    pub fn options(&self) -> StoreOptions {
        self.options
    }

    /// Whether there are changes not yet written to disk.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.history.is_dirty()
    }

    /// Replace the in-memory history with the document on disk.
    ///
    /// A missing document yields an empty history. A document that is not
    /// valid UTF-8 or cannot be decoded also yields an empty history and is
    /// reported as [`LoadOutcome::Corrupt`], after being copied aside when
    /// `backup_corrupt` is set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CorruptStore`] for a corrupt document in strict mode,
    /// and [`Error::Storage`] when the document cannot be read or, with
    /// `backup_corrupt` set, cannot be copied aside. The in-memory history is
    /// left untouched in those cases.
    pub fn load(&mut self) -> Result<LoadOutcome> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No history at {}, starting empty", self.path.display());
                self.history = History::new();
                return Ok(LoadOutcome::Missing);
            }
            Err(e) if e.kind() == ErrorKind::InvalidData => return self.recover(e.to_string()),
            Err(e) => return Err(Error::storage(&self.path, e)),
        };

        match migrations::decode(&text) {
            Ok((history, version)) => {
                self.history = history;
                let entries = self.history.len();
                info!(
                    "Loaded {} entries from {}",
                    entries,
                    self.path.display()
                );
                if version < CURRENT_VERSION {
                    self.history.mark_dirty();
                    Ok(LoadOutcome::Migrated {
                        from_version: version,
                        entries,
                    })
                } else {
                    Ok(LoadOutcome::Loaded { entries })
                }
            }
            Err(e) => self.recover(e.to_string()),
        }
    }

    fn recover(&mut self, reason: String) -> Result<LoadOutcome> {
        let mut warning = CorruptStoreWarning {
            path: self.path.clone(),
            reason,
            backup: None,
        };
        if self.options.strict_load {
            return Err(warning.into());
        }

        if self.options.backup_corrupt {
            let backup = sibling(&self.path, ".corrupt");
            // Never discard a document that could not be copied aside.
            if let Err(e) = fs::copy(&self.path, &backup) {
                warn!("Could not back up {}: {}", self.path.display(), e);
                return Err(Error::storage(&backup, e));
            }
            warning.backup = Some(backup);
        }

        warn!("{}", warning);
        self.history = History::new();
        Ok(LoadOutcome::Corrupt(warning))
    }

    /// Write the whole history to its document.
    ///
    /// Parent directories are created as needed and the document is replaced
    /// atomically.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the document cannot be written; the
    /// history stays dirty so a later save can retry.
    pub fn save(&mut self) -> Result<()> {
        let document = Document::from_history(&self.history);
        let json = serde_json::to_string_pretty(&document)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|source| Error::storage(parent, source))?;
            }
        }

        let temp_path = sibling(&self.path, ".tmp");
        fs::write(&temp_path, json).map_err(|source| Error::storage(&temp_path, source))?;
        fs::rename(&temp_path, &self.path).map_err(|source| {
            let _ = fs::remove_file(&temp_path);
            Error::storage(&self.path, source)
        })?;

        self.history.mark_clean();
        info!(
            "Saved {} entries to {}",
            self.history.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Persist after a successful mutation, if autosave is on.
    fn commit(&mut self) -> Result<()> {
        if self.options.autosave {
            self.save()
        } else {
            Ok(())
        }
    }

    /// Add a point. See [`History::add_point`].
    ///
    /// # Errors
    ///
    /// Returns a lookup error for a bad parent, or [`Error::Storage`] if the
    /// point was added but could not be saved.
    pub fn add_point(
        &mut self,
        x: i32,
        y: i32,
        label: Option<&str>,
        parent: Option<EntryId>,
    ) -> Result<EntryId> {
        let id = self.history.add_point(x, y, label, parent)?;
        self.commit()?;
        Ok(id)
    }

    /// Add a measurement. See [`History::add_measurement`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Reference`] for a missing endpoint, a lookup error for
    /// a bad parent, or [`Error::Storage`] if the save failed.
    pub fn add_measurement(
        &mut self,
        start: EntryId,
        end: EntryId,
        label: Option<&str>,
        parent: Option<EntryId>,
    ) -> Result<EntryId> {
        let id = self.history.add_measurement(start, end, label, parent)?;
        self.commit()?;
        Ok(id)
    }

    /// Add an empty group. See [`History::add_group`].
    ///
    /// # Errors
    ///
    /// Returns a lookup error for a bad parent, or [`Error::Storage`] if the
    /// save failed.
    pub fn add_group(&mut self, label: Option<&str>, parent: Option<EntryId>) -> Result<EntryId> {
        let id = self.history.add_group(label, parent)?;
        self.commit()?;
        Ok(id)
    }

    /// Wrap entries in a new group. See [`History::group_entries`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or [`Error::Storage`] if
    /// the save failed.
    pub fn group_entries(&mut self, ids: &[EntryId], label: Option<&str>) -> Result<EntryId> {
        let id = self.history.group_entries(ids, label)?;
        self.commit()?;
        Ok(id)
    }

    /// Apply a capture event. See [`History::record`].
    ///
    /// # Errors
    ///
    /// Returns a lookup error for a bad parent, or [`Error::Storage`] if the
    /// save failed.
    pub fn record(
        &mut self,
        event: CaptureEvent,
        align_ratio: u32,
        parent: Option<EntryId>,
    ) -> Result<Recorded> {
        let recorded = self.history.record(event, align_ratio, parent)?;
        self.commit()?;
        Ok(recorded)
    }

    /// Rename an entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or [`Error::Storage`] if
    /// the save failed.
    pub fn rename(&mut self, id: EntryId, label: &str) -> Result<()> {
        self.history.rename(id, label)?;
        self.commit()
    }

    /// Fold or unfold a group.
    ///
    /// # Errors
    ///
    /// Returns a lookup error, or [`Error::Storage`] if the save failed.
    pub fn set_expanded(&mut self, id: EntryId, expanded: bool) -> Result<()> {
        self.history.set_expanded(id, expanded)?;
        self.commit()
    }

    /// Delete an entry. See [`History::delete`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or [`Error::Storage`] if
    /// the save failed.
    pub fn delete(&mut self, id: EntryId) -> Result<Vec<EntryId>> {
        let removed = self.history.delete(id)?;
        self.commit()?;
        Ok(removed)
    }

    /// Remove every entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the save failed.
    pub fn clear(&mut self) -> Result<()> {
        self.history.clear();
        self.commit()
    }

    /// Move an entry to the end of a group or the top level.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cycle`] or a lookup error, or [`Error::Storage`] if the
    /// save failed.
    pub fn move_entry(&mut self, id: EntryId, parent: Option<EntryId>) -> Result<()> {
        self.history.move_entry(id, parent)?;
        self.commit()
    }

    /// Move an entry to a position. See [`History::move_to`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cycle`] or a lookup error, or [`Error::Storage`] if the
    /// save failed.
    pub fn move_to(
        &mut self,
        id: EntryId,
        parent: Option<EntryId>,
        index: Option<usize>,
    ) -> Result<()> {
        self.history.move_to(id, parent, index)?;
        self.commit()
    }

    /// Sort a container. See [`History::sort`].
    ///
    /// # Errors
    ///
    /// Returns a lookup error, or [`Error::Storage`] if the save failed.
    pub fn sort(&mut self, group: Option<EntryId>, key: SortKey, ascending: bool) -> Result<()> {
        self.history.sort(group, key, ascending)?;
        self.commit()
    }

    /// Current length of a measurement, or `None` if it is orphaned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is not a measurement.
    pub fn distance_of(&self, id: EntryId) -> Result<Option<f64>> {
        self.history.distance_of(id)
    }

    /// Render the history as a plain-text report.
    #[must_use]
    pub fn export_text(&self, options: &ExportOptions) -> String {
        export_text(&self.history, options)
    }

    /// Write the plain-text report to a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Storage`] if the file cannot be written.
    pub fn export_to(&self, path: impl AsRef<Path>, options: &ExportOptions) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.export_text(options)).map_err(|source| Error::storage(path, source))?;
        info!("Exported {} entries to {}", self.history.len(), path.display());
        Ok(())
    }

    /// Get history statistics.
    #[must_use]
    pub fn stats(&self) -> HistoryStats {
        let mut stats = HistoryStats {
            next_id: self.history.next_id(),
            dirty: self.history.is_dirty(),
            file_size_bytes: fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0),
            ..HistoryStats::default()
        };

        for (_, entry) in self.history.walk() {
            match entry.kind() {
                EntryKind::Point => stats.points += 1,
                EntryKind::Measurement => stats.measurements += 1,
                EntryKind::Group => stats.groups += 1,
            }
            stats.oldest_entry = Some(
                stats
                    .oldest_entry
                    .map_or(entry.created_at, |t| t.min(entry.created_at)),
            );
            stats.newest_entry = Some(
                stats
                    .newest_entry
                    .map_or(entry.created_at, |t| t.max(entry.created_at)),
            );
        }
        stats.orphans = self.history.orphans().len();
        stats
    }
}

/// Statistics about a stored history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryStats {
    /// Number of points.
    pub points: usize,
    /// Number of measurements, orphaned or not.
    pub measurements: usize,
    /// Number of groups.
    pub groups: usize,
    /// Number of orphaned measurements.
    pub orphans: usize,
    /// The id the next entry will receive.
    pub next_id: u64,
    /// Whether there are unsaved changes.
    pub dirty: bool,
    /// Creation time of the oldest entry.
    pub oldest_entry: Option<DateTime<Utc>>,
    /// Creation time of the newest entry.
    pub newest_entry: Option<DateTime<Utc>>,
    /// Size of the document on disk in bytes.
    pub file_size_bytes: u64,
}

/// `path` with `suffix` appended to its file name.
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("history"), OsString::from);
    name.push(suffix);
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn create_test_store(dir: &TempDir) -> HistoryStore {
        HistoryStore::new(dir.path().join("history.json"), StoreOptions::default())
    }

    fn reopen(store: &HistoryStore) -> (HistoryStore, LoadOutcome) {
        HistoryStore::open(store.path(), store.options()).unwrap()
    }

    #[test]
    fn test_open_missing_is_empty() {
        let dir = TempDir::new().unwrap();
        let (store, outcome) =
            HistoryStore::open(dir.path().join("history.json"), StoreOptions::default()).unwrap();
        assert_eq!(outcome, LoadOutcome::Missing);
        assert!(store.history().is_empty());
    }

    #[test]
    fn test_mutations_autosave() {
        let dir = TempDir::new().unwrap();
        let mut store = create_test_store(&dir);

        store.add_point(1, 2, None, None).unwrap();
        assert!(store.path().exists());
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut store = create_test_store(&dir);

        let g = store.add_group(Some("Header"), None).unwrap();
        let a = store.add_point(0, 0, Some("left"), Some(g)).unwrap();
        let b = store.add_point(3, 4, Some("right"), Some(g)).unwrap();
        let m = store.add_measurement(a, b, None, None).unwrap();
        store.set_expanded(g, false).unwrap();
        let gone = store.add_point(9, 9, None, None).unwrap();
        store.delete(gone).unwrap();

        let (reopened, outcome) = reopen(&store);
        assert_eq!(outcome, LoadOutcome::Loaded { entries: 4 });
        assert_eq!(reopened.history(), store.history());
        assert_eq!(reopened.history().next_id(), 6);
        let d = reopened.distance_of(m).unwrap().unwrap();
        assert!((d - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_invalid_json_loads_empty() {
        crate::logging::init_test_logging();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ this is not json").unwrap();

        let (store, outcome) = HistoryStore::open(&path, StoreOptions::default()).unwrap();
        assert!(store.history().is_empty());
        let LoadOutcome::Corrupt(warning) = outcome else {
            panic!("expected a corrupt outcome");
        };
        assert_eq!(warning.path, path);
        let backup = warning.backup.unwrap();
        assert_eq!(fs::read_to_string(backup).unwrap(), "{ this is not json");
    }

    #[test]
    fn test_invalid_json_without_backup() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "[1, 2").unwrap();

        let options = StoreOptions {
            backup_corrupt: false,
            ..StoreOptions::default()
        };
        let (_, outcome) = HistoryStore::open(&path, options).unwrap();
        assert!(matches!(outcome, LoadOutcome::Corrupt(CorruptStoreWarning { backup: None, .. })));
        assert!(!dir.path().join("history.json.corrupt").exists());
    }

    #[test]
    fn test_failed_backup_keeps_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "{ this is not json").unwrap();
        // A directory in the way makes the copy fail.
        fs::create_dir(dir.path().join("history.json.corrupt")).unwrap();

        let err = HistoryStore::open(&path, StoreOptions::default()).unwrap_err();
        assert!(err.is_storage_error());
        assert_eq!(fs::read_to_string(&path).unwrap(), "{ this is not json");
    }

    #[test]
    fn test_unreadable_path_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::create_dir(&path).unwrap();

        let options = StoreOptions {
            autosave: false,
            ..StoreOptions::default()
        };
        let mut store = HistoryStore::new(&path, options);
        store.add_point(3, 4, None, None).unwrap();

        let err = store.load().unwrap_err();
        assert!(err.is_storage_error());
        assert_eq!(store.history().len(), 1);
        assert!(path.is_dir());
        assert!(!dir.path().join("history.json.corrupt").exists());
    }

    #[test]
    fn test_out_of_range_id_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let json = r#"{"version": 1, "next_id": 0, "entries": [
            {"kind": "point", "id": 18446744073709551615, "label": "a", "x": 0, "y": 0,
             "created_at": "2024-05-01T10:00:00Z"}
        ]}"#;
        fs::write(&path, json).unwrap();

        let (store, outcome) = HistoryStore::open(&path, StoreOptions::default()).unwrap();
        assert!(store.history().is_empty());
        let LoadOutcome::Corrupt(warning) = outcome else {
            panic!("expected a corrupt outcome");
        };
        assert_eq!(fs::read_to_string(warning.backup.unwrap()).unwrap(), json);
    }

    #[test]
    fn test_strict_load_fails_and_keeps_history() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        let options = StoreOptions {
            strict_load: true,
            ..StoreOptions::default()
        };
        let mut store = HistoryStore::new(&path, options);
        store.add_point(1, 1, None, None).unwrap();
        fs::write(&path, "garbage").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, Error::CorruptStore(_)));
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn test_legacy_document_is_migrated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.json");
        fs::write(
            &path,
            r#"[{"type": "coordinate", "x": 4, "y": 2, "name": "pin", "timestamp": "2024-01-01T00:00:00"}]"#,
        )
        .unwrap();

        let (mut store, outcome) = HistoryStore::open(&path, StoreOptions::default()).unwrap();
        assert_eq!(
            outcome,
            LoadOutcome::Migrated {
                from_version: 0,
                entries: 1
            }
        );
        assert!(store.is_dirty());

        store.save().unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains(r#""version": 1"#));
    }

    #[test]
    fn test_autosave_off_keeps_dirty() {
        let dir = TempDir::new().unwrap();
        let options = StoreOptions {
            autosave: false,
            ..StoreOptions::default()
        };
        let mut store = HistoryStore::new(dir.path().join("history.json"), options);

        store.add_point(1, 1, None, None).unwrap();
        assert!(store.is_dirty());
        assert!(!store.path().exists());

        store.save().unwrap();
        assert!(!store.is_dirty());
        assert!(store.path().exists());
    }

    #[test]
    fn test_storage_error_keeps_mutation() {
        let dir = TempDir::new().unwrap();
        // A regular file where the parent directory should be.
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let mut store = HistoryStore::new(blocker.join("history.json"), StoreOptions::default());

        let err = store.add_point(1, 1, None, None).unwrap_err();
        assert!(err.is_storage_error());
        assert_eq!(store.history().len(), 1);
        assert!(store.is_dirty());

        store.add_point(2, 2, None, None).unwrap_err();
        assert_eq!(store.history().len(), 2);
    }

    #[test]
    fn test_failed_operation_does_not_save() {
        let dir = TempDir::new().unwrap();
        let mut store = create_test_store(&dir);
        let g = store.add_group(None, None).unwrap();
        let inner = store.add_group(None, Some(g)).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        let err = store.move_entry(g, Some(inner)).unwrap_err();
        assert!(matches!(err, Error::Cycle { .. }));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    #[test]
    fn test_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/history.json");
        let mut store = HistoryStore::new(&path, StoreOptions::default());

        store.add_point(0, 0, None, None).unwrap();
        assert!(path.exists());
        assert!(!sibling(&path, ".tmp").exists());
    }

    #[test]
    fn test_export_to_file() {
        let dir = TempDir::new().unwrap();
        let mut store = create_test_store(&dir);
        store.add_point(7, 8, Some("pin"), None).unwrap();

        let out = dir.path().join("coordinates.txt");
        store.export_to(&out, &ExportOptions::default()).unwrap();
        let text = fs::read_to_string(out).unwrap();
        assert!(text.contains("📍 pin - (7, 8)"));
    }

    #[test]
    fn test_record_ruler_persists() {
        let dir = TempDir::new().unwrap();
        let mut store = create_test_store(&dir);
        let event = CaptureEvent::Ruler {
            start: crate::entry::Point::new(0, 0),
            end: crate::entry::Point::new(0, 120),
            free: false,
        };
        let recorded = store.record(event, 10, None).unwrap();

        let (reopened, _) = reopen(&store);
        let d = reopened.distance_of(recorded.primary()).unwrap().unwrap();
        assert!((d - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats() {
        let dir = TempDir::new().unwrap();
        let mut store = create_test_store(&dir);
        let a = store.add_point(0, 0, None, None).unwrap();
        let b = store.add_point(1, 0, None, None).unwrap();
        store.add_measurement(a, b, None, None).unwrap();
        store.add_group(None, None).unwrap();
        store.delete(b).unwrap();

        let stats = store.stats();
        assert_eq!(stats.points, 1);
        assert_eq!(stats.measurements, 1);
        assert_eq!(stats.groups, 1);
        assert_eq!(stats.orphans, 1);
        assert_eq!(stats.next_id, 5);
        assert!(!stats.dirty);
        assert!(stats.file_size_bytes > 0);
        assert!(stats.oldest_entry <= stats.newest_entry);
    }

    #[test]
    fn test_stats_empty() {
        let dir = TempDir::new().unwrap();
        let store = create_test_store(&dir);
        let stats = store.stats();
        assert_eq!(stats, HistoryStats {
            next_id: 1,
            ..HistoryStats::default()
        });
    }

    #[test]
    fn test_sibling_paths() {
        let path = Path::new("/data/history.json");
        assert_eq!(sibling(path, ".tmp"), PathBuf::from("/data/history.json.tmp"));
        assert_eq!(
            sibling(path, ".corrupt"),
            PathBuf::from("/data/history.json.corrupt")
        );
    }
}
