//! In-memory history of captured points, measurements and groups.
//!
//! The history is an arena of [`Entry`] records keyed by [`EntryId`]. Groups
//! list their children by id instead of owning them, so the tree has no
//! ownership cycles and cycle checks on move only need to walk parent links.
//!
//! Every operation validates its arguments before touching the arena: a call
//! that returns an error leaves the history exactly as it was.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use regex::Regex;
use tracing::debug;

use crate::capture::{CaptureEvent, Recorded};
use crate::entry::{Body, Entry, EntryId, Group, Measurement, Point, DEFAULT_GROUP_LABEL};
use crate::error::{Error, Result};
use crate::geometry;

/// Key used to order the children of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    /// Order by display label.
    Label,
    /// Order by creation time.
    CreatedAt,
    /// Order by measured distance; entries without one sort last.
    Distance,
}

/// The full set of entries plus their ordering and grouping.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    entries: BTreeMap<EntryId, Entry>,
    root: Vec<EntryId>,
    next_id: u64,
    dirty: bool,
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}

impl History {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            root: Vec::new(),
            next_id: 1,
            dirty: false,
        }
    }

    /// Rebuild a history from decoded parts.
    ///
    /// The caller is responsible for the tree invariants; the result starts clean.
    pub(crate) fn from_parts(
        entries: BTreeMap<EntryId, Entry>,
        root: Vec<EntryId>,
        next_id: u64,
    ) -> Self {
        Self {
            entries,
            root,
            next_id,
            dirty: false,
        }
    }

    /// Number of entries of any kind, including nested ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the history holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The id the next created entry will receive.
    #[must_use]
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Whether there are changes not yet written to disk.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Look up an entry.
    #[must_use]
    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.get(&id)
    }

    /// Look up an entry, failing with [`Error::NotFound`].
    ///
    /// # Errors
    ///
    /// Returns an error if no entry has the given id.
    pub fn entry(&self, id: EntryId) -> Result<&Entry> {
        self.entries.get(&id).ok_or(Error::NotFound { id })
    }

    /// Ids of the top-level entries, in order.
    #[must_use]
    pub fn roots(&self) -> &[EntryId] {
        &self.root
    }

    /// Ids of the children of `parent` (or of the top level), in order.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is unknown or not a group.
    pub fn children(&self, parent: Option<EntryId>) -> Result<&[EntryId]> {
        self.container(parent).map(Vec::as_slice)
    }

    /// Iterate over all entries in display order, with their nesting depth.
    #[must_use]
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            history: self,
            stack: self.root.iter().rev().map(|id| (0, *id)).collect(),
        }
    }

    /// Add a point to the end of `parent` (or of the top level).
    ///
    /// Without a label the point is named after its coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is unknown or not a group, or
    /// [`Error::IdsExhausted`] once the id counter has run out.
    pub fn add_point(
        &mut self,
        x: i32,
        y: i32,
        label: Option<&str>,
        parent: Option<EntryId>,
    ) -> Result<EntryId> {
        self.container(parent)?;

        let point = Point::new(x, y);
        let label = label.map_or_else(|| point.default_label(), str::to_string);
        let id = self.attach(label, parent, Body::Point(point))?;
        debug!("Added point {} at ({}, {})", id, x, y);
        Ok(id)
    }

    /// Add a measurement between two existing points.
    ///
    /// Without a label the measurement is named after its current length.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Reference`] if either endpoint is not an existing point,
    /// or a lookup error if `parent` is unknown or not a group.
    pub fn add_measurement(
        &mut self,
        start: EntryId,
        end: EntryId,
        label: Option<&str>,
        parent: Option<EntryId>,
    ) -> Result<EntryId> {
        self.insert_measurement(start, end, label, parent, false)
    }

    fn insert_measurement(
        &mut self,
        start: EntryId,
        end: EntryId,
        label: Option<&str>,
        parent: Option<EntryId>,
        auto_aligned: bool,
    ) -> Result<EntryId> {
        let a = *self.point(start).ok_or(Error::Reference { id: start })?;
        let b = *self.point(end).ok_or(Error::Reference { id: end })?;
        self.container(parent)?;

        let label = label.map_or_else(
            || Measurement::default_label(geometry::distance(a, b)),
            str::to_string,
        );
        let measurement = Measurement {
            start,
            end,
            auto_aligned,
        };
        let id = self.attach(label, parent, Body::Measurement(measurement))?;
        debug!("Added measurement {} between {} and {}", id, start, end);
        Ok(id)
    }

    /// Add an empty group to the end of `parent` (or of the top level).
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is unknown or not a group.
    pub fn add_group(&mut self, label: Option<&str>, parent: Option<EntryId>) -> Result<EntryId> {
        self.container(parent)?;

        let label = label.unwrap_or(DEFAULT_GROUP_LABEL).to_string();
        let id = self.attach(label, parent, Body::Group(Group::default()))?;
        debug!("Added group {}", id);
        Ok(id)
    }

    /// Wrap a selection of entries in a new group.
    ///
    /// The group takes the place of the first selected entry, and the
    /// selection moves into it in the order given. Entries whose ancestor is
    /// also selected stay inside that ancestor. An empty selection creates an
    /// empty top-level group.
    ///
    /// # Errors
    ///
    /// Returns an error if any id is unknown.
    pub fn group_entries(&mut self, ids: &[EntryId], label: Option<&str>) -> Result<EntryId> {
        for id in ids {
            self.entry(*id)?;
        }

        let selected: HashSet<EntryId> = ids.iter().copied().collect();
        let mut seen = HashSet::new();
        let members: Vec<EntryId> = ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .filter(|id| !self.ancestors(*id).any(|a| selected.contains(&a)))
            .collect();

        let Some(first) = members.first().copied() else {
            return self.add_group(label, None);
        };

        let parent = self.entry(first)?.parent;
        let index = self
            .container(parent)?
            .iter()
            .position(|c| *c == first)
            .unwrap_or(0);

        let label = label.unwrap_or(DEFAULT_GROUP_LABEL).to_string();
        let group = self.allocate_id()?;
        self.entries
            .insert(group, Entry::new(group, label, parent, Body::Group(Group::default())));
        self.container_mut(parent)?.insert(index, group);

        for id in &members {
            self.detach(*id)?;
            self.place(*id, Some(group), None)?;
        }

        self.dirty = true;
        debug!("Grouped {} entries into {}", members.len(), group);
        Ok(group)
    }

    /// Change an entry's label.
    ///
    /// # Errors
    ///
    /// Returns an error if no entry has the given id.
    pub fn rename(&mut self, id: EntryId, label: &str) -> Result<()> {
        let entry = self.entries.get_mut(&id).ok_or(Error::NotFound { id })?;
        entry.label = label.to_string();
        self.dirty = true;
        debug!("Renamed {} to {:?}", id, label);
        Ok(())
    }

    /// Fold or unfold a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is unknown or not a group.
    pub fn set_expanded(&mut self, id: EntryId, expanded: bool) -> Result<()> {
        let group = self
            .entries
            .get_mut(&id)
            .ok_or(Error::NotFound { id })?
            .as_group_mut()
            .ok_or(Error::NotAGroup { id })?;
        group.expanded = expanded;
        self.dirty = true;
        Ok(())
    }

    /// Delete an entry.
    ///
    /// Deleting a group deletes everything inside it. Measurements that
    /// referenced a deleted point are kept and become orphaned. Returns the
    /// ids of every removed entry.
    ///
    /// # Errors
    ///
    /// Returns an error if no entry has the given id.
    pub fn delete(&mut self, id: EntryId) -> Result<Vec<EntryId>> {
        self.entry(id)?;
        self.detach(id)?;

        let removed = self.subtree(id);
        for removed_id in &removed {
            self.entries.remove(removed_id);
        }
        self.dirty = true;

        let orphaned = self
            .entries
            .values()
            .filter_map(Entry::as_measurement)
            .filter(|m| removed.iter().any(|r| m.references(*r)))
            .count();
        debug!(
            "Deleted {} ({} entries, {} measurements orphaned)",
            id,
            removed.len(),
            orphaned
        );
        Ok(removed)
    }

    /// Remove every entry. The id counter is kept so ids are never reused.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.root.clear();
        self.dirty = true;
        debug!("Cleared history");
    }

    /// Move an entry to the end of `parent` (or of the top level).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cycle`] if `parent` is the entry itself or one of its
    /// descendants, or a lookup error if either id is invalid.
    pub fn move_entry(&mut self, id: EntryId, parent: Option<EntryId>) -> Result<()> {
        self.move_to(id, parent, None)
    }

    /// Move an entry into `parent` at `index` (clamped; `None` appends).
    ///
    /// The index refers to the destination after the entry has been taken out,
    /// so this also reorders entries within one container.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cycle`] if `parent` is the entry itself or one of its
    /// descendants, or a lookup error if either id is invalid.
    pub fn move_to(
        &mut self,
        id: EntryId,
        parent: Option<EntryId>,
        index: Option<usize>,
    ) -> Result<()> {
        self.entry(id)?;
        self.container(parent)?;
        if let Some(target) = parent {
            if target == id || self.ancestors(target).any(|a| a == id) {
                return Err(Error::Cycle { id, target });
            }
        }

        self.detach(id)?;
        self.place(id, parent, index)?;
        self.dirty = true;
        debug!("Moved {} into {:?}", id, parent);
        Ok(())
    }

    /// Reorder the children of `group` (or the top level) by `key`.
    ///
    /// The sort is stable: entries with equal keys keep their relative order.
    /// For [`SortKey::Distance`], entries without a distance always go last.
    ///
    /// # Errors
    ///
    /// Returns an error if `group` is unknown or not a group.
    pub fn sort(&mut self, group: Option<EntryId>, key: SortKey, ascending: bool) -> Result<()> {
        let mut ids = self.container(group)?.clone();
        ids.sort_by(|a, b| self.compare(*a, *b, key, ascending));
        *self.container_mut(group)? = ids;
        self.dirty = true;
        debug!("Sorted {:?} by {:?}", group, key);
        Ok(())
    }

    fn compare(&self, a: EntryId, b: EntryId, key: SortKey, ascending: bool) -> Ordering {
        let directed = |ord: Ordering| if ascending { ord } else { ord.reverse() };
        let (Some(ea), Some(eb)) = (self.entries.get(&a), self.entries.get(&b)) else {
            return Ordering::Equal;
        };

        match key {
            SortKey::Label => directed(ea.label.cmp(&eb.label)),
            SortKey::CreatedAt => directed(ea.created_at.cmp(&eb.created_at)),
            SortKey::Distance => {
                match (self.entry_distance(ea), self.entry_distance(eb)) {
                    (Some(da), Some(db)) => directed(da.total_cmp(&db)),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }
        }
    }

    /// Current length of a measurement, or `None` if it is orphaned.
    ///
    /// Always recomputed from the endpoints' present coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is not a measurement.
    pub fn distance_of(&self, id: EntryId) -> Result<Option<f64>> {
        let measurement = self
            .entry(id)?
            .as_measurement()
            .ok_or(Error::NotFound { id })?;
        Ok(self.measurement_distance(measurement))
    }

    /// Endpoint coordinates of a measurement, if both still exist.
    #[must_use]
    pub fn endpoints(&self, measurement: &Measurement) -> Option<(Point, Point)> {
        Some((*self.point(measurement.start)?, *self.point(measurement.end)?))
    }

    fn measurement_distance(&self, measurement: &Measurement) -> Option<f64> {
        self.endpoints(measurement)
            .map(|(a, b)| geometry::distance(a, b))
    }

    fn entry_distance(&self, entry: &Entry) -> Option<f64> {
        entry
            .as_measurement()
            .and_then(|m| self.measurement_distance(m))
    }

    /// Check whether a measurement has lost one of its endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the id is not a measurement.
    pub fn is_orphaned(&self, id: EntryId) -> Result<bool> {
        self.distance_of(id).map(|d| d.is_none())
    }

    /// Ids of all orphaned measurements, in id order.
    #[must_use]
    pub fn orphans(&self) -> Vec<EntryId> {
        self.entries
            .values()
            .filter(|e| {
                e.as_measurement()
                    .is_some_and(|m| self.endpoints(m).is_none())
            })
            .map(|e| e.id)
            .collect()
    }

    /// Ids of entries whose label matches `pattern`, in display order.
    #[must_use]
    pub fn find(&self, pattern: &Regex) -> Vec<EntryId> {
        self.walk()
            .filter(|(_, e)| pattern.is_match(&e.label))
            .map(|(_, e)| e.id)
            .collect()
    }

    /// The point or measurement closest to `(x, y)`, if any lies strictly
    /// within `radius` pixels.
    ///
    /// Measurements are hit along their whole segment. Orphaned measurements
    /// and groups are never hit. Ties go to the entry earlier in display order.
    #[must_use]
    pub fn nearest(&self, x: i32, y: i32, radius: f64) -> Option<EntryId> {
        let (px, py) = (f64::from(x), f64::from(y));
        let mut best: Option<(EntryId, f64)> = None;

        for (_, entry) in self.walk() {
            let d = match &entry.body {
                Body::Point(p) => (px - f64::from(p.x)).hypot(py - f64::from(p.y)),
                Body::Measurement(m) => match self.endpoints(m) {
                    Some((a, b)) => geometry::distance_to_segment(px, py, a, b),
                    None => continue,
                },
                Body::Group(_) => continue,
            };
            let limit = best.map_or(radius, |(_, d)| d);
            if d < limit {
                best = Some((entry.id, d));
            }
        }

        best.map(|(id, _)| id)
    }

    /// Apply a capture event from the overlay.
    ///
    /// A point capture adds one point. A ruler capture adds both endpoints and
    /// the measurement between them, snapping the end onto an axis according
    /// to `align_ratio` unless the event asks for a free measurement.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` is unknown or not a group, or
    /// [`Error::IdsExhausted`] if the capture cannot get all of its ids.
    pub fn record(
        &mut self,
        event: CaptureEvent,
        align_ratio: u32,
        parent: Option<EntryId>,
    ) -> Result<Recorded> {
        self.container(parent)?;
        // A ruler needs all three ids or none.
        self.ensure_ids(3)?;
        debug!("Recording {} capture", event.mode());

        match event {
            CaptureEvent::Point { x, y } => {
                let id = self.add_point(x, y, None, parent)?;
                Ok(Recorded::Point(id))
            }
            CaptureEvent::Ruler { start, end, free } => {
                let aligned_end = if free {
                    end
                } else {
                    geometry::align(start, end, align_ratio)
                };
                let auto_aligned = aligned_end != end;

                let start_id = self.add_point(start.x, start.y, None, parent)?;
                let end_id = self.add_point(aligned_end.x, aligned_end.y, None, parent)?;
                let measurement =
                    self.insert_measurement(start_id, end_id, None, parent, auto_aligned)?;
                Ok(Recorded::Ruler {
                    start: start_id,
                    end: end_id,
                    measurement,
                    auto_aligned,
                })
            }
        }
    }

    fn point(&self, id: EntryId) -> Option<&Point> {
        self.entries.get(&id).and_then(Entry::as_point)
    }

    /// Check that `count` more ids can be issued.
    fn ensure_ids(&self, count: u64) -> Result<()> {
        self.next_id
            .checked_add(count)
            .map(|_| ())
            .ok_or(Error::IdsExhausted)
    }

    /// Issue the next id. `u64::MAX` itself is never issued.
    fn allocate_id(&mut self) -> Result<EntryId> {
        let next = self.next_id.checked_add(1).ok_or(Error::IdsExhausted)?;
        let id = EntryId(self.next_id);
        self.next_id = next;
        Ok(id)
    }

    /// Create an entry at the end of an already validated container.
    fn attach(&mut self, label: String, parent: Option<EntryId>, body: Body) -> Result<EntryId> {
        let id = self.allocate_id()?;
        self.entries.insert(id, Entry::new(id, label, parent, body));
        if let Ok(container) = self.container_mut(parent) {
            container.push(id);
        }
        self.dirty = true;
        Ok(id)
    }

    fn container(&self, parent: Option<EntryId>) -> Result<&Vec<EntryId>> {
        match parent {
            None => Ok(&self.root),
            Some(id) => self
                .entries
                .get(&id)
                .ok_or(Error::NotFound { id })?
                .as_group()
                .map(|g| &g.children)
                .ok_or(Error::NotAGroup { id }),
        }
    }

    fn container_mut(&mut self, parent: Option<EntryId>) -> Result<&mut Vec<EntryId>> {
        match parent {
            None => Ok(&mut self.root),
            Some(id) => self
                .entries
                .get_mut(&id)
                .ok_or(Error::NotFound { id })?
                .as_group_mut()
                .map(|g| &mut g.children)
                .ok_or(Error::NotAGroup { id }),
        }
    }

    /// Take an entry out of its container, leaving it in the arena.
    fn detach(&mut self, id: EntryId) -> Result<()> {
        let parent = self.entry(id)?.parent;
        self.container_mut(parent)?.retain(|c| *c != id);
        Ok(())
    }

    /// Put a detached entry into `parent` at `index` (clamped; `None` appends).
    fn place(&mut self, id: EntryId, parent: Option<EntryId>, index: Option<usize>) -> Result<()> {
        let container = self.container_mut(parent)?;
        let index = index.map_or(container.len(), |i| i.min(container.len()));
        container.insert(index, id);
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.parent = parent;
        }
        Ok(())
    }

    /// Parent chain of an entry, nearest first.
    fn ancestors(&self, id: EntryId) -> impl Iterator<Item = EntryId> + '_ {
        std::iter::successors(self.entries.get(&id).and_then(|e| e.parent), |p| {
            self.entries.get(p).and_then(|e| e.parent)
        })
    }

    /// The entry and all of its descendants.
    fn subtree(&self, id: EntryId) -> Vec<EntryId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(group) = self.entries.get(&current).and_then(Entry::as_group) {
                stack.extend(group.children.iter().copied());
            }
        }
        out
    }
}

/// Pre-order iterator over a history, yielding `(depth, entry)`.
#[derive(Debug)]
pub struct Walk<'a> {
    history: &'a History,
    stack: Vec<(usize, EntryId)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a Entry);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((depth, id)) = self.stack.pop() {
            let Some(entry) = self.history.entries.get(&id) else {
                continue;
            };
            if let Some(group) = entry.as_group() {
                self.stack
                    .extend(group.children.iter().rev().map(|c| (depth + 1, *c)));
            }
            return Some((depth, entry));
        }
        None
    }
}
