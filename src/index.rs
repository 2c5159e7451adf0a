//! The canonical deduplicated photo collection and its derived groupings.
//!
//! `PhotoIndex` is plain single-threaded state. All mutation arrives through
//! the gallery owner loop (`tasks::gallery`), which is the one logical thread
//! allowed to touch it; ingestion workers only ever communicate via channel
//! messages, so the completion counters here never race.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, info};

use crate::record::{AssetId, PhotoRecord};
use crate::selection::SelectionManager;

/// Consistent read-only view published to renderers after every mutation.
#[derive(Debug, Clone, Default)]
pub struct GallerySnapshot {
    pub photos: Vec<PhotoRecord>,
    pub year_groups: BTreeMap<i32, Vec<AssetId>>,
    pub month_groups: BTreeMap<i32, BTreeMap<u32, Vec<AssetId>>>,
    pub sorted_years: Vec<i32>,
    pub is_loading: bool,
    pub selected: Option<AssetId>,
    pub selection_count: usize,
}

#[derive(Debug, Default)]
pub struct PhotoIndex {
    /// Insertion-ordered, at most one record per id.
    photos: Vec<PhotoRecord>,
    /// year -> ids in ingestion arrival order.
    year_groups: BTreeMap<i32, Vec<AssetId>>,
    /// year -> month -> ids in ingestion arrival order.
    month_groups: BTreeMap<i32, BTreeMap<u32, Vec<AssetId>>>,
    selection: SelectionManager,
    /// Record currently open in the detail pager; never dangles.
    selected: Option<AssetId>,
    is_loading: bool,
    /// Current ingestion pass generation. Counter events from older passes
    /// are ignored; insertions stay idempotent regardless.
    pass: u64,
    total: usize,
    processed: usize,
    /// Ids enumerated by the current pass; records outside it are pruned
    /// when the pass completes.
    expected: Option<HashSet<AssetId>>,
}

impl PhotoIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn photos(&self) -> &[PhotoRecord] {
        &self.photos
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.photos.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.is_loading = loading;
    }

    #[must_use]
    pub fn selected(&self) -> Option<&AssetId> {
        self.selected.as_ref()
    }

    #[must_use]
    pub fn selection_count(&self) -> usize {
        self.selection.len()
    }

    #[must_use]
    pub fn selection_ids(&self) -> Vec<AssetId> {
        self.selection.ids().to_vec()
    }

    #[must_use]
    pub fn contains(&self, id: &AssetId) -> bool {
        self.position(id).is_some()
    }

    #[must_use]
    pub fn get(&self, id: &AssetId) -> Option<&PhotoRecord> {
        self.position(id).map(|i| &self.photos[i])
    }

    fn position(&self, id: &AssetId) -> Option<usize> {
        self.photos.iter().position(|r| r.id == *id)
    }

    /// Ascending list of all years present in the year grouping.
    #[must_use]
    pub fn sorted_years(&self) -> Vec<i32> {
        self.year_groups.keys().copied().collect()
    }

    #[must_use]
    pub fn year_group(&self, year: i32) -> Option<&[AssetId]> {
        self.year_groups.get(&year).map(Vec::as_slice)
    }

    #[must_use]
    pub fn month_group(&self, year: i32, month: u32) -> Option<&[AssetId]> {
        self.month_groups
            .get(&year)
            .and_then(|m| m.get(&month))
            .map(Vec::as_slice)
    }

    // --- ingestion ---------------------------------------------------------

    /// Start (or restart) an ingestion pass. Counters are reset together with
    /// the new generation; a pass older than the current one is ignored.
    pub fn begin_pass(&mut self, pass: u64, ids: Vec<AssetId>) {
        if pass < self.pass {
            debug!(pass, current = self.pass, "ignoring stale pass start");
            return;
        }
        self.pass = pass;
        self.total = ids.len();
        self.processed = 0;
        self.is_loading = true;
        self.expected = Some(ids.into_iter().collect());
        info!(pass, total = self.total, "ingestion pass started");
        if self.total == 0 {
            self.finish_pass();
        }
    }

    /// Apply one decoded record. Insertion is idempotent per id; only the
    /// current pass advances the completion counter.
    pub fn record_ingested(&mut self, pass: u64, record: PhotoRecord) {
        self.insert_record(record);
        if pass == self.pass {
            self.note_processed();
        }
    }

    /// A per-item thumbnail failure: no record, but the item still counts
    /// toward completion.
    pub fn record_skipped(&mut self, pass: u64, id: &AssetId) {
        debug!(%id, "thumbnail fetch failed; skipping item");
        if pass == self.pass {
            self.note_processed();
        }
    }

    fn insert_record(&mut self, record: PhotoRecord) {
        // Group insertion is guarded by the same per-id containment check as
        // the canonical sequence, so repeated or out-of-order completions
        // never duplicate an entry.
        if let Some((year, month)) = record.year_month() {
            let years = self.year_groups.entry(year).or_default();
            if !years.contains(&record.id) {
                years.push(record.id.clone());
            }
            let months = self
                .month_groups
                .entry(year)
                .or_default()
                .entry(month)
                .or_default();
            if !months.contains(&record.id) {
                months.push(record.id.clone());
            }
        }
        if !self.contains(&record.id) {
            self.photos.push(record);
        }
    }

    fn note_processed(&mut self) {
        self.processed += 1;
        if self.processed >= self.total {
            self.finish_pass();
        }
    }

    fn finish_pass(&mut self) {
        if let Some(expected) = self.expected.take() {
            let stale: Vec<AssetId> = self
                .photos
                .iter()
                .filter(|r| !expected.contains(&r.id))
                .map(|r| r.id.clone())
                .collect();
            if !stale.is_empty() {
                debug!(count = stale.len(), "pruning records absent from pass");
                self.remove_many(&stale);
            }
        }
        self.is_loading = false;
        self.ensure_selected();
        info!(
            pass = self.pass,
            photos = self.photos.len(),
            "ingestion pass complete"
        );
    }

    /// If nothing is open in the detail pager, open the last record.
    fn ensure_selected(&mut self) {
        let dangling = self
            .selected
            .as_ref()
            .is_some_and(|id| !self.contains(id));
        if dangling {
            self.selected = None;
        }
        if self.selected.is_none() {
            self.selected = self.photos.last().map(|r| r.id.clone());
        }
    }

    // --- selection ---------------------------------------------------------

    /// Flip edit-mode selection on the record with this id.
    pub fn toggle_selection(&mut self, id: &AssetId) -> Option<bool> {
        let idx = self.position(id)?;
        Some(self.selection.toggle(&mut self.photos[idx]))
    }

    /// Exit edit mode: empty the set, unflag every record, all other fields
    /// untouched.
    pub fn clear_selection(&mut self) {
        self.selection.clear(&mut self.photos);
    }

    // --- detail pager ------------------------------------------------------

    /// Open a record in the detail pager. No-op for unknown ids.
    pub fn open(&mut self, id: &AssetId) -> bool {
        if self.contains(id) {
            self.selected = Some(id.clone());
            true
        } else {
            false
        }
    }

    pub fn close_detail(&mut self) {
        self.selected = None;
    }

    // --- mutation ----------------------------------------------------------

    /// Flip the favorite flag on the matching record. Returns the new value.
    pub fn set_favorite_local(&mut self, id: &AssetId, favorite: bool) -> Option<bool> {
        let idx = self.position(id)?;
        self.photos[idx].is_favorite = favorite;
        Some(favorite)
    }

    /// Remove one record. If it was open in the detail pager, the record now
    /// occupying the same index becomes the open one (closest neighbor), or
    /// nothing if the sequence emptied.
    pub fn remove_record(&mut self, id: &AssetId) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        let was_open = self.selected.as_ref() == Some(id);
        let removed = self.photos.remove(idx);
        self.remove_from_groups(&removed);
        self.selection.retain_present(|s| s != id);
        if was_open {
            self.selected = if self.photos.is_empty() {
                None
            } else {
                Some(self.photos[idx.min(self.photos.len() - 1)].id.clone())
            };
        } else if self.photos.is_empty() {
            self.selected = None;
        }
        true
    }

    /// Bulk removal. The open record is re-derived defensively if it was
    /// among the removed ids.
    pub fn remove_many(&mut self, ids: &[AssetId]) {
        let doomed: HashSet<&AssetId> = ids.iter().collect();
        let open_idx = self.selected.as_ref().and_then(|id| self.position(id));

        let mut removed = Vec::new();
        self.photos.retain(|r| {
            if doomed.contains(&r.id) {
                removed.push(r.clone());
                false
            } else {
                true
            }
        });
        for record in &removed {
            self.remove_from_groups(record);
        }
        self.selection
            .retain_present(|id| !doomed.contains(id));

        let open_removed = self
            .selected
            .as_ref()
            .is_some_and(|id| doomed.contains(id));
        if open_removed {
            self.selected = if self.photos.is_empty() {
                None
            } else {
                let idx = open_idx.unwrap_or(0).min(self.photos.len() - 1);
                Some(self.photos[idx].id.clone())
            };
        }
        if self.photos.is_empty() {
            self.selected = None;
        }
    }

    /// Clear the selection set after a completed bulk deletion.
    pub fn take_selection(&mut self) -> Vec<AssetId> {
        self.selection.take_ids()
    }

    fn remove_from_groups(&mut self, record: &PhotoRecord) {
        let Some((year, month)) = record.year_month() else {
            return;
        };
        if let Some(years) = self.year_groups.get_mut(&year) {
            years.retain(|id| *id != record.id);
            if years.is_empty() {
                self.year_groups.remove(&year);
            }
        }
        if let Some(months) = self.month_groups.get_mut(&year) {
            if let Some(ids) = months.get_mut(&month) {
                ids.retain(|id| *id != record.id);
                if ids.is_empty() {
                    months.remove(&month);
                }
            }
            if months.is_empty() {
                self.month_groups.remove(&year);
            }
        }
    }

    // --- read surface ------------------------------------------------------

    #[must_use]
    pub fn snapshot(&self) -> GallerySnapshot {
        GallerySnapshot {
            photos: self.photos.clone(),
            year_groups: self.year_groups.clone(),
            month_groups: self.month_groups.clone(),
            sorted_years: self.sorted_years(),
            is_loading: self.is_loading,
            selected: self.selected.clone(),
            selection_count: self.selection.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn record(id: &str, date: Option<(i32, u32, u32)>) -> PhotoRecord {
        PhotoRecord {
            id: AssetId::from(id),
            thumbnail: Arc::new(image::RgbaImage::new(1, 1)),
            creation_date: date
                .map(|(y, m, d)| Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()),
            location: None,
            pixel_width: 1,
            pixel_height: 1,
            is_favorite: false,
            is_selected: false,
        }
    }

    fn ids(names: &[&str]) -> Vec<AssetId> {
        names.iter().map(|n| AssetId::from(*n)).collect()
    }

    #[test]
    fn duplicate_completions_yield_one_record_everywhere() {
        let mut index = PhotoIndex::new();
        index.begin_pass(1, ids(&["a", "b", "a"]));
        index.record_ingested(1, record("a", Some((2024, 9, 4))));
        index.record_ingested(1, record("a", Some((2024, 9, 4))));
        index.record_ingested(1, record("b", Some((2024, 9, 5))));

        assert_eq!(index.len(), 2);
        assert_eq!(index.year_group(2024).unwrap().len(), 2);
        assert_eq!(index.month_group(2024, 9).unwrap().len(), 2);
    }

    #[test]
    fn dated_records_group_once_and_undated_not_at_all() {
        let mut index = PhotoIndex::new();
        index.begin_pass(1, ids(&["dated", "undated"]));
        index.record_ingested(1, record("dated", Some((2023, 5, 1))));
        index.record_ingested(1, record("undated", None));

        assert_eq!(index.len(), 2);
        assert_eq!(index.sorted_years(), vec![2023]);
        assert_eq!(index.year_group(2023).unwrap(), &ids(&["dated"])[..]);
        assert_eq!(index.month_group(2023, 5).unwrap(), &ids(&["dated"])[..]);
    }

    #[test]
    fn loading_clears_exactly_when_every_item_completed() {
        let mut index = PhotoIndex::new();
        index.begin_pass(1, ids(&["a", "b", "c", "d", "e"]));
        assert!(index.is_loading());

        // Arbitrary arrival order; one item fails its thumbnail fetch.
        index.record_ingested(1, record("d", None));
        index.record_ingested(1, record("a", None));
        index.record_skipped(1, &AssetId::from("c"));
        index.record_ingested(1, record("e", None));
        assert!(index.is_loading());

        index.record_ingested(1, record("b", None));
        assert!(!index.is_loading());
        assert_eq!(index.len(), 4);
        // Nothing was open, so the last arrival becomes the open record.
        assert_eq!(index.selected(), Some(&AssetId::from("b")));
    }

    #[test]
    fn stale_pass_counters_are_ignored_but_inserts_stay_idempotent() {
        let mut index = PhotoIndex::new();
        index.begin_pass(1, ids(&["a", "b"]));
        index.record_ingested(1, record("a", None));

        // A library change restarts ingestion before the first pass finishes.
        index.begin_pass(2, ids(&["a", "b"]));
        assert!(index.is_loading());

        // Late completion from the superseded pass: no counter movement.
        index.record_ingested(1, record("b", None));
        assert!(index.is_loading());
        assert_eq!(index.len(), 2);

        index.record_ingested(2, record("a", None));
        index.record_ingested(2, record("b", None));
        assert!(!index.is_loading());
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn completed_pass_prunes_records_no_longer_enumerated() {
        let mut index = PhotoIndex::new();
        index.begin_pass(1, ids(&["a", "b"]));
        index.record_ingested(1, record("a", Some((2024, 1, 1))));
        index.record_ingested(1, record("b", Some((2024, 2, 1))));
        assert_eq!(index.len(), 2);

        index.begin_pass(2, ids(&["b"]));
        index.record_ingested(2, record("b", Some((2024, 2, 1))));

        assert_eq!(index.len(), 1);
        assert!(!index.contains(&AssetId::from("a")));
        assert_eq!(index.month_group(2024, 1), None);
    }

    #[test]
    fn empty_enumeration_completes_immediately() {
        let mut index = PhotoIndex::new();
        index.begin_pass(1, Vec::new());
        assert!(!index.is_loading());
        assert_eq!(index.selected(), None);
    }

    #[test]
    fn deleting_open_record_selects_closest_neighbor() {
        let mut index = PhotoIndex::new();
        index.begin_pass(1, ids(&["a", "b", "c"]));
        for name in ["a", "b", "c"] {
            index.record_ingested(1, record(name, None));
        }
        index.open(&AssetId::from("b"));

        assert!(index.remove_record(&AssetId::from("b")));
        // "c" now occupies index 1.
        assert_eq!(index.selected(), Some(&AssetId::from("c")));

        // Deleting the open record at the tail falls back to the new tail.
        index.open(&AssetId::from("c"));
        index.remove_record(&AssetId::from("c"));
        assert_eq!(index.selected(), Some(&AssetId::from("a")));

        // Emptying the sequence closes the detail view.
        index.remove_record(&AssetId::from("a"));
        assert_eq!(index.selected(), None);
        assert!(index.is_empty());
    }

    #[test]
    fn bulk_removal_cleans_groups_and_selection() {
        let mut index = PhotoIndex::new();
        index.begin_pass(1, ids(&["a", "b", "c"]));
        index.record_ingested(1, record("a", Some((2024, 3, 1))));
        index.record_ingested(1, record("b", Some((2024, 3, 2))));
        index.record_ingested(1, record("c", Some((2025, 1, 1))));
        index.toggle_selection(&AssetId::from("a"));
        index.toggle_selection(&AssetId::from("b"));

        index.remove_many(&ids(&["a", "b"]));
        index.take_selection();

        assert_eq!(index.len(), 1);
        assert_eq!(index.sorted_years(), vec![2025]);
        assert_eq!(index.selection_count(), 0);
        assert_eq!(index.selected(), Some(&AssetId::from("c")));
    }

    #[test]
    fn clear_selection_preserves_toggled_favorites() {
        let mut index = PhotoIndex::new();
        index.begin_pass(1, ids(&["a"]));
        index.record_ingested(1, record("a", None));

        index.set_favorite_local(&AssetId::from("a"), true);
        index.toggle_selection(&AssetId::from("a"));
        index.clear_selection();

        let rec = index.get(&AssetId::from("a")).unwrap();
        assert!(!rec.is_selected);
        assert!(
            rec.is_favorite,
            "clearing edit mode must keep the current favorite value, not the ingested one"
        );
    }

    #[test]
    fn sorted_years_ascending() {
        let mut index = PhotoIndex::new();
        index.begin_pass(1, ids(&["x", "y", "z"]));
        index.record_ingested(1, record("x", Some((2025, 6, 1))));
        index.record_ingested(1, record("y", Some((2019, 6, 1))));
        index.record_ingested(1, record("z", Some((2021, 6, 1))));
        assert_eq!(index.sorted_years(), vec![2019, 2021, 2025]);
    }
}
