//! Multi-select bookkeeping for edit mode.
//!
//! Invariant enforced on every mutation: set membership and each record's
//! `is_selected` flag stay in lock-step, and the set is always a subset of
//! the ids present in the index.

use crate::record::{AssetId, PhotoRecord};

#[derive(Debug, Default)]
pub struct SelectionManager {
    /// Selection order is preserved for display purposes.
    ids: Vec<AssetId>,
}

impl SelectionManager {
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[must_use]
    pub fn contains(&self, id: &AssetId) -> bool {
        self.ids.iter().any(|s| s == id)
    }

    #[must_use]
    pub fn ids(&self) -> &[AssetId] {
        &self.ids
    }

    /// Flip a record's selection. Returns the new flag value.
    ///
    /// Unflagging a record that is not in the set is a no-op; adding is
    /// idempotent.
    pub fn toggle(&mut self, record: &mut PhotoRecord) -> bool {
        if record.is_selected {
            if let Some(pos) = self.ids.iter().position(|s| *s == record.id) {
                self.ids.remove(pos);
            }
            record.is_selected = false;
        } else {
            if !self.contains(&record.id) {
                self.ids.push(record.id.clone());
            }
            record.is_selected = true;
        }
        record.is_selected
    }

    /// Exit edit mode: empty the set and unflag every record, leaving all
    /// other fields (favorite flag included) untouched.
    pub fn clear(&mut self, records: &mut [PhotoRecord]) {
        self.ids.clear();
        for record in records {
            record.is_selected = false;
        }
    }

    /// Drop ids that no longer exist in the index.
    pub fn retain_present(&mut self, mut present: impl FnMut(&AssetId) -> bool) {
        self.ids.retain(|id| present(id));
    }

    /// Drain the set, e.g. after a completed bulk deletion.
    pub fn take_ids(&mut self) -> Vec<AssetId> {
        std::mem::take(&mut self.ids)
    }
}
