//! Selection store: the set of item ids targeted for download.
//!
//! Membership is tracked in a set, iteration order is first-selection order.
//! Aggregates are recomputed from the live snapshot on every read.

use crate::types::{ItemId, PlaylistSnapshot};
use std::collections::HashSet;

/// Ordered set of selected item ids
#[derive(Clone, Debug, Default)]
pub struct SelectionStore {
    order: Vec<ItemId>,
    members: HashSet<ItemId>,
}

impl SelectionStore {
    /// Create an empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip membership of `id`
    pub fn toggle(&mut self, id: &ItemId) {
        if self.members.remove(id.as_str()) {
            self.order.retain(|existing| existing != id);
        } else {
            self.members.insert(id.clone());
            self.order.push(id.clone());
        }
    }

    /// Select every item of `snapshot`, or clear the selection if it is already full
    ///
    /// "Full" means the selection holds as many ids as the snapshot has items.
    pub fn select_all(&mut self, snapshot: &PlaylistSnapshot) {
        if self.len() == snapshot.len() {
            self.reset();
            return;
        }
        self.reset();
        for item in &snapshot.items {
            if self.members.insert(item.id.clone()) {
                self.order.push(item.id.clone());
            }
        }
    }

    /// Clear the selection
    pub fn reset(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    /// Whether `id` is selected
    pub fn contains(&self, id: &str) -> bool {
        self.members.contains(id)
    }

    /// Number of selected ids
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Selected ids in selection order
    pub fn iter(&self) -> impl Iterator<Item = &ItemId> {
        self.order.iter()
    }

    /// Owned copy of the selected ids in selection order
    pub fn ids(&self) -> Vec<ItemId> {
        self.order.clone()
    }

    /// Whether the selection is full relative to `snapshot` (drives Select/Deselect All)
    pub fn all_selected(&self, snapshot: &PlaylistSnapshot) -> bool {
        !snapshot.is_empty() && self.len() == snapshot.len()
    }

    /// Sum of durations of selected snapshot items, missing durations counting as 0
    pub fn total_selected_duration(&self, snapshot: &PlaylistSnapshot) -> u64 {
        snapshot
            .items
            .iter()
            .filter(|item| self.contains(item.id.as_str()))
            .map(|item| item.duration_seconds.unwrap_or(0))
            .sum()
    }
}
