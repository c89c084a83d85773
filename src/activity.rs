//! Transient per-item activity tracking.
//!
//! The tracker records which items have a transfer in flight and their last-known
//! progress. Entries only exist while a transfer runs: [`ActivityTracker::begin`]
//! hands out an [`ActivityGuard`] that removes the entry when dropped, so success,
//! failure and early-return paths all leave the tracker clean.
//!
//! The tracker is a cheap, cloneable handle so presentation code can read progress
//! from another task while a batch is running.

use crate::types::{ActivityEntry, ItemId};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Shared map of in-flight item ids to their activity entries
#[derive(Clone, Debug, Default)]
pub struct ActivityTracker {
    entries: Arc<RwLock<HashMap<ItemId, ActivityEntry>>>,
}

impl ActivityTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `id` as in flight with 0% progress and return the guard owning the entry
    pub fn begin(&self, id: ItemId) -> ActivityGuard {
        self.write().insert(
            id.clone(),
            ActivityEntry {
                in_flight: true,
                progress_percent: Some(0),
            },
        );
        ActivityGuard {
            tracker: self.clone(),
            id,
        }
    }

    /// Record progress for an in-flight item
    ///
    /// Values above 100 are clamped. Updates for ids without an entry are ignored.
    pub fn set_progress(&self, id: &str, percent: u8) {
        if let Some(entry) = self.write().get_mut(id) {
            entry.progress_percent = Some(percent.min(100));
        }
    }

    /// Entry for `id`, or `None` when the item is idle
    pub fn get(&self, id: &str) -> Option<ActivityEntry> {
        self.read().get(id).copied()
    }

    /// Last-known progress for `id`
    pub fn progress(&self, id: &str) -> Option<u8> {
        self.get(id).and_then(|entry| entry.progress_percent)
    }

    /// Whether a transfer for `id` is in flight
    pub fn is_active(&self, id: &str) -> bool {
        self.read().contains_key(id)
    }

    /// Number of in-flight items
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether nothing is in flight
    pub fn is_idle(&self) -> bool {
        self.read().is_empty()
    }

    /// Copy of all current entries
    pub fn snapshot(&self) -> HashMap<ItemId, ActivityEntry> {
        self.read().clone()
    }

    fn finish(&self, id: &str) {
        self.write().remove(id);
    }

    // A panic while holding the lock cannot leave the map half-updated, so poisoning is ignored.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<ItemId, ActivityEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<ItemId, ActivityEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owns one tracker entry; the entry is removed when the guard is dropped
#[derive(Debug)]
pub struct ActivityGuard {
    tracker: ActivityTracker,
    id: ItemId,
}

impl ActivityGuard {
    /// Id of the tracked item
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    /// Record progress for the tracked item
    pub fn set_progress(&self, percent: u8) {
        self.tracker.set_progress(self.id.as_str(), percent);
    }
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.tracker.finish(self.id.as_str());
    }
}

/// Floor percentage of `received` out of `total`, clamped to 100
///
/// Returns `None` when the total is unknown or zero: no progress is reported
/// rather than a made-up value.
pub fn percent_of(received: u64, total: Option<u64>) -> Option<u8> {
    let total = total.filter(|&t| t > 0)?;
    let percent = (u128::from(received) * 100 / u128::from(total)).min(100);
    Some(percent as u8)
}
