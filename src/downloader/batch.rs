//! Sequential batch orchestration: one transfer at a time over a captured selection.

use std::path::PathBuf;

use crate::activity::{ActivityGuard, percent_of};
use crate::error::Result;
use crate::types::{Event, ItemId, OutputFormat};
use crate::utils::resolve_filename;

use super::PlaylistDownloader;

/// Result of asking the session to download its selection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BatchOutcome {
    /// Every captured item reached a terminal state (saved or failed)
    Completed {
        /// Number of items attempted
        attempted: usize,
    },
    /// No batch was started
    Skipped(SkipReason),
}

/// Why a batch did not start
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing is selected
    EmptySelection,
    /// Transfers are still in flight
    AlreadyRunning,
}

impl PlaylistDownloader {
    /// Download every selected item, strictly one after another
    ///
    /// The selected ids and the output format are captured when the batch starts.
    /// Each item moves through `in flight -> saved | failed`; a failure is reported
    /// with [`Event::ItemFailed`] and the batch continues with the next item. When
    /// this returns, the activity tracker is empty again.
    ///
    /// Per-item outcomes are only reported through events; there is no aggregate
    /// success or failure.
    pub async fn download_selected(&mut self) -> BatchOutcome {
        if self.selection.is_empty() {
            tracing::debug!("download requested with empty selection");
            return BatchOutcome::Skipped(SkipReason::EmptySelection);
        }
        if !self.activity.is_idle() {
            tracing::debug!(in_flight = self.activity.len(), "batch already running");
            return BatchOutcome::Skipped(SkipReason::AlreadyRunning);
        }

        let queue: Vec<ItemId> = self.selection.ids();
        let format = self.format;

        tracing::info!(items = queue.len(), format = %format, "starting download batch");
        self.emit_event(Event::BatchStarted {
            total: queue.len(),
            format,
        });

        for id in &queue {
            self.transfer_item(id, format).await;
        }

        tracing::info!(attempted = queue.len(), "download batch finished");
        self.emit_event(Event::BatchFinished {
            attempted: queue.len(),
        });
        BatchOutcome::Completed {
            attempted: queue.len(),
        }
    }

    /// Run one item to a terminal state; never propagates the item's error.
    async fn transfer_item(&self, id: &ItemId, format: OutputFormat) {
        let guard = self.activity.begin(id.clone());
        self.emit_event(Event::ItemStarted { id: id.clone() });

        match self.fetch_and_save(&guard, format).await {
            Ok((filename, path)) => {
                tracing::info!(item_id = %id, path = %path.display(), "item saved");
                self.emit_event(Event::ItemSaved {
                    id: id.clone(),
                    filename,
                    path,
                });
            }
            Err(e) => {
                tracing::warn!(item_id = %id, error = %e, "item failed, continuing with next");
                self.emit_event(Event::ItemFailed {
                    id: id.clone(),
                    error: e.item_message(id.as_str()),
                });
            }
        }

        drop(guard);
    }

    async fn fetch_and_save(
        &self,
        guard: &ActivityGuard,
        format: OutputFormat,
    ) -> Result<(String, PathBuf)> {
        let id = guard.id();
        let event_tx = self.event_tx.clone();
        let mut last_percent: u8 = 0;
        let mut on_progress = |received: u64, total: Option<u64>| {
            if let Some(percent) = percent_of(received, total)
                && percent != last_percent
            {
                last_percent = percent;
                guard.set_progress(percent);
                event_tx
                    .send(Event::ItemProgress {
                        id: id.clone(),
                        percent,
                    })
                    .ok();
            }
        };

        let fetched = self.source.fetch(id, format, &mut on_progress).await?;
        let filename = resolve_filename(fetched.content_disposition.as_deref(), id, format);
        let path = self.sink.save(&filename, &fetched.bytes).await?;
        Ok((filename, path))
    }
}
