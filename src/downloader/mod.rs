//! Session object tying the playlist, selection, format and batch orchestration together.
//!
//! The `PlaylistDownloader` struct and its methods are organized by domain:
//! - this module - construction, playlist loading, selection and format
//! - [`batch`] - sequential download orchestration over a captured selection

mod batch;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

pub use batch::{BatchOutcome, SkipReason};

use crate::activity::ActivityTracker;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::loader::PlaylistLoader;
use crate::selection::SelectionStore;
use crate::service::{HttpService, ItemSource, PlaylistResolver};
use crate::sink::{DirectorySink, SaveSink};
use crate::types::{Event, ItemId, OutputFormat, PlaylistSnapshot};
use std::sync::Arc;

/// Buffer size of the event broadcast channel
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// One user session: the current playlist, its selection and the download batch driver
///
/// Mutating operations take `&mut self`, so a load and a batch can never overlap and
/// the selection cannot change while a batch is running. Progress is readable from
/// other tasks through the [`ActivityTracker`] handle returned by [`activity`](Self::activity).
pub struct PlaylistDownloader {
    /// Configuration (wrapped in Arc for sharing)
    pub(crate) config: Arc<Config>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Playlist resolution with its loading/error state
    pub(crate) loader: PlaylistLoader,
    /// Per-item download collaborator
    pub(crate) source: Arc<dyn ItemSource>,
    /// Local-save capability
    pub(crate) sink: Arc<dyn SaveSink>,
    /// Current snapshot, replaced wholesale by each successful load
    pub(crate) snapshot: Option<Arc<PlaylistSnapshot>>,
    /// Selected item ids
    pub(crate) selection: SelectionStore,
    /// Session-wide output format
    pub(crate) format: OutputFormat,
    /// In-flight items and their progress
    pub(crate) activity: ActivityTracker,
}

impl PlaylistDownloader {
    /// Create a session talking HTTP to the configured service and saving into the
    /// configured download directory
    ///
    /// The download directory is created if it does not exist.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;

        tokio::fs::create_dir_all(&config.download.download_dir)
            .await
            .map_err(|e| {
                Error::Io(std::io::Error::new(
                    e.kind(),
                    format!(
                        "Failed to create download directory '{}': {}",
                        config.download.download_dir.display(),
                        e
                    ),
                ))
            })?;

        let service = Arc::new(HttpService::new(&config)?);
        let sink = Arc::new(DirectorySink::new(
            config.download.download_dir.clone(),
            config.download.file_collision,
        ));

        tracing::info!(
            base_url = %service.base_url(),
            download_dir = %config.download.download_dir.display(),
            "playlist downloader initialized"
        );

        Ok(Self::with_services(config, service.clone(), service, sink))
    }

    /// Create a session from explicit collaborators
    pub fn with_services(
        config: Config,
        resolver: Arc<dyn PlaylistResolver>,
        source: Arc<dyn ItemSource>,
        sink: Arc<dyn SaveSink>,
    ) -> Self {
        let (event_tx, _rx) = tokio::sync::broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let format = config.download.default_format;
        Self {
            config: Arc::new(config),
            event_tx,
            loader: PlaylistLoader::new(resolver),
            source,
            sink,
            snapshot: None,
            selection: SelectionStore::new(),
            format,
            activity: ActivityTracker::new(),
        }
    }

    /// Subscribe to session events
    ///
    /// Each subscriber receives all events independently. A subscriber falling more
    /// than 1000 events behind receives `RecvError::Lagged`.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Emit an event to all subscribers; dropped silently when nobody listens
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Load the playlist at `url`, replacing the snapshot and clearing the selection
    ///
    /// On failure the previous snapshot and selection are kept and a
    /// [`Event::PlaylistLoadFailed`] carries the user-facing message. A blank URL is
    /// rejected without a request or notification.
    pub async fn load_playlist(&mut self, url: &str) -> Result<Arc<PlaylistSnapshot>> {
        match self.loader.load(url).await {
            Ok(snapshot) => {
                let snapshot = Arc::new(snapshot);
                self.snapshot = Some(Arc::clone(&snapshot));
                self.selection.reset();
                self.emit_event(Event::PlaylistLoaded {
                    title: snapshot.title.clone(),
                    item_count: snapshot.len(),
                });
                self.emit_selection_changed();
                Ok(snapshot)
            }
            Err(Error::EmptyUrl) => Err(Error::EmptyUrl),
            Err(e) => {
                self.emit_event(Event::PlaylistLoadFailed {
                    error: e.load_message(),
                });
                Err(e)
            }
        }
    }

    /// Current snapshot, if one has been loaded
    pub fn playlist(&self) -> Option<Arc<PlaylistSnapshot>> {
        self.snapshot.clone()
    }

    /// Whether a playlist load is outstanding
    pub fn is_loading(&self) -> bool {
        self.loader.is_loading()
    }

    /// Message of the most recent failed load
    pub fn last_load_error(&self) -> Option<String> {
        self.loader.last_error()
    }

    /// Flip selection of `id`
    pub fn toggle(&mut self, id: impl Into<ItemId>) {
        let id = id.into();
        self.selection.toggle(&id);
        self.emit_selection_changed();
    }

    /// Select every item, or clear the selection if everything is already selected
    ///
    /// Does nothing before a playlist has been loaded.
    pub fn select_all(&mut self) {
        let Some(snapshot) = self.snapshot.clone() else {
            return;
        };
        self.selection.select_all(&snapshot);
        self.emit_selection_changed();
    }

    /// Whether `id` is selected
    pub fn is_selected(&self, id: &str) -> bool {
        self.selection.contains(id)
    }

    /// Current selection
    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    /// Number of selected items
    pub fn selected_count(&self) -> usize {
        self.selection.len()
    }

    /// Whether every item of the current playlist is selected
    pub fn all_selected(&self) -> bool {
        self.snapshot
            .as_deref()
            .is_some_and(|snapshot| self.selection.all_selected(snapshot))
    }

    /// Sum of selected item durations in seconds, recomputed on every call
    pub fn total_selected_duration(&self) -> u64 {
        self.snapshot
            .as_deref()
            .map_or(0, |snapshot| self.selection.total_selected_duration(snapshot))
    }

    /// Session output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Change the output format used by the next batch
    pub fn set_format(&mut self, format: OutputFormat) {
        if self.format != format {
            self.format = format;
            self.emit_event(Event::FormatChanged { format });
        }
    }

    /// Handle onto the in-flight activity map
    pub fn activity(&self) -> ActivityTracker {
        self.activity.clone()
    }

    /// Whether the start-batch control should be enabled
    pub fn can_start_batch(&self) -> bool {
        !self.selection.is_empty() && self.activity.is_idle()
    }

    fn emit_selection_changed(&self) {
        self.emit_event(Event::SelectionChanged {
            selected: self.selection.len(),
            total_duration_secs: self.total_selected_duration(),
        });
    }
}
