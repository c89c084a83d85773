//! Core types for playlist-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Opaque identifier of a playlist item
///
/// Stable within one snapshot and the only correlation key between the selection,
/// the activity tracker and download requests.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    /// Create a new ItemId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ItemId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::borrow::Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Output format for a batch, applied uniformly to every item
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Audio only, transcoded to MP3
    #[default]
    Audio,
    /// Video, delivered as MP4
    Video,
}

impl OutputFormat {
    /// Short format code sent to the download service
    pub fn code(&self) -> &'static str {
        match self {
            OutputFormat::Audio => "mp3",
            OutputFormat::Video => "mp4",
        }
    }

    /// File extension used for synthesised filenames
    pub fn extension(&self) -> &'static str {
        self.code()
    }

    /// Parse a format code (`mp3`/`mp4`) or name (`audio`/`video`)
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "mp3" | "audio" => Some(OutputFormat::Audio),
            "mp4" | "video" => Some(OutputFormat::Video),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A single playlist entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Unique identifier within the snapshot
    pub id: ItemId,
    /// Item title (may be empty)
    pub title: String,
    /// Thumbnail image URL
    pub thumbnail_url: Option<String>,
    /// Duration in whole seconds
    pub duration_seconds: Option<u64>,
}

impl Item {
    /// Title suitable for display, with a placeholder for untitled entries
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            "Untitled Video"
        } else {
            &self.title
        }
    }
}

/// Immutable result of one successful playlist resolution
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistSnapshot {
    /// Playlist title
    pub title: String,
    /// Items in playlist order
    pub items: Vec<Item>,
}

impl PlaylistSnapshot {
    /// Number of items in the snapshot
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the snapshot has no items
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up an item by id
    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.iter().find(|item| item.id.as_str() == id)
    }

    /// Whether an item with this id is part of the snapshot
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }
}

/// Transient status of one in-flight transfer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Whether a transfer is currently running for the item
    pub in_flight: bool,
    /// Last reported progress, 0..=100
    pub progress_percent: Option<u8>,
}

/// Event emitted by a [`PlaylistDownloader`](crate::PlaylistDownloader) session
///
/// These are the user-visible notifications of the crate: load results,
/// selection changes, per-item progress and per-item outcomes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A new snapshot replaced the previous one
    PlaylistLoaded {
        /// Playlist title
        title: String,
        /// Number of items in the snapshot
        item_count: usize,
    },

    /// A playlist load failed; the previous snapshot is untouched
    PlaylistLoadFailed {
        /// Human-readable error message
        error: String,
    },

    /// Selection membership changed
    SelectionChanged {
        /// Number of selected items
        selected: usize,
        /// Sum of the selected items' durations in seconds
        total_duration_secs: u64,
    },

    /// Session output format changed
    FormatChanged {
        /// New output format
        format: OutputFormat,
    },

    /// A batch started over the captured selection
    BatchStarted {
        /// Number of items queued in the batch
        total: usize,
        /// Output format for every item in the batch
        format: OutputFormat,
    },

    /// An item transfer started
    ItemStarted {
        /// Item id
        id: ItemId,
    },

    /// Progress for the in-flight item changed
    ItemProgress {
        /// Item id
        id: ItemId,
        /// Progress percentage (0 to 100)
        percent: u8,
    },

    /// An item was saved locally
    ItemSaved {
        /// Item id
        id: ItemId,
        /// Resolved filename
        filename: String,
        /// Where the file was written
        path: PathBuf,
    },

    /// An item failed; the batch continues with the next item
    ItemFailed {
        /// Item id
        id: ItemId,
        /// Human-readable error message
        error: String,
    },

    /// Every item in the batch reached a terminal state
    BatchFinished {
        /// Number of items attempted
        attempted: usize,
    },
}
