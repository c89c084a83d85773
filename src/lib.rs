//! # playlist-dl
//!
//! Session library for fetching a video playlist's contents from a remote service,
//! letting a user pick items, and downloading the picked items one after another as
//! audio or video files.
//!
//! ## Design Philosophy
//!
//! playlist-dl is designed to be:
//! - **Sequential** - A batch transfers exactly one item at a time
//! - **Failure tolerant** - A failed item is reported and the batch moves on
//! - **Library-first** - No UI, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use playlist_dl::{Config, OutputFormat, PlaylistDownloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut downloader = PlaylistDownloader::new(Config::default()).await?;
//!
//!     // Subscribe to events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     downloader
//!         .load_playlist("https://www.youtube.com/playlist?list=PL123")
//!         .await?;
//!     downloader.select_all();
//!     downloader.set_format(OutputFormat::Video);
//!     downloader.download_selected().await;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// In-flight item tracking
pub mod activity;
/// Configuration types
pub mod config;
/// Session and batch orchestration
pub mod downloader;
/// Error types
pub mod error;
/// Playlist loading
pub mod loader;
/// Item selection
pub mod selection;
/// Remote service collaborators
pub mod service;
/// Local file saving
pub mod sink;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use activity::{ActivityGuard, ActivityTracker};
pub use config::{Config, DownloadConfig, FileCollisionAction, ServiceConfig};
pub use downloader::{BatchOutcome, PlaylistDownloader, SkipReason};
pub use error::{Error, Result};
pub use loader::PlaylistLoader;
pub use selection::SelectionStore;
pub use service::{FetchedItem, HttpService, ItemSource, PlaylistResolver, ProgressFn};
pub use sink::{DirectorySink, SaveSink};
pub use types::{ActivityEntry, Event, Item, ItemId, OutputFormat, PlaylistSnapshot};
