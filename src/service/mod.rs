//! Remote collaborators: playlist resolution and item download.
//!
//! The session only talks to these traits, so the transport can be swapped out
//! (tests use in-memory fakes). [`HttpService`] implements both against the
//! `/api/playlist` and `/api/download` endpoints.

mod http;

pub use http::HttpService;

use crate::error::Result;
use crate::types::{ItemId, OutputFormat, PlaylistSnapshot};

/// Progress callback invoked by the transport as bytes arrive.
///
/// Called with `(bytes_received_so_far, total_expected_bytes)`; the total is `None`
/// when the response does not announce a length.
pub type ProgressFn<'a> = dyn FnMut(u64, Option<u64>) + Send + 'a;

/// Body and metadata of one completed item transfer
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchedItem {
    /// Raw `Content-Disposition` header value, if the response carried one
    pub content_disposition: Option<String>,
    /// The complete item body
    pub bytes: Vec<u8>,
}

/// Resolves a playlist URL into a snapshot (one request per call).
#[async_trait::async_trait]
pub trait PlaylistResolver: Send + Sync {
    /// Resolve `url` into an ordered snapshot
    async fn resolve(&self, url: &str) -> Result<PlaylistSnapshot>;
}

/// Streams the encoded bytes of one item in a given format.
#[async_trait::async_trait]
pub trait ItemSource: Send + Sync {
    /// Download item `id` as `format`, reporting progress through `progress`
    async fn fetch(
        &self,
        id: &ItemId,
        format: OutputFormat,
        progress: &mut ProgressFn<'_>,
    ) -> Result<FetchedItem>;
}
