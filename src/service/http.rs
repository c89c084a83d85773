//! reqwest-backed implementation of the playlist and download collaborators.

use super::{FetchedItem, ItemSource, PlaylistResolver, ProgressFn};
use crate::config::Config;
use crate::error::{Error, Result, detail_from_body};
use crate::types::{Item, ItemId, OutputFormat, PlaylistSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

const PLAYLIST_ENDPOINT: &str = "api/playlist";
const DOWNLOAD_ENDPOINT: &str = "api/download";

/// Upper bound for pre-allocating a download buffer from `Content-Length`.
const MAX_PREALLOC_BYTES: u64 = 64 * 1024 * 1024;

/// HTTP client for the playlist resolution and item download service
#[derive(Clone, Debug)]
pub struct HttpService {
    client: reqwest::Client,
    base_url: url::Url,
    request_timeout: Duration,
}

#[derive(Serialize)]
struct PlaylistRequest<'a> {
    url: &'a str,
}

#[derive(Deserialize)]
struct PlaylistResponse {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    videos: Vec<Option<VideoEntry>>,
}

#[derive(Deserialize)]
struct VideoEntry {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    thumbnail: Option<String>,
    #[serde(default)]
    duration: Option<f64>,
}

impl PlaylistResponse {
    /// Convert the wire shape into a snapshot.
    ///
    /// Deleted entries arrive as `null` and entries may lack an id; both are skipped.
    /// Duplicate ids keep their first occurrence.
    fn into_snapshot(self) -> PlaylistSnapshot {
        let mut seen = HashSet::new();
        let mut items = Vec::with_capacity(self.videos.len());
        for entry in self.videos.into_iter().flatten() {
            let Some(id) = entry.id.filter(|id| !id.is_empty()) else {
                tracing::debug!("skipping playlist entry without id");
                continue;
            };
            if !seen.insert(id.clone()) {
                tracing::debug!(item_id = %id, "skipping duplicate playlist entry");
                continue;
            }
            items.push(Item {
                id: ItemId(id),
                title: entry.title.unwrap_or_default(),
                thumbnail_url: entry.thumbnail.filter(|t| !t.is_empty()),
                duration_seconds: entry.duration.and_then(whole_seconds),
            });
        }
        PlaylistSnapshot {
            title: self.title.unwrap_or_default(),
            items,
        }
    }
}

fn whole_seconds(duration: f64) -> Option<u64> {
    if duration.is_finite() && duration >= 0.0 {
        Some(duration.floor() as u64)
    } else {
        None
    }
}

/// Header value as text; bytes that are not UTF-8 are replaced rather than dropping the value.
fn header_text(value: &reqwest::header::HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).into_owned()
}

impl HttpService {
    /// Build a client for the service configured in `config`
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = config.base_url()?;
        let client = reqwest::Client::builder()
            .connect_timeout(config.service.connect_timeout)
            .user_agent(concat!("playlist-dl/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url,
            request_timeout: config.service.request_timeout,
        })
    }

    /// Base URL requests are resolved against
    pub fn base_url(&self) -> &url::Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<url::Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::InvalidUrl(format!("{}{}: {}", self.base_url, path, e)))
    }

    /// URL of the download endpoint for one item
    pub fn download_url(&self, id: &ItemId, format: OutputFormat) -> Result<url::Url> {
        let mut url = self.endpoint(DOWNLOAD_ENDPOINT)?;
        url.query_pairs_mut()
            .append_pair("video_id", id.as_str())
            .append_pair("format", format.code());
        Ok(url)
    }
}

/// Turn a non-success response into [`Error::Service`], decoding any `detail` it carries.
async fn service_error(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let detail = match response.bytes().await {
        Ok(body) => detail_from_body(&body),
        Err(e) => {
            tracing::debug!(status, error = %e, "failed to read error body");
            None
        }
    };
    Error::Service { status, detail }
}

#[async_trait::async_trait]
impl PlaylistResolver for HttpService {
    async fn resolve(&self, url: &str) -> Result<PlaylistSnapshot> {
        let endpoint = self.endpoint(PLAYLIST_ENDPOINT)?;
        tracing::debug!(url, endpoint = %endpoint, "resolving playlist");

        let response = self
            .client
            .post(endpoint)
            .json(&PlaylistRequest { url })
            .timeout(self.request_timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(service_error(response).await);
        }

        let body = response.bytes().await?;
        let parsed: PlaylistResponse = serde_json::from_slice(&body)?;
        Ok(parsed.into_snapshot())
    }
}

#[async_trait::async_trait]
impl ItemSource for HttpService {
    async fn fetch(
        &self,
        id: &ItemId,
        format: OutputFormat,
        progress: &mut ProgressFn<'_>,
    ) -> Result<FetchedItem> {
        let url = self.download_url(id, format)?;
        tracing::debug!(item_id = %id, url = %url, "requesting item");

        let mut response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(service_error(response).await);
        }

        let total = response.content_length();
        let content_disposition = response
            .headers()
            .get(reqwest::header::CONTENT_DISPOSITION)
            .map(header_text);

        let mut bytes = Vec::with_capacity(total.unwrap_or(0).min(MAX_PREALLOC_BYTES) as usize);
        let mut received: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            received += chunk.len() as u64;
            bytes.extend_from_slice(&chunk);
            progress(received, total);
        }

        tracing::debug!(item_id = %id, bytes = received, "item body received");
        Ok(FetchedItem {
            content_disposition,
            bytes,
        })
    }
}
