//! Error types for playlist-dl
//!
//! This module provides the crate-wide error type plus the helpers used to turn
//! collaborator failures into human-readable messages:
//! - Domain-specific variants (configuration, loading, transfer, saving)
//! - Best-effort decoding of structured `{"detail": ...}` error bodies
//! - Generic fallback messages for when no detail can be recovered

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for playlist-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Message shown when a playlist load fails without a usable detail.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to fetch playlist. Please check the URL.";

/// Main error type for playlist-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "service.base_url")
        key: Option<String>,
    },

    /// The playlist URL was empty or whitespace; no request was issued
    #[error("playlist URL is empty")]
    EmptyUrl,

    /// A playlist load is already outstanding
    #[error("a playlist load is already in progress")]
    LoadInProgress,

    /// A URL could not be parsed or joined
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// A collaborator answered with a non-success status
    #[error("service returned {status}{}", suffix(.detail))]
    Service {
        /// HTTP status code of the response
        status: u16,
        /// Message decoded from the error body, if any
        detail: Option<String>,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Target file exists and the collision policy forbids replacing it
    #[error("file already exists: {}", .path.display())]
    FileCollision {
        /// The path that is already taken
        path: PathBuf,
    },

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Human-readable message supplied by a collaborator, if one was recovered.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Error::Service { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Message for a failed playlist load: the collaborator's detail, else a generic hint.
    pub fn load_message(&self) -> String {
        self.detail()
            .map(str::to_string)
            .unwrap_or_else(|| LOAD_FAILED_MESSAGE.to_string())
    }

    /// Message for a failed item transfer: the collaborator's detail, else one naming the item.
    pub fn item_message(&self, id: &str) -> String {
        match self.detail() {
            Some(detail) => detail.to_string(),
            None => format!("Failed to download video {id}"),
        }
    }
}

fn suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
}

/// Decode a `{"detail": ...}` message from a raw error body.
///
/// Error bodies may arrive on endpoints that normally stream binary data, so the
/// bytes are treated as untrusted: they must be UTF-8 and parse as a JSON object.
/// A string `detail` is returned as-is; any other JSON value is rendered compactly.
/// Returns `None` whenever nothing usable is found.
pub fn detail_from_body(body: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(body).ok()?;
    let parsed: ErrorBody = serde_json::from_str(text.trim()).ok()?;
    match parsed.detail? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) if s.trim().is_empty() => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}
