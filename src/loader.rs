//! Playlist snapshot loader: one guarded request per load.

use crate::error::{Error, Result};
use crate::service::PlaylistResolver;
use crate::types::PlaylistSnapshot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Issues playlist resolution requests and owns their loading/error state
///
/// At most one load is outstanding at a time; a second call while a load is in
/// flight returns [`Error::LoadInProgress`] without issuing a request.
pub struct PlaylistLoader {
    resolver: Arc<dyn PlaylistResolver>,
    loading: AtomicBool,
    last_error: Mutex<Option<String>>,
}

/// Clears the loading flag on every exit path.
struct LoadingFlag<'a>(&'a AtomicBool);

impl Drop for LoadingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl PlaylistLoader {
    /// Create a loader backed by `resolver`
    pub fn new(resolver: Arc<dyn PlaylistResolver>) -> Self {
        Self {
            resolver,
            loading: AtomicBool::new(false),
            last_error: Mutex::new(None),
        }
    }

    /// Whether a load is currently outstanding (the load control should be disabled)
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Human-readable message of the most recent failed load, cleared by a success
    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Resolve `url` into a new snapshot
    ///
    /// An empty or whitespace-only URL is rejected with [`Error::EmptyUrl`] before any
    /// request is made. On failure the error's user-facing message is recorded in
    /// [`last_error`](Self::last_error).
    pub async fn load(&self, url: &str) -> Result<PlaylistSnapshot> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::EmptyUrl);
        }

        if self
            .loading
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::LoadInProgress);
        }
        let _flag = LoadingFlag(&self.loading);

        let result = self.resolver.resolve(url).await;
        let message = match &result {
            Ok(snapshot) => {
                tracing::info!(url, title = %snapshot.title, items = snapshot.len(), "playlist loaded");
                None
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "playlist load failed");
                Some(e.load_message())
            }
        };
        *self
            .last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = message;
        result
    }
}
