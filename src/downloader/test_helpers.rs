//! Shared test helpers: in-memory collaborators and a session wired to them.

use crate::activity::ActivityTracker;
use crate::config::Config;
use crate::downloader::PlaylistDownloader;
use crate::error::{Error, Result};
use crate::service::{FetchedItem, ItemSource, PlaylistResolver, ProgressFn};
use crate::sink::SaveSink;
use crate::types::{Event, Item, ItemId, OutputFormat, PlaylistSnapshot};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Build a snapshot from `(id, duration)` pairs
pub(crate) fn snapshot(title: &str, items: &[(&str, Option<u64>)]) -> PlaylistSnapshot {
    PlaylistSnapshot {
        title: title.to_string(),
        items: items
            .iter()
            .map(|(id, duration)| Item {
                id: ItemId::from(*id),
                title: format!("Track {id}"),
                thumbnail_url: None,
                duration_seconds: *duration,
            })
            .collect(),
    }
}

/// Scripted answer for one playlist load
pub(crate) enum FakeLoad {
    Ok(PlaylistSnapshot),
    Fail { status: u16, detail: Option<String> },
}

/// Resolver answering loads from a queue of scripted results
pub(crate) struct FakeResolver {
    responses: Mutex<VecDeque<FakeLoad>>,
    calls: AtomicUsize,
}

impl FakeResolver {
    pub(crate) fn new(responses: Vec<FakeLoad>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PlaylistResolver for FakeResolver {
    async fn resolve(&self, _url: &str) -> Result<PlaylistSnapshot> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.lock().unwrap().pop_front() {
            Some(FakeLoad::Ok(snapshot)) => Ok(snapshot),
            Some(FakeLoad::Fail { status, detail }) => Err(Error::Service { status, detail }),
            None => Err(Error::Other("no scripted playlist".to_string())),
        }
    }
}

/// Scripted answer for one item transfer
#[derive(Clone)]
pub(crate) enum FakeTransfer {
    Ok {
        body: Vec<u8>,
        content_disposition: Option<String>,
        /// Whether the total length is announced to the progress callback
        known_total: bool,
    },
    Fail {
        status: u16,
        detail: Option<String>,
    },
    /// Deliver `chunks` of the four chunks, then fail
    FailMidStream {
        len: usize,
        chunks: usize,
        status: u16,
        detail: Option<String>,
    },
}

impl FakeTransfer {
    pub(crate) fn ok(len: usize) -> Self {
        FakeTransfer::Ok {
            body: vec![1u8; len],
            content_disposition: None,
            known_total: true,
        }
    }

    pub(crate) fn with_header(len: usize, header: &str) -> Self {
        FakeTransfer::Ok {
            body: vec![1u8; len],
            content_disposition: Some(header.to_string()),
            known_total: true,
        }
    }

    pub(crate) fn unknown_length(len: usize) -> Self {
        FakeTransfer::Ok {
            body: vec![1u8; len],
            content_disposition: None,
            known_total: false,
        }
    }

    pub(crate) fn fail_after_chunks(len: usize, chunks: usize, detail: Option<&str>) -> Self {
        FakeTransfer::FailMidStream {
            len,
            chunks,
            status: 502,
            detail: detail.map(str::to_string),
        }
    }

    pub(crate) fn fail(status: u16, detail: Option<&str>) -> Self {
        FakeTransfer::Fail {
            status,
            detail: detail.map(str::to_string),
        }
    }
}

/// One progress callback as seen by the source, with the tracker state right after it
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct ObservedProgress {
    pub(crate) id: ItemId,
    pub(crate) received: u64,
    pub(crate) total: Option<u64>,
    pub(crate) tracked_percent: Option<u8>,
}

/// Item source delivering bodies in four chunks and recording what it saw
#[derive(Default)]
pub(crate) struct FakeSource {
    outcomes: HashMap<String, FakeTransfer>,
    observer: Mutex<Option<ActivityTracker>>,
    pub(crate) calls: Mutex<Vec<(ItemId, OutputFormat)>>,
    pub(crate) progress: Mutex<Vec<ObservedProgress>>,
    /// Largest number of in-flight tracker entries seen at the start of a transfer
    pub(crate) max_in_flight: AtomicUsize,
}

impl FakeSource {
    pub(crate) fn new(outcomes: Vec<(&str, FakeTransfer)>) -> Self {
        Self {
            outcomes: outcomes
                .into_iter()
                .map(|(id, outcome)| (id.to_string(), outcome))
                .collect(),
            ..Default::default()
        }
    }

    /// Let the source read the session's tracker while transferring
    pub(crate) fn observe(&self, tracker: ActivityTracker) {
        *self.observer.lock().unwrap() = Some(tracker);
    }

    pub(crate) fn call_order(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.to_string())
            .collect()
    }

    fn tracker(&self) -> Option<ActivityTracker> {
        self.observer.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ItemSource for FakeSource {
    async fn fetch(
        &self,
        id: &ItemId,
        format: OutputFormat,
        progress: &mut ProgressFn<'_>,
    ) -> Result<FetchedItem> {
        self.calls.lock().unwrap().push((id.clone(), format));
        let tracker = self.tracker();
        if let Some(tracker) = &tracker {
            self.max_in_flight.fetch_max(tracker.len(), Ordering::SeqCst);
        }

        let outcome = self
            .outcomes
            .get(id.as_str())
            .cloned()
            .unwrap_or_else(|| FakeTransfer::ok(100));

        let (body, content_disposition, known_total, fail_after) = match outcome {
            FakeTransfer::Fail { status, detail } => return Err(Error::Service { status, detail }),
            FakeTransfer::Ok {
                body,
                content_disposition,
                known_total,
            } => (body, content_disposition, known_total, None),
            FakeTransfer::FailMidStream {
                len,
                chunks,
                status,
                detail,
            } => (vec![1u8; len], None, true, Some((chunks, status, detail))),
        };

        let total = known_total.then_some(body.len() as u64);
        let chunk = body.len().div_ceil(4).max(1);
        let mut received = 0u64;
        for (delivered, part) in body.chunks(chunk).enumerate() {
            if let Some((chunks, status, detail)) = &fail_after
                && delivered == *chunks
            {
                return Err(Error::Service {
                    status: *status,
                    detail: detail.clone(),
                });
            }
            tokio::task::yield_now().await;
            received += part.len() as u64;
            progress(received, total);
            self.progress.lock().unwrap().push(ObservedProgress {
                id: id.clone(),
                received,
                total,
                tracked_percent: tracker.as_ref().and_then(|t| t.progress(id.as_str())),
            });
        }
        Ok(FetchedItem {
            content_disposition,
            bytes: body,
        })
    }
}

/// Sink keeping saved files in memory
#[derive(Default)]
pub(crate) struct MemorySink {
    pub(crate) saved: Mutex<Vec<(String, Vec<u8>)>>,
    /// Filenames whose save fails with an I/O error
    pub(crate) fail_names: Vec<String>,
}

impl MemorySink {
    pub(crate) fn failing(names: &[&str]) -> Self {
        Self {
            saved: Mutex::new(Vec::new()),
            fail_names: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub(crate) fn filenames(&self) -> Vec<String> {
        self.saved
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl SaveSink for MemorySink {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        if self.fail_names.iter().any(|n| n == filename) {
            return Err(Error::Io(std::io::Error::other("disk full")));
        }
        self.saved
            .lock()
            .unwrap()
            .push((filename.to_string(), bytes.to_vec()));
        Ok(PathBuf::from("/memory").join(filename))
    }
}

/// Fakes wired into a session
pub(crate) struct TestSession {
    pub(crate) downloader: PlaylistDownloader,
    pub(crate) resolver: Arc<FakeResolver>,
    pub(crate) source: Arc<FakeSource>,
    pub(crate) sink: Arc<MemorySink>,
}

/// Create a session over fakes; the source observes the session's tracker.
pub(crate) fn create_test_downloader(
    loads: Vec<FakeLoad>,
    source: FakeSource,
    sink: MemorySink,
) -> TestSession {
    let resolver = Arc::new(FakeResolver::new(loads));
    let source = Arc::new(source);
    let sink = Arc::new(sink);
    let downloader = PlaylistDownloader::with_services(
        Config::default(),
        resolver.clone(),
        source.clone(),
        sink.clone(),
    );
    source.observe(downloader.activity());
    TestSession {
        downloader,
        resolver,
        source,
        sink,
    }
}

/// Create a session with `snapshot` already loaded.
pub(crate) async fn loaded_session(
    snapshot: PlaylistSnapshot,
    source: FakeSource,
    sink: MemorySink,
) -> TestSession {
    let mut session = create_test_downloader(vec![FakeLoad::Ok(snapshot)], source, sink);
    session
        .downloader
        .load_playlist("https://example.com/playlist")
        .await
        .unwrap();
    session
}

/// Collect every event currently buffered in `rx`
pub(crate) fn drain(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<Event> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
