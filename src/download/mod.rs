// src/download/mod.rs
// =============================================================================
// This module downloads images and hands them to a sink.
//
// How it works:
// 1. Page workers push image URLs into an unbounded channel
// 2. A separate pool drains that channel, running up to N downloads at once
// 3. Each download fetches the bytes and writes them under a sanitized name
// 4. Failures are logged and counted, never propagated
//
// The pool is independent from the page workers: a slow image host fills the
// channel but never blocks page traversal.
//
// Submodules:
// - sink: ImageSink capability, DirSink and file name sanitization
// =============================================================================

mod sink;

pub use sink::{file_name_for, DirSink, ImageSink};

use crate::error::DownloadError;
use crate::fetch::Fetcher;
use futures::stream::StreamExt;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

/// What happened to a single image. Only used for logging and counting.
#[derive(Debug)]
pub struct DownloadOutcome {
    pub source_url: Url,
    pub saved_path: PathBuf,
    pub error: Option<DownloadError>,
}

impl DownloadOutcome {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    fn log(&self) {
        match &self.error {
            None => info!("Saved to: {}", self.saved_path.display()),
            Some(e) => warn!("Failed to download: {} ({})", self.source_url, e),
        }
    }
}

/// Fetches one image and stores it in the sink
#[derive(Clone)]
pub struct Downloader {
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn ImageSink>,
}

impl Downloader {
    pub fn new(fetcher: Arc<dyn Fetcher>, sink: Arc<dyn ImageSink>) -> Self {
        Self { fetcher, sink }
    }

    pub async fn download(&self, url: &Url) -> DownloadOutcome {
        let file_name = file_name_for(url);
        let saved_path = self.sink.location(&file_name);

        info!("Downloading: {}", url);

        let result = match self.fetcher.fetch(url).await {
            Ok(bytes) => self.sink.write(&file_name, &bytes).await,
            Err(e) => Err(e.into()),
        };

        let outcome = match result {
            Ok(path) => DownloadOutcome {
                source_url: url.clone(),
                saved_path: path,
                error: None,
            },
            Err(e) => DownloadOutcome {
                source_url: url.clone(),
                saved_path,
                error: Some(e),
            },
        };
        outcome.log();
        outcome
    }
}

/// Totals reported by the download pool when it drains
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DownloadStats {
    pub downloaded: usize,
    pub failed: usize,
}

impl DownloadStats {
    fn record(mut self, outcome: &DownloadOutcome) -> Self {
        if outcome.is_ok() {
            self.downloaded += 1;
        } else {
            self.failed += 1;
        }
        self
    }
}

/// Sending side of the download pool. Dropping every clone lets the pool finish.
#[derive(Debug, Clone)]
pub struct DownloadQueue {
    tx: mpsc::UnboundedSender<Url>,
}

impl DownloadQueue {
    pub fn submit(&self, url: Url) {
        // The pool only goes away after cancellation; late images are dropped
        let _ = self.tx.send(url);
    }
}

// Starts the download pool
//
// Returns the queue to push image URLs into and a handle that resolves to the
// final counts once every queue clone is dropped and the backlog is drained.
// After `cancel` fires no new downloads are started; in-flight ones finish.
pub fn spawn_pool(
    downloader: Downloader,
    workers: usize,
    cancel: CancellationToken,
) -> (DownloadQueue, JoinHandle<DownloadStats>) {
    let (tx, rx) = mpsc::unbounded_channel();

    let handle = tokio::spawn(async move {
        UnboundedReceiverStream::new(rx)
            .take_until(async move { cancel.cancelled().await })
            .map(|url| {
                let downloader = downloader.clone();
                async move { downloader.download(&url).await }
            })
            .buffer_unordered(workers.max(1))
            .fold(DownloadStats::default(), |stats, outcome| async move {
                stats.record(&outcome)
            })
            .await
    });

    (DownloadQueue { tx }, handle)
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What does buffer_unordered do here?
//    - It turns a stream of URLs into a stream of downloads, running up to
//      `workers` of them at the same time
//    - Results come back in completion order, which is fine for counting
//
// 2. Why an unbounded channel?
//    - Page workers must never wait on image downloads
//    - The number of distinct images is bounded by the crawl itself, so the
//      backlog cannot grow forever
//
// 3. Why Arc<dyn Fetcher> instead of a concrete client?
//    - Tests swap in an in-memory fetcher and never hit the network
// -----------------------------------------------------------------------------
