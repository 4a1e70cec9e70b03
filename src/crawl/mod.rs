// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Features:
// - Same-origin crawling from a seed URL (never leaves the seed's host)
// - Configurable depth limit, depth 0 being the seed page itself
// - A fixed pool of page workers pulling from a shared frontier
// - Global deduplication: every page is fetched at most once per crawl
// - Images are handed to a separate download pool as soon as they are found
// - Graceful stop on cancellation
//
// Submodules:
// - visited: CanonicalUrl and the VisitedRegistry
// - queue: WorkItem and the Frontier (work queue + quiescence detection)
// =============================================================================

mod queue;
mod visited;

pub use queue::{Frontier, WorkItem};
pub use visited::{CanonicalUrl, VisitedRegistry};

use crate::download::{self, DownloadQueue, DownloadStats, Downloader, ImageSink};
use crate::error::{FetchError, SetupError};
use crate::extract::{extract_images, extract_links};
use crate::fetch::Fetcher;
use futures::future::join_all;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

pub const DEFAULT_MAX_DEPTH: usize = 5;
pub const DEFAULT_PAGE_WORKERS: usize = 8;
pub const DEFAULT_DOWNLOAD_WORKERS: usize = 8;

/// How far and how wide a crawl goes
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Deepest depth that may be dispatched; the seed is depth 0
    pub max_depth: usize,
    /// Follow links at all. When false only the seed page is fetched.
    pub recursive: bool,
    pub page_workers: usize,
    pub download_workers: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            recursive: false,
            page_workers: DEFAULT_PAGE_WORKERS,
            download_workers: DEFAULT_DOWNLOAD_WORKERS,
        }
    }
}

/// Outcome of processing one page. Consumed right away to decide what to enqueue.
#[derive(Debug)]
pub struct CrawlResult {
    pub url: Url,
    pub depth: usize,
    pub images: BTreeSet<Url>,
    pub links: BTreeSet<Url>,
    pub error: Option<FetchError>,
}

/// Totals reported at the end of a crawl
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub pages_crawled: usize,
    pub pages_failed: usize,
    pub images_downloaded: usize,
    pub images_failed: usize,
    pub cancelled: bool,
}

/// Wires the frontier, registries, page workers and download pool together
pub struct Crawler {
    config: CrawlConfig,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn ImageSink>,
}

impl Crawler {
    pub fn new(config: CrawlConfig, fetcher: Arc<dyn Fetcher>, sink: Arc<dyn ImageSink>) -> Self {
        Self {
            config,
            fetcher,
            sink,
        }
    }

    // Crawls from `seed` until the frontier is quiescent or `cancel` fires
    //
    // Only setup problems are returned as errors: a seed without a host, or a
    // sink that cannot be prepared. Both are detected before the first
    // request is sent. Everything that goes wrong afterwards is logged and
    // counted in the summary.
    pub async fn run(&self, seed: Url, cancel: CancellationToken) -> Result<CrawlSummary, SetupError> {
        let origin = seed
            .host_str()
            .ok_or_else(|| SetupError::MissingHost(seed.to_string()))?
            .to_string();

        self.sink.prepare().await?;

        let downloader = Downloader::new(self.fetcher.clone(), self.sink.clone());
        let (downloads, download_pool) =
            download::spawn_pool(downloader, self.config.download_workers, cancel.clone());

        let traversal = Arc::new(Traversal {
            config: self.config.clone(),
            origin,
            fetcher: self.fetcher.clone(),
            frontier: Frontier::new(),
            pages: VisitedRegistry::new(),
            images: VisitedRegistry::new(),
            downloads,
            pages_crawled: AtomicUsize::new(0),
            pages_failed: AtomicUsize::new(0),
        });

        traversal.enqueue(seed, 0);

        let workers = (0..self.config.page_workers.max(1)).map(|id| {
            let traversal = traversal.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { traversal.work(id, &cancel).await })
        });

        for joined in join_all(workers).await {
            if let Err(e) = joined {
                warn!("Page worker stopped abnormally: {}", e);
            }
        }

        debug_assert!(traversal.frontier.is_quiescent() || cancel.is_cancelled());
        debug!(
            "Saw {} distinct page(s) and {} distinct image(s)",
            traversal.pages.len(),
            traversal.images.len()
        );

        let pages_crawled = traversal.pages_crawled.load(Ordering::SeqCst);
        let pages_failed = traversal.pages_failed.load(Ordering::SeqCst);

        // Last handle on the download queue; the pool finishes its backlog after this
        drop(traversal);

        let images = match download_pool.await {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Download pool stopped abnormally: {}", e);
                DownloadStats::default()
            }
        };

        Ok(CrawlSummary {
            pages_crawled,
            pages_failed,
            images_downloaded: images.downloaded,
            images_failed: images.failed,
            cancelled: cancel.is_cancelled(),
        })
    }
}

// State shared by every page worker of one crawl
struct Traversal {
    config: CrawlConfig,
    origin: String,
    fetcher: Arc<dyn Fetcher>,
    frontier: Frontier,
    pages: VisitedRegistry,
    images: VisitedRegistry,
    downloads: DownloadQueue,
    pages_crawled: AtomicUsize,
    pages_failed: AtomicUsize,
}

impl Traversal {
    async fn work(&self, id: usize, cancel: &CancellationToken) {
        while let Some(dispatched) = self.frontier.next(cancel).await {
            let result = self.visit(dispatched.item()).await;
            self.absorb(result);
            // Follow-on items are queued; dropping `dispatched` marks this one done
        }
        debug!(
            "Page worker {} finished ({} pending, {} in flight)",
            id,
            self.frontier.pending_len(),
            self.frontier.in_flight()
        );
    }

    // Admits a discovered page into the frontier
    //
    // Bounds are checked before the URL is marked, so a link that is rejected
    // for its depth can still be crawled if it turns up again within bounds.
    fn enqueue(&self, url: Url, depth: usize) -> bool {
        if depth > self.config.max_depth || (!self.config.recursive && depth > 0) {
            debug!("Beyond depth limit, skipping: {} (depth {})", url, depth);
            return false;
        }

        if url.host_str() != Some(self.origin.as_str()) {
            debug!("Other host, skipping: {}", url);
            return false;
        }

        if !self.pages.try_mark(&CanonicalUrl::from(&url)) {
            debug!("Already seen, skipping: {}", url);
            return false;
        }

        self.frontier.push(WorkItem { url, depth });
        true
    }

    fn follows_links_from(&self, depth: usize) -> bool {
        self.config.recursive && depth < self.config.max_depth
    }

    async fn visit(&self, item: &WorkItem) -> CrawlResult {
        info!("Crawling: {} (depth {})", item.url, item.depth);

        let mut result = CrawlResult {
            url: item.url.clone(),
            depth: item.depth,
            images: BTreeSet::new(),
            links: BTreeSet::new(),
            error: None,
        };

        match self.fetcher.fetch(&item.url).await {
            Ok(body) => {
                let html = String::from_utf8_lossy(&body);
                result.images = extract_images(&html, &item.url);
                if self.follows_links_from(item.depth) {
                    result.links = extract_links(&html, &item.url);
                }
            }
            Err(e) => {
                warn!("Failed to fetch: {} ({})", item.url, e);
                result.error = Some(e);
            }
        }

        result
    }

    fn absorb(&self, result: CrawlResult) {
        if result.error.is_some() {
            self.pages_failed.fetch_add(1, Ordering::SeqCst);
            return;
        }
        self.pages_crawled.fetch_add(1, Ordering::SeqCst);

        debug!(
            "{}: {} image(s), {} link(s)",
            result.url,
            result.images.len(),
            result.links.len()
        );

        for image in result.images {
            if self.images.try_mark(&CanonicalUrl::from(&image)) {
                self.downloads.submit(image);
            }
        }

        if self.follows_links_from(result.depth) {
            for link in result.links {
                self.enqueue(link, result.depth + 1);
            }
        }
    }
}
