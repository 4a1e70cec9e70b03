// src/fetch/mod.rs
// =============================================================================
// The fetch capability: "give me the bytes behind this URL".
//
// Both page crawling and image downloading go through the same trait, so the
// crawl engine never talks to reqwest directly. Production code uses
// HttpFetcher; tests plug in an in-memory implementation.
//
// Submodules:
// - http: the reqwest-backed fetcher with a fixed User-Agent and timeout
// =============================================================================

mod http;

pub use http::{FetchConfig, HttpFetcher, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};

use crate::error::FetchError;
use async_trait::async_trait;
use url::Url;

/// Something that can perform an HTTP GET and hand back the body.
///
/// Implementations must be shareable across worker tasks, which is why the
/// trait requires `Send + Sync`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}
