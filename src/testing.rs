// src/testing.rs
// =============================================================================
// In-memory stand-ins for the network and the filesystem, shared by the unit
// tests of the download and crawl modules. Only compiled for `cargo test`.
// =============================================================================

use crate::download::ImageSink;
use crate::error::{DownloadError, FetchError, SetupError};
use crate::fetch::Fetcher;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// Serves canned responses and counts how often each URL was requested.
/// Unknown URLs answer with a 404.
#[derive(Default)]
pub struct MockFetcher {
    responses: HashMap<String, Result<Vec<u8>, FetchError>>,
    calls: Mutex<HashMap<String, usize>>,
    delay: Option<Duration>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(url: &str) -> String {
        Url::parse(url).expect("test URL must parse").to_string()
    }

    pub fn with_page(self, url: &str, html: &str) -> Self {
        self.with_bytes(url, html.as_bytes())
    }

    pub fn with_bytes(mut self, url: &str, bytes: &[u8]) -> Self {
        self.responses.insert(Self::key(url), Ok(bytes.to_vec()));
        self
    }

    pub fn with_error(mut self, url: &str, error: FetchError) -> Self {
        self.responses.insert(Self::key(url), Err(error));
        self
    }

    /// Makes every fetch yield for a while, so workers genuinely overlap
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self, url: &str) -> usize {
        let calls = self.calls.lock().unwrap();
        calls.get(&Self::key(url)).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().values().sum()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        *self
            .calls
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default() += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        self.responses
            .get(url.as_str())
            .cloned()
            .unwrap_or(Err(FetchError::Status(404)))
    }
}

/// Keeps written images in a map keyed by file name
#[derive(Default)]
pub struct MemorySink {
    files: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, file_name: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(file_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.files.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ImageSink for MemorySink {
    async fn prepare(&self) -> Result<(), SetupError> {
        Ok(())
    }

    async fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, DownloadError> {
        self.files
            .lock()
            .unwrap()
            .insert(file_name.to_string(), bytes.to_vec());
        Ok(self.location(file_name))
    }

    fn location(&self, file_name: &str) -> PathBuf {
        PathBuf::from(file_name)
    }
}
