// src/error.rs
// =============================================================================
// Typed errors for the crawler.
//
// There are two kinds of failure and they are handled very differently:
// - Per-item errors (FetchError, DownloadError) are recorded against a single
//   page or image, logged, and then swallowed. The crawl keeps going.
// - Setup errors (SetupError) happen before any network activity and abort
//   the whole run.
//
// Extraction never fails: malformed HTML simply yields no links and no images,
// so there is no ExtractionError type.
// =============================================================================

use std::path::PathBuf;
use thiserror::Error;

/// Why a page or image could not be fetched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("HTTP {0}")]
    Status(u16),
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("failed to read response body: {0}")]
    Body(String),
    #[error("request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for FetchError {
    // Mirrors the categorisation the link checker used for its statuses
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = error.status() {
            FetchError::Status(status.as_u16())
        } else if error.is_connect() {
            FetchError::Connect(error.to_string())
        } else if error.is_body() || error.is_decode() {
            FetchError::Body(error.to_string())
        } else {
            FetchError::Request(error.to_string())
        }
    }
}

/// Why a single image could not be saved.
#[derive(Debug, Error)]
pub enum DownloadError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fatal problems detected before crawling starts.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid seed URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("seed URL must use http:// or https://, got '{0}'")]
    UnsupportedScheme(String),
    #[error("seed URL has no host: {0}")]
    MissingHost(String),
    #[error("cannot create output directory {}: {source}", .path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}
