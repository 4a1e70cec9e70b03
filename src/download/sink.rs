// src/download/sink.rs
// =============================================================================
// Where downloaded images end up.
//
// The ImageSink trait hides the filesystem from the downloader so the crawl
// can be tested without touching disk. DirSink is the real implementation: it
// writes every image straight into one output directory.
//
// File names are derived from the image URL and sanitized so that nothing
// from the remote side can escape the output directory.
// =============================================================================

use crate::error::{DownloadError, SetupError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use url::Url;

/// Used when an image URL has no usable final path segment
pub const PLACEHOLDER_FILE_NAME: &str = "unnamed_image";

/// Destination for downloaded image bytes.
#[async_trait]
pub trait ImageSink: Send + Sync {
    /// Makes sure the sink can accept writes. Called once before crawling.
    async fn prepare(&self) -> Result<(), SetupError>;

    /// Stores `bytes` under `file_name` and returns where they went.
    async fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, DownloadError>;

    /// Where `file_name` would be stored, for reporting before the write happens.
    fn location(&self, file_name: &str) -> PathBuf;
}

/// Writes images into a directory on the local filesystem
#[derive(Debug, Clone)]
pub struct DirSink {
    dir: PathBuf,
}

impl DirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl ImageSink for DirSink {
    async fn prepare(&self) -> Result<(), SetupError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| SetupError::OutputDir {
                path: self.dir.clone(),
                source,
            })
    }

    async fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf, DownloadError> {
        let path = self.location(file_name);
        // A second image with the same sanitized name overwrites the first
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| DownloadError::Write {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    fn location(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }
}

// Derives a safe file name from the last path segment of an image URL
//
// The segment is percent-decoded first, so the name matches what the page
// author wrote. Every character outside [A-Za-z0-9.-] then becomes '_',
// which also neutralises any decoded '/'. Names that would be empty or made
// only of dots ("", ".", "..") fall back to PLACEHOLDER_FILE_NAME, so the
// result is always a plain file name inside the output directory.
//
// Examples:
//   https://a.com/img/cat.jpg         -> "cat.jpg"
//   https://a.com/img/weird name.jpg  -> "weird_name.jpg"
//   https://a.com/img/                -> "unnamed_image"
pub fn file_name_for(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");
    let decoded = urlencoding::decode_binary(segment.as_bytes());

    let sanitized: String = String::from_utf8_lossy(&decoded)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.chars().all(|c| c == '.') {
        PLACEHOLDER_FILE_NAME.to_string()
    } else {
        sanitized
    }
}
