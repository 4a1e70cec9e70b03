// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The surface mirrors the classic `spider` exercise:
//   spider [-r] [-l N] [-p PATH] URL
// plus a few knobs for concurrency, timeouts and JSON output.
//
// It also validates the seed URL. A bad seed is a fatal setup error and must
// be caught before we touch the filesystem or the network.
// =============================================================================

use crate::crawl::{CrawlConfig, DEFAULT_DOWNLOAD_WORKERS, DEFAULT_MAX_DEPTH, DEFAULT_PAGE_WORKERS};
use crate::error::SetupError;
use crate::fetch::FetchConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

// #[derive(Parser)] tells clap to generate the parsing code from this struct.
// Doc comments on the fields become the --help text.
#[derive(Parser, Debug)]
#[command(
    name = "spider",
    version = "0.1.0",
    about = "Crawl a website and download the images it references",
    long_about = "spider fetches a page, downloads every .jpg/.jpeg/.png/.gif/.bmp image it \
                  references and, with -r, follows same-host links up to a maximum depth."
)]
pub struct Cli {
    /// URL to start crawling from (http:// or https://)
    pub url: String,

    /// Recursively follow links on the same host
    #[arg(short, long)]
    pub recursive: bool,

    /// Maximum depth for recursive crawling; the start page is depth 0
    #[arg(short, long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub level: usize,

    /// Directory where downloaded images are saved (created if missing)
    #[arg(short, long, default_value = "./data/")]
    pub path: PathBuf,

    /// Number of pages fetched concurrently
    #[arg(short, long, default_value_t = DEFAULT_PAGE_WORKERS)]
    pub workers: usize,

    /// Number of images downloaded concurrently
    #[arg(long, default_value_t = DEFAULT_DOWNLOAD_WORKERS)]
    pub download_workers: usize,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = crate::fetch::DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// User-Agent header sent with every request
    #[arg(long, default_value = crate::fetch::DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Print the final summary as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn seed(&self) -> Result<Url, SetupError> {
        parse_seed(&self.url)
    }

    pub fn crawl_config(&self) -> CrawlConfig {
        CrawlConfig {
            max_depth: self.level,
            recursive: self.recursive,
            page_workers: self.workers,
            download_workers: self.download_workers,
        }
    }

    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout),
        }
    }
}

// Parses and checks the seed URL
//
// Accepts only absolute http:// and https:// URLs that name a host.
pub fn parse_seed(raw: &str) -> Result<Url, SetupError> {
    let url = Url::parse(raw.trim()).map_err(|source| SetupError::InvalidUrl {
        url: raw.to_string(),
        source,
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(SetupError::UnsupportedScheme(raw.to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(SetupError::MissingHost(raw.to_string()));
    }

    Ok(url)
}
