// src/main.rs
// =============================================================================
// This is the entry point of the spider CLI.
//
// What happens here:
// 1. Set up logging (tracing) and parse command-line arguments (clap)
// 2. Validate the seed URL and build the HTTP client
// 3. Run the crawl, stopping gracefully on Ctrl-C
// 4. Report the summary and exit
//
// Exit codes:
//   0 = crawl finished (individual page/image failures are only logged)
//   2 = fatal setup error (bad seed URL, output directory not creatable)
// =============================================================================

mod cli;
mod crawl;
mod download;
mod error;
mod extract;
mod fetch;

#[cfg(test)]
mod testing;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use crawl::{CrawlSummary, Crawler};
use download::DirSink;
use fetch::HttpFetcher;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::prelude::*;

const DEFAULT_LOG_FILTER: &str = "info,html5ever=error,selectors=error,hyper=warn,reqwest=info";

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_env("SPIDER_LOG")
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .init();

    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();

    // Setup: everything here may fail, and nothing here talks to the network
    let seed = cli.seed()?;
    let fetcher = HttpFetcher::new(&cli.fetch_config())?;
    let sink = DirSink::new(&cli.path);
    info!("Saving images to {}", sink.dir().display());

    let cancel = CancellationToken::new();
    spawn_shutdown_listener(cancel.clone());

    let crawler = Crawler::new(cli.crawl_config(), Arc::new(fetcher), Arc::new(sink));
    let summary = crawler.run(seed, cancel).await?;

    report(&summary, cli.json)?;
    Ok(0)
}

// Cancels the crawl on Ctrl-C. Workers stop taking new pages and queued
// downloads are skipped; requests already in flight are allowed to finish.
fn spawn_shutdown_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Shutdown requested, finishing in-flight work");
                cancel.cancel();
            }
            Err(e) => warn!("Cannot listen for Ctrl-C: {}", e),
        }
    });
}

fn report(summary: &CrawlSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    }

    info!(
        pages_crawled = summary.pages_crawled,
        pages_failed = summary.pages_failed,
        images_downloaded = summary.images_downloaded,
        images_failed = summary.images_failed,
        "Crawled {} page(s) ({} failed), downloaded {} image(s) ({} failed)",
        summary.pages_crawled,
        summary.pages_failed,
        summary.images_downloaded,
        summary.images_failed
    );
    if summary.cancelled {
        warn!("Crawl was interrupted before the frontier was exhausted");
    }
    info!("Done.");
    Ok(())
}
