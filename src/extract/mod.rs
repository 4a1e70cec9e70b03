// src/extract/mod.rs
// =============================================================================
// This module pulls image and link references out of HTML pages.
//
// Both functions are pure: no network, no filesystem. They take the page body
// and the URL it was fetched from, and return absolute URLs.
//
// Submodules:
// - html: the scraper-based implementation
// =============================================================================

mod html;

pub use html::{extract_images, extract_links};
