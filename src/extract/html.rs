// src/extract/html.rs
// =============================================================================
// This module extracts image and link URLs from HTML pages.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM, recovering from malformed markup the way a
//   browser would (so extraction never fails, it just finds less)
// - Supports CSS selectors for finding elements
//
// We also use the `url` crate to resolve relative references against the URL
// of the page they were found on.
// =============================================================================

use lazy_static::lazy_static;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use url::Url;

/// Image file extensions we download, compared case-insensitively
pub const IMAGE_EXTENSIONS: [&str; 5] = [".jpg", ".jpeg", ".png", ".gif", ".bmp"];

const E: &str = "Invalid selector";
lazy_static! {
    static ref IMG: Selector = Selector::parse("img[src]").expect(E);
    static ref A: Selector = Selector::parse("a[href]").expect(E);
}

// Extracts every supported image referenced by an <img src> on the page
//
// Parameters:
//   html: the page body
//   base: the URL the page was fetched from
//
// Returns: absolute image URLs whose path ends in one of IMAGE_EXTENSIONS.
// Images may live on any host; only page links are scoped to the origin.
//
// Example:
//   html = "<img src='x.jpg'><img src='x.svg'><img src='x.PNG'>"
//   base = "https://example.com/a/"
//   result = {"https://example.com/a/x.PNG", "https://example.com/a/x.jpg"}
pub fn extract_images(html: &str, base: &Url) -> BTreeSet<Url> {
    let document = Html::parse_document(html);

    document
        .select(&IMG)
        .filter_map(|img| img.value().attr("src"))
        .filter_map(|src| resolve_reference(base, src))
        .filter(has_image_extension)
        .collect()
}

// Extracts every link on the page that stays on the same host as the page
//
// Returns: absolute http/https URLs without fragments, so "/a#top" and
// "/a#bottom" collapse into a single entry.
pub fn extract_links(html: &str, base: &Url) -> BTreeSet<Url> {
    let document = Html::parse_document(html);

    document
        .select(&A)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| resolve_reference(base, href))
        .filter(|link| link.host_str() == base.host_str())
        .collect()
}

// Resolves a possibly-relative reference to an absolute http(s) URL
//
// Skips references that can never lead to a crawlable resource:
// fragment-only anchors and the javascript:, mailto:, tel: and data: schemes.
fn resolve_reference(base: &Url, reference: &str) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with('#') {
        return None;
    }

    let lower = reference.to_ascii_lowercase();
    if ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
    {
        return None;
    }

    let mut url = base.join(reference).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

fn has_image_extension(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
