// src/crawl/visited.rs
// =============================================================================
// The visited registry: which URLs have already been claimed for crawling.
//
// A worker may only crawl a URL after `try_mark` returned true for it. The
// check and the insert happen in one call on a concurrent set, so two
// workers that discover the same link at the same time cannot both win.
//
// The registry only grows, and it lives exactly as long as one crawl.
// =============================================================================

use dashmap::DashSet;
use std::fmt;
use url::Url;

/// A URL reduced to the parts that decide whether two links are the same page.
///
/// Scheme, host, port, path and query are kept as the url crate normalises
/// them (lowercase scheme and host, default ports dropped, dot segments
/// resolved, empty path becomes "/"). The fragment is removed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalUrl(String);

impl CanonicalUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&Url> for CanonicalUrl {
    fn from(url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        CanonicalUrl(url.into())
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Concurrency-safe set of canonical URLs
#[derive(Debug, Default)]
pub struct VisitedRegistry {
    seen: DashSet<CanonicalUrl>,
}

impl VisitedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true iff this call inserted `url`, i.e. the caller now owns it.
    pub fn try_mark(&self, url: &CanonicalUrl) -> bool {
        self.seen.insert(url.clone())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }
}
