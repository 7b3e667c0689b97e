//! Booru source adapters.
//!
//! Each source is a pure adapter: it builds request URLs and parses raw
//! response bodies, nothing more. All network I/O, admission control and
//! scheduling live in the `fetcher` module, so adapters stay trivially
//! testable against canned JSON.
//!
//! Three API families cover the six built-in sources:
//! - Gelbooru-style `dapi` (safebooru, gelbooru, tbib)
//! - Danbooru JSON (danbooru)
//! - Moebooru JSON (yandere, konachan)

mod danbooru;
mod gelbooru;
mod moebooru;
mod types;

pub use danbooru::Danbooru;
pub use gelbooru::GelbooruLike;
pub use moebooru::Moebooru;
pub use types::{Absorbed, ImageRecord, SourceMeta, TagHit};

use std::sync::Arc;

/// Contract every source adapter satisfies.
///
/// `parse_response` and `parse_tag_search_response` absorb malformed input
/// into [`Absorbed::Parse`] instead of panicking; callers map the absorbed
/// branch to an empty contribution.
pub trait SourceAdapter: Send + Sync {
    /// Registry identifier, e.g. `"safebooru"`.
    fn name(&self) -> &str;

    /// Human-facing name, stamped into every [`ImageRecord`].
    fn display_name(&self) -> &str;

    /// Throughput and pagination limits for this source.
    fn meta(&self) -> SourceMeta;

    /// URL of one page of posts for `tag`. Pages are 1-based.
    fn build_query_url(&self, tag: &str, page: u32, page_size: u32) -> String;

    /// Parse a raw posts response into image records.
    ///
    /// Records with an empty or unusable URL are dropped here, and
    /// protocol-relative URLs are absolutized.
    fn parse_response(&self, raw: &str) -> Result<Vec<ImageRecord>, Absorbed>;

    /// URL of the tag-search endpoint for a prefix term, or `None` when the
    /// source has no usable tag index (the alias policy covers it instead).
    fn build_tag_search_url(&self, term: &str) -> Option<String>;

    /// Parse a raw tag-search response into `(name, post_count)` pairs.
    fn parse_tag_search_response(&self, raw: &str) -> Result<Vec<TagHit>, Absorbed>;
}

/// The fixed, ordered set of sources a deployment aggregates.
///
/// Iteration order is part of the aggregation contract: the dedup stage
/// visits sources in this order, so first-source-wins collisions are
/// reproducible.
pub struct SourceRegistry {
    sources: Vec<Arc<dyn SourceAdapter>>,
}

impl SourceRegistry {
    /// The six built-in boorus, in canonical merge order.
    pub fn builtin() -> Self {
        Self {
            sources: vec![
                Arc::new(GelbooruLike::safebooru()),
                Arc::new(Danbooru::new()),
                Arc::new(GelbooruLike::gelbooru()),
                Arc::new(Moebooru::yandere()),
                Arc::new(Moebooru::konachan()),
                Arc::new(GelbooruLike::tbib()),
            ],
        }
    }

    /// Build a registry from an explicit adapter list (tests use this).
    pub fn new(sources: Vec<Arc<dyn SourceAdapter>>) -> Self {
        Self { sources }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SourceAdapter>> {
        self.sources.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn SourceAdapter>> {
        self.sources.iter().find(|s| s.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

/// Identifiers that reuse another source's resolved tag instead of running
/// their own resolution. Low-traffic mirrors trust the primary's tag index;
/// this saves a full probe sequence per aliased source.
pub fn tag_aliases() -> &'static [(&'static str, &'static str)] {
    &[("tbib", "safebooru"), ("anime_pictures", "safebooru")]
}

/// Booru APIs frequently return protocol-relative URLs (`//host/path`).
pub(crate) fn absolutize(url: String) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url
    }
}

/// Split a booru tag string ("tag_a tag_b tag_c") into individual tags.
pub(crate) fn split_tags(tags: Option<String>) -> Vec<String> {
    tags.map(|t| {
        t.split_whitespace()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
    })
    .unwrap_or_default()
}
