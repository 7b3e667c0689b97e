//! Mock source adapter for testing.

use std::time::Duration;

use crate::source::{Absorbed, ImageRecord, SourceAdapter, SourceMeta, TagHit};

/// A source whose pages and tag hits are plain JSON-encoded domain types.
///
/// `parse_response` expects a JSON array of [`ImageRecord`], and
/// `parse_tag_search_response` a JSON array of [`TagHit`], so tests can
/// serve exactly the records they want through a
/// [`MockTransport`](super::MockTransport).
#[derive(Debug, Clone)]
pub struct MockSource {
    name: String,
    display_name: String,
    meta: SourceMeta,
    tag_search: bool,
}

impl MockSource {
    /// A permissive source: generous admission limits, 5 pages.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            display_name: format!("Mock({name})"),
            meta: SourceMeta {
                max_concurrency: 8,
                requests_per_interval: 1000,
                interval: Duration::from_secs(1),
                max_pages: 5,
            },
            tag_search: true,
        }
    }

    pub fn with_meta(mut self, meta: SourceMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Disable the tag-search endpoint, like an alias-only source.
    pub fn without_tag_search(mut self) -> Self {
        self.tag_search = false;
        self
    }

    /// The URL this source would request for a page; handy for wiring a
    /// mock transport.
    pub fn page_url(&self, tag: &str, page: u32, page_size: u32) -> String {
        self.build_query_url(tag, page, page_size)
    }

    /// The URL this source would probe for a tag term.
    pub fn tag_url(&self, term: &str) -> Option<String> {
        self.build_tag_search_url(term)
    }
}

impl SourceAdapter for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn meta(&self) -> SourceMeta {
        self.meta
    }

    fn build_query_url(&self, tag: &str, page: u32, page_size: u32) -> String {
        format!(
            "mock://{}/posts?tags={}&page={}&limit={}",
            self.name,
            urlencoding::encode(tag),
            page,
            page_size
        )
    }

    fn parse_response(&self, raw: &str) -> Result<Vec<ImageRecord>, Absorbed> {
        serde_json::from_str(raw).map_err(|e| Absorbed::Parse(e.to_string()))
    }

    fn build_tag_search_url(&self, term: &str) -> Option<String> {
        self.tag_search.then(|| {
            format!(
                "mock://{}/tags?term={}",
                self.name,
                urlencoding::encode(term)
            )
        })
    }

    fn parse_tag_search_response(&self, raw: &str) -> Result<Vec<TagHit>, Absorbed> {
        serde_json::from_str(raw).map_err(|e| Absorbed::Parse(e.to_string()))
    }
}
