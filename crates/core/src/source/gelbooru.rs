//! Gelbooru-style `dapi` adapter, covering safebooru, gelbooru and tbib.
//!
//! All three speak the same `index.php?page=dapi` protocol; they differ only
//! in host, rating filter, response envelope (gelbooru wraps posts in an
//! object, the others return a bare array) and throughput limits.

use std::time::Duration;

use serde::Deserialize;

use super::types::{Absorbed, ImageRecord, SourceMeta, TagHit};
use super::{absolutize, split_tags, SourceAdapter};

/// One adapter instance per dapi-compatible site.
pub struct GelbooruLike {
    name: &'static str,
    display_name: &'static str,
    base_url: &'static str,
    /// Appended to the search tag, e.g. `rating:general`.
    rating_filter: Option<&'static str>,
    /// Whether the site exposes a usable tag index.
    tag_search: bool,
    meta: SourceMeta,
}

impl GelbooruLike {
    pub fn safebooru() -> Self {
        Self {
            name: "safebooru",
            display_name: "Safebooru",
            base_url: "https://safebooru.org/index.php",
            rating_filter: None,
            tag_search: true,
            meta: SourceMeta {
                max_concurrency: 5,
                requests_per_interval: 2,
                interval: Duration::from_secs(1),
                max_pages: 100,
            },
        }
    }

    pub fn gelbooru() -> Self {
        Self {
            name: "gelbooru",
            display_name: "Gelbooru",
            base_url: "https://gelbooru.com/index.php",
            rating_filter: Some("rating:general"),
            tag_search: true,
            meta: SourceMeta {
                max_concurrency: 5,
                requests_per_interval: 2,
                interval: Duration::from_secs(1),
                max_pages: 100,
            },
        }
    }

    /// TBIB mirrors safebooru's content; its tag index is not queried
    /// (see the alias policy in the registry module).
    pub fn tbib() -> Self {
        Self {
            name: "tbib",
            display_name: "TBIB",
            base_url: "https://tbib.org/index.php",
            rating_filter: None,
            tag_search: false,
            meta: SourceMeta {
                max_concurrency: 3,
                requests_per_interval: 2,
                interval: Duration::from_secs(1),
                max_pages: 50,
            },
        }
    }

    fn search_tags(&self, tag: &str) -> String {
        match self.rating_filter {
            Some(filter) => format!("{tag} {filter}"),
            None => tag.to_string(),
        }
    }
}

impl SourceAdapter for GelbooruLike {
    fn name(&self) -> &str {
        self.name
    }

    fn display_name(&self) -> &str {
        self.display_name
    }

    fn meta(&self) -> SourceMeta {
        self.meta
    }

    fn build_query_url(&self, tag: &str, page: u32, page_size: u32) -> String {
        // dapi pages are 0-based.
        format!(
            "{}?page=dapi&s=post&q=index&json=1&tags={}&pid={}&limit={}",
            self.base_url,
            urlencoding::encode(&self.search_tags(tag)),
            page.saturating_sub(1),
            page_size
        )
    }

    fn parse_response(&self, raw: &str) -> Result<Vec<ImageRecord>, Absorbed> {
        let posts: DapiPosts =
            serde_json::from_str(raw).map_err(|e| Absorbed::Parse(e.to_string()))?;

        Ok(posts
            .into_vec()
            .into_iter()
            .filter_map(|p| {
                let url = absolutize(p.file_url?);
                if url.is_empty() {
                    return None;
                }
                Some(ImageRecord {
                    id: p.id.map(|id| id.to_string()).unwrap_or_default(),
                    url,
                    preview_url: p.preview_url.map(absolutize),
                    width: p.width,
                    height: p.height,
                    score: p.score.unwrap_or(0),
                    tags: split_tags(p.tags),
                    source_name: self.display_name.to_string(),
                })
            })
            .collect())
    }

    fn build_tag_search_url(&self, term: &str) -> Option<String> {
        if !self.tag_search {
            return None;
        }
        // `%25` is the dapi wildcard (`%`), matching the term as a prefix.
        Some(format!(
            "{}?page=dapi&s=tag&q=index&json=1&name_pattern={}%25&limit=100",
            self.base_url,
            urlencoding::encode(term)
        ))
    }

    fn parse_tag_search_response(&self, raw: &str) -> Result<Vec<TagHit>, Absorbed> {
        let rows: DapiTags =
            serde_json::from_str(raw).map_err(|e| Absorbed::Parse(e.to_string()))?;

        Ok(rows
            .into_vec()
            .into_iter()
            .filter_map(|t| {
                Some(TagHit {
                    name: t.name?,
                    post_count: t.count.or(t.post_count).unwrap_or(0),
                })
            })
            .collect())
    }
}

/// Posts envelope: gelbooru wraps the list in `{"post": [...]}`, the other
/// dapi sites return a bare array. An empty object (gelbooru with zero
/// results) parses as a wrapped empty list.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DapiPosts {
    Bare(Vec<DapiPost>),
    Wrapped {
        #[serde(default)]
        post: Vec<DapiPost>,
    },
}

impl DapiPosts {
    fn into_vec(self) -> Vec<DapiPost> {
        match self {
            DapiPosts::Bare(posts) => posts,
            DapiPosts::Wrapped { post } => post,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DapiPost {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    file_url: Option<String>,
    #[serde(default)]
    preview_url: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default)]
    tags: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DapiTags {
    Bare(Vec<DapiTag>),
    Wrapped {
        #[serde(default)]
        tag: Vec<DapiTag>,
    },
}

impl DapiTags {
    fn into_vec(self) -> Vec<DapiTag> {
        match self {
            DapiTags::Bare(tags) => tags,
            DapiTags::Wrapped { tag } => tag,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DapiTag {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    count: Option<u64>,
    #[serde(default)]
    post_count: Option<u64>,
}
