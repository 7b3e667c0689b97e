//! Danbooru JSON API adapter.

use std::time::Duration;

use serde::Deserialize;

use super::types::{Absorbed, ImageRecord, SourceMeta, TagHit};
use super::{split_tags, SourceAdapter};

const BASE_URL: &str = "https://danbooru.donmai.us";

/// Danbooru caps anonymous requests hard, so this source runs with the
/// tightest admission limits in the registry.
pub struct Danbooru {
    meta: SourceMeta,
}

impl Danbooru {
    pub fn new() -> Self {
        Self {
            meta: SourceMeta {
                max_concurrency: 2,
                requests_per_interval: 1,
                interval: Duration::from_secs(1),
                max_pages: 50,
            },
        }
    }
}

impl Default for Danbooru {
    fn default() -> Self {
        Self::new()
    }
}

impl SourceAdapter for Danbooru {
    fn name(&self) -> &str {
        "danbooru"
    }

    fn display_name(&self) -> &str {
        "Danbooru"
    }

    fn meta(&self) -> SourceMeta {
        self.meta
    }

    fn build_query_url(&self, tag: &str, page: u32, page_size: u32) -> String {
        format!(
            "{BASE_URL}/posts.json?tags={}&page={}&limit={}",
            urlencoding::encode(&format!("{tag} rating:general")),
            page,
            page_size.min(100)
        )
    }

    fn parse_response(&self, raw: &str) -> Result<Vec<ImageRecord>, Absorbed> {
        let posts: Vec<DanbooruPost> =
            serde_json::from_str(raw).map_err(|e| Absorbed::Parse(e.to_string()))?;

        Ok(posts
            .into_iter()
            .filter_map(|p| {
                let url = p.file_url.or(p.large_file_url)?;
                // Danbooru serves a placeholder URL for removed posts.
                if url.is_empty() || url.contains("deleted") {
                    return None;
                }
                Some(ImageRecord {
                    id: p.id.map(|id| id.to_string()).unwrap_or_default(),
                    url,
                    preview_url: p.preview_file_url,
                    width: p.image_width,
                    height: p.image_height,
                    score: p.score.unwrap_or(0),
                    tags: split_tags(p.tag_string),
                    source_name: self.display_name().to_string(),
                })
            })
            .collect())
    }

    fn build_tag_search_url(&self, term: &str) -> Option<String> {
        // category 4 restricts the search to character tags.
        Some(format!(
            "{BASE_URL}/tags.json?search%5Bname_matches%5D={}*&search%5Bcategory%5D=4&limit=100",
            urlencoding::encode(term)
        ))
    }

    fn parse_tag_search_response(&self, raw: &str) -> Result<Vec<TagHit>, Absorbed> {
        let rows: Vec<DanbooruTag> =
            serde_json::from_str(raw).map_err(|e| Absorbed::Parse(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|t| {
                Some(TagHit {
                    name: t.name?,
                    post_count: t.post_count.unwrap_or(0),
                })
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct DanbooruPost {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    file_url: Option<String>,
    #[serde(default)]
    large_file_url: Option<String>,
    #[serde(default)]
    preview_file_url: Option<String>,
    #[serde(default)]
    image_width: Option<u32>,
    #[serde(default)]
    image_height: Option<u32>,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default)]
    tag_string: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DanbooruTag {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    post_count: Option<u64>,
}
