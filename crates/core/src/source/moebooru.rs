//! Moebooru API adapter, covering yande.re and konachan.

use std::time::Duration;

use serde::Deserialize;

use super::types::{Absorbed, ImageRecord, SourceMeta, TagHit};
use super::{split_tags, SourceAdapter};

/// One adapter instance per moebooru site.
pub struct Moebooru {
    name: &'static str,
    display_name: &'static str,
    base_url: &'static str,
    meta: SourceMeta,
}

impl Moebooru {
    pub fn yandere() -> Self {
        Self {
            name: "yandere",
            display_name: "Yande.re",
            base_url: "https://yande.re",
            meta: SourceMeta {
                max_concurrency: 3,
                requests_per_interval: 3,
                interval: Duration::from_secs(1),
                max_pages: 50,
            },
        }
    }

    pub fn konachan() -> Self {
        Self {
            name: "konachan",
            display_name: "Konachan",
            base_url: "https://konachan.net",
            meta: SourceMeta {
                max_concurrency: 3,
                requests_per_interval: 3,
                interval: Duration::from_secs(1),
                max_pages: 50,
            },
        }
    }
}

impl SourceAdapter for Moebooru {
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
        format!(
            "{}/post.json?tags={}&page={}&limit={}",
            self.base_url,
            urlencoding::encode(&format!("{tag} rating:safe")),
            page,
            page_size
        )
    }

    fn parse_response(&self, raw: &str) -> Result<Vec<ImageRecord>, Absorbed> {
        let posts: Vec<MoebooruPost> =
            serde_json::from_str(raw).map_err(|e| Absorbed::Parse(e.to_string()))?;

        Ok(posts
            .into_iter()
            .filter_map(|p| {
                let url = p.file_url.or(p.jpeg_url)?;
                if url.is_empty() {
                    return None;
                }
                Some(ImageRecord {
                    id: p.id.map(|id| id.to_string()).unwrap_or_default(),
                    url,
                    preview_url: p.preview_url,
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
        Some(format!(
            "{}/tag.json?name={}*&limit=100",
            self.base_url,
            urlencoding::encode(term)
        ))
    }

    fn parse_tag_search_response(&self, raw: &str) -> Result<Vec<TagHit>, Absorbed> {
        let rows: Vec<MoebooruTag> =
            serde_json::from_str(raw).map_err(|e| Absorbed::Parse(e.to_string()))?;

        Ok(rows
            .into_iter()
            .filter_map(|t| {
                Some(TagHit {
                    name: t.name?,
                    post_count: t.count.unwrap_or(0),
                })
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct MoebooruPost {
    #[serde(default)]
    id: Option<u64>,
    #[serde(default)]
    file_url: Option<String>,
    #[serde(default)]
    jpeg_url: Option<String>,
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
struct MoebooruTag {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    count: Option<u64>,
}
