//! Shared test fixtures.

use crate::source::{ImageRecord, TagHit};

/// A minimal image record with the given identity and score.
pub fn image(id: &str, url: &str, score: i64) -> ImageRecord {
    ImageRecord {
        id: id.to_string(),
        url: url.to_string(),
        preview_url: None,
        width: None,
        height: None,
        score,
        tags: vec![],
        source_name: "Mock".to_string(),
    }
}

/// An image record attributed to a specific source.
pub fn image_from(id: &str, url: &str, score: i64, source_name: &str) -> ImageRecord {
    ImageRecord {
        source_name: source_name.to_string(),
        ..image(id, url, score)
    }
}

/// JSON body for a page of [`MockSource`](super::MockSource) records.
pub fn page_json(records: &[ImageRecord]) -> String {
    serde_json::to_string(records).expect("records serialize")
}

/// JSON body for a [`MockSource`](super::MockSource) tag-search response.
pub fn tag_hits_json(hits: &[(&str, u64)]) -> String {
    let hits: Vec<TagHit> = hits
        .iter()
        .map(|(name, post_count)| TagHit {
            name: (*name).to_string(),
            post_count: *post_count,
        })
        .collect();
    serde_json::to_string(&hits).expect("hits serialize")
}
