//! Types shared by all booru source adapters.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A single image as reported by one source.
///
/// Immutable once produced by an adapter. Two records are the same image
/// exactly when their `url` fields are byte-equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    /// Source-local post id.
    pub id: String,
    /// Full-size image URL. Never empty for records returned by an adapter.
    pub url: String,
    /// Thumbnail URL, if the source provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
    /// Image width in pixels, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Image height in pixels, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Source-side vote score. Defaults to 0 when absent.
    #[serde(default)]
    pub score: i64,
    /// Tags attached to the post, in source order.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Display name of the source that returned this record.
    pub source_name: String,
}

/// A `(name, post_count)` pair returned by a source's tag-search endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagHit {
    pub name: String,
    pub post_count: u64,
}

/// Static throughput and pagination limits for one source.
#[derive(Debug, Clone, Copy)]
pub struct SourceMeta {
    /// Maximum in-flight page requests against this source.
    pub max_concurrency: usize,
    /// Request starts allowed per `interval`.
    pub requests_per_interval: u32,
    /// Length of the admission window.
    pub interval: Duration,
    /// Last page the source will serve for a single tag.
    pub max_pages: u32,
}

/// A request attempt that failed and contributes nothing.
///
/// Every page fetch and tag probe resolves to `Result<_, Absorbed>`; the
/// error branch is always mapped to an empty contribution and never
/// propagates past the fetch scheduler or the resolver.
#[derive(Debug, Clone, Error)]
pub enum Absorbed {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_record_defaults_on_deserialize() {
        let json = r#"{"id":"1","url":"https://example.com/a.png","source_name":"Test"}"#;
        let record: ImageRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.score, 0);
        assert!(record.tags.is_empty());
        assert!(record.preview_url.is_none());
        assert!(record.width.is_none());
        assert!(record.height.is_none());
    }

    #[test]
    fn test_image_record_serialization_skips_absent_fields() {
        let record = ImageRecord {
            id: "1".to_string(),
            url: "https://example.com/a.png".to_string(),
            preview_url: None,
            width: None,
            height: None,
            score: 5,
            tags: vec!["tag_a".to_string()],
            source_name: "Test".to_string(),
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("preview_url"));
        assert!(!json.contains("width"));
        assert!(json.contains("\"score\":5"));
    }

    #[test]
    fn test_absorbed_display() {
        assert_eq!(Absorbed::Timeout.to_string(), "request timed out");
        assert_eq!(
            Absorbed::Status(429).to_string(),
            "unexpected HTTP status 429"
        );
    }
}
