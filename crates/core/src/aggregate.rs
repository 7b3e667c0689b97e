//! Merging, deduplication and pagination of per-source results.
//!
//! `aggregate` is pure and deterministic: sources are visited in the fixed
//! registry order, the first occurrence of each URL wins, and the combined
//! list is sorted by score with a stable sort so ties keep their merge
//! order.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::source::ImageRecord;

/// The full, deduplicated result of one search. Cached verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResultSet {
    /// Sorted by score descending; ties keep merge order.
    pub images: Vec<ImageRecord>,
    /// Surviving images per source. Values sum to `images.len()`.
    pub source_counts: HashMap<String, usize>,
}

/// One page of a result set, as returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResult {
    pub images: Vec<ImageRecord>,
    pub total_images: usize,
    pub total_pages: usize,
    pub source_counts: HashMap<String, usize>,
    /// Whether this slice came from the cache.
    pub cached: bool,
}

/// Merge per-source result lists into one ranked, deduplicated set.
///
/// `per_source` must be in registry order; on a URL collision the earlier
/// source keeps the image and the count. Records with an empty URL are
/// dropped (adapters should not produce them, but the uniqueness invariant
/// is enforced here regardless).
pub fn aggregate(per_source: Vec<(String, Vec<ImageRecord>)>) -> SearchResultSet {
    let mut seen: HashSet<String> = HashSet::new();
    let mut images: Vec<ImageRecord> = Vec::new();
    let mut source_counts: HashMap<String, usize> = HashMap::new();

    for (source, records) in per_source {
        let count = source_counts.entry(source).or_insert(0);
        for record in records {
            if record.url.is_empty() {
                continue;
            }
            if seen.insert(record.url.clone()) {
                images.push(record);
                *count += 1;
            }
        }
    }

    // Vec::sort_by is stable, which is what keeps ties in merge order.
    images.sort_by(|a, b| b.score.cmp(&a.score));

    SearchResultSet {
        images,
        source_counts,
    }
}

/// Slice one page out of a result set.
///
/// `total_pages` is never 0; a page past the end yields an empty slice
/// rather than an error. `page` and `page_size` are clamped to at least 1.
pub fn paginate(set: &SearchResultSet, page: u32, page_size: u32, cached: bool) -> PaginatedResult {
    let page_size = page_size.max(1) as usize;
    let total_images = set.images.len();
    let total_pages = total_images.div_ceil(page_size).max(1);
    let start = (page.max(1) as usize - 1).saturating_mul(page_size);

    PaginatedResult {
        images: set
            .images
            .iter()
            .skip(start)
            .take(page_size)
            .cloned()
            .collect(),
        total_images,
        total_pages,
        source_counts: set.source_counts.clone(),
        cached,
    }
}
