//! Prometheus metrics for core components.
//!
//! Covers the orchestrator (searches, durations), the fetch scheduler
//! (per-source page outcomes, images per sweep) and the tag resolver
//! (probe outcomes, resolution results).

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounterVec, Opts};

/// Searches by cache outcome ("hit" / "miss").
pub static SEARCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("kaleido_searches_total", "Total search queries"),
        &["cache"],
    )
    .unwrap()
});

/// End-to-end duration of cache-miss searches.
pub static SEARCH_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "kaleido_search_duration_seconds",
            "Duration of cache-miss searches",
        )
        .buckets(vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 20.0, 40.0, 80.0]),
    )
    .unwrap()
});

/// Page requests by source and outcome ("ok" / "absorbed").
pub static SOURCE_PAGE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "kaleido_source_page_requests_total",
            "Page fetch attempts per source",
        ),
        &["source", "outcome"],
    )
    .unwrap()
});

/// Images retrieved per sweep, per source.
pub static SOURCE_IMAGES: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "kaleido_source_images",
            "Images returned by one full sweep of a source",
        )
        .buckets(vec![0.0, 10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0]),
        &["source"],
    )
    .unwrap()
});

/// Tag-search probes by source and outcome ("ok" / "absorbed").
pub static TAG_PROBES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "kaleido_tag_probes_total",
            "Tag-search probe attempts per source",
        ),
        &["source", "outcome"],
    )
    .unwrap()
});

/// Tag resolutions by source and result ("scored" / "fallback").
pub static TAG_RESOLUTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "kaleido_tag_resolutions_total",
            "Per-source tag resolution outcomes",
        ),
        &["source", "result"],
    )
    .unwrap()
});

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SEARCHES_TOTAL.clone()),
        Box::new(SEARCH_DURATION.clone()),
        Box::new(SOURCE_PAGE_REQUESTS.clone()),
        Box::new(SOURCE_IMAGES.clone()),
        Box::new(TAG_PROBES.clone()),
        Box::new(TAG_RESOLUTIONS.clone()),
    ]
}
