//! End-to-end orchestrator tests with mock sources and transport.
//!
//! These exercise the full flow: tag resolution, per-source sweeps,
//! aggregation, caching and pagination, without touching the network.

use std::sync::Arc;
use std::time::Duration;

use kaleido_core::testing::{fixtures, MockSource, MockTransport};
use kaleido_core::{
    FetchOptions, QueryCache, QueryOrchestrator, SearchError, SourceRegistry, SweepPolicy,
};

fn orchestrator_with(
    sources: Vec<MockSource>,
    transport: Arc<MockTransport>,
) -> QueryOrchestrator {
    let registry = Arc::new(SourceRegistry::new(
        sources
            .into_iter()
            .map(|s| Arc::new(s) as Arc<dyn kaleido_core::SourceAdapter>)
            .collect(),
    ));
    QueryOrchestrator::new(
        registry,
        transport,
        Arc::new(QueryCache::default()),
        FetchOptions {
            policy: SweepPolicy::Fixed,
            page_size: 100,
            global_page_cap: 2,
            page_timeout: Duration::from_secs(5),
        },
        Duration::from_secs(3),
    )
}

#[tokio::test]
async fn test_search_merges_dedups_and_caches() {
    let alpha = MockSource::new("alpha");
    let beta = MockSource::new("beta");
    let transport = Arc::new(MockTransport::new());

    // Tag probes find nothing, so both sources fall back to "anya".
    transport.respond(
        &alpha.page_url("anya", 1, 100),
        &fixtures::page_json(&[
            fixtures::image_from("1", "https://img/1.png", 10, "Mock(alpha)"),
            fixtures::image_from("2", "https://img/shared.png", 5, "Mock(alpha)"),
        ]),
    );
    transport.respond(
        &beta.page_url("anya", 1, 100),
        &fixtures::page_json(&[
            fixtures::image_from("9", "https://img/shared.png", 99, "Mock(beta)"),
            fixtures::image_from("3", "https://img/3.png", 1, "Mock(beta)"),
        ]),
    );

    let orchestrator = orchestrator_with(vec![alpha, beta], Arc::clone(&transport));

    let result = orchestrator.search("anya", None, 1, 100).await.unwrap();
    assert!(!result.cached);
    assert_eq!(result.total_images, 3);
    assert_eq!(result.total_pages, 1);

    // The shared URL survives from the first source in registry order.
    let urls: Vec<_> = result.images.iter().map(|i| i.url.as_str()).collect();
    assert_eq!(urls, vec!["https://img/1.png", "https://img/shared.png", "https://img/3.png"]);
    assert_eq!(result.images[1].source_name, "Mock(alpha)");
    assert_eq!(result.source_counts["alpha"], 2);
    assert_eq!(result.source_counts["beta"], 1);

    // Second identical query is served from cache without network traffic.
    let before = transport.request_count();
    let cached = orchestrator.search("anya", None, 1, 100).await.unwrap();
    assert!(cached.cached);
    assert_eq!(cached.total_images, 3);
    assert_eq!(transport.request_count(), before);
}

#[tokio::test]
async fn test_unreachable_sources_yield_well_formed_empty_result() {
    let transport = Arc::new(MockTransport::new());
    transport.set_fallback(|_| {
        Err(kaleido_core::Absorbed::Transport(
            "connection refused".to_string(),
        ))
    });

    let orchestrator = orchestrator_with(
        vec![MockSource::new("alpha"), MockSource::new("beta")],
        transport,
    );

    let result = orchestrator.search("anya", None, 1, 100).await.unwrap();
    assert_eq!(result.total_images, 0);
    assert_eq!(result.total_pages, 1);
    assert!(result.images.is_empty());
    assert_eq!(result.source_counts["alpha"], 0);
    assert_eq!(result.source_counts["beta"], 0);
}

#[tokio::test]
async fn test_resolved_tag_drives_page_fetches() {
    let alpha = MockSource::new("alpha");
    let transport = Arc::new(MockTransport::new());

    // The first variation probe returns a canonical character tag.
    transport.respond(
        &alpha.tag_url("anya_(spy_x_family)").unwrap(),
        &fixtures::tag_hits_json(&[("anya_forger_(spy_x_family)", 6000)]),
    );
    let expected_page = alpha.page_url("anya_forger_(spy_x_family)", 1, 100);
    transport.respond(
        &expected_page,
        &fixtures::page_json(&[fixtures::image("1", "https://img/1.png", 3)]),
    );

    let orchestrator = orchestrator_with(vec![alpha.clone()], Arc::clone(&transport));
    let result = orchestrator
        .search("Anya Forger", Some("Spy x Family"), 1, 100)
        .await
        .unwrap();

    assert_eq!(result.total_images, 1);
    assert!(transport.requests().contains(&expected_page));
}

#[tokio::test]
async fn test_tag_fallback_is_normalized_character_name() {
    let alpha = MockSource::new("alpha");
    let transport = Arc::new(MockTransport::new());

    let orchestrator = orchestrator_with(vec![alpha.clone()], Arc::clone(&transport));
    let tags = orchestrator
        .discover_tags("Anya Forger", None)
        .await
        .unwrap();

    assert_eq!(tags.tag_for("alpha"), Some("anya_forger"));
}

#[tokio::test]
async fn test_aliases_copy_primary_resolution() {
    let safebooru = MockSource::new("safebooru");
    let tbib = MockSource::new("tbib").without_tag_search();
    let transport = Arc::new(MockTransport::new());

    transport.respond(
        &safebooru.tag_url("anya_(spy_x_family)").unwrap(),
        &fixtures::tag_hits_json(&[("anya_(spy_x_family)", 2500)]),
    );

    let orchestrator = orchestrator_with(vec![safebooru, tbib], transport);
    let tags = orchestrator
        .discover_tags("Anya Forger", Some("Spy x Family"))
        .await
        .unwrap();

    assert_eq!(tags.tag_for("safebooru"), Some("anya_(spy_x_family)"));
    // Aliased identifiers reuse safebooru's resolution.
    assert_eq!(tags.tag_for("tbib"), Some("anya_(spy_x_family)"));
    assert_eq!(tags.tag_for("anime_pictures"), Some("anya_(spy_x_family)"));
}

#[tokio::test]
async fn test_tag_resolution_is_cached() {
    let alpha = MockSource::new("alpha");
    let transport = Arc::new(MockTransport::new());

    let orchestrator = orchestrator_with(vec![alpha], Arc::clone(&transport));

    orchestrator.discover_tags("anya", None).await.unwrap();
    let probes_after_first = transport.request_count();
    assert!(probes_after_first > 0);

    orchestrator.discover_tags("anya", None).await.unwrap();
    assert_eq!(transport.request_count(), probes_after_first);
}

#[tokio::test]
async fn test_series_scopes_the_cache_key() {
    let alpha = MockSource::new("alpha");
    let transport = Arc::new(MockTransport::new());

    let orchestrator = orchestrator_with(vec![alpha], Arc::clone(&transport));

    orchestrator.search("anya", None, 1, 100).await.unwrap();
    let before = transport.request_count();

    // A different series is a different query and must refetch.
    let result = orchestrator
        .search("anya", Some("Spy x Family"), 1, 100)
        .await
        .unwrap();
    assert!(!result.cached);
    assert!(transport.request_count() > before);
}

#[tokio::test]
async fn test_empty_character_rejected_before_any_network() {
    let transport = Arc::new(MockTransport::new());
    let orchestrator = orchestrator_with(vec![MockSource::new("alpha")], Arc::clone(&transport));

    let err = orchestrator.search("  ", None, 1, 100).await.unwrap_err();
    assert_eq!(err, SearchError::EmptyCharacter);
    assert_eq!(transport.request_count(), 0);
}
