//! End-to-end tests with mocked sources.
//!
//! These run the full server stack in-process: real router, real
//! orchestrator, real adapter URL building, with only the network replaced
//! by a mock transport.

mod common;

use axum::http::StatusCode;
use kaleido_core::testing::fixtures;

use common::TestFixture;

// =============================================================================
// Basic API Tests
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/health").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert!(response.body["uptime_secs"].is_u64());
}

#[tokio::test]
async fn test_config_endpoint() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/config").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["server"]["port"], 10000);
    assert_eq!(response.body["fetch"]["page_size"], 100);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/nope").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_search_requires_character() {
    let fixture = TestFixture::new();

    let response = fixture.get("/api/v1/search").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.body["error"]
        .as_str()
        .unwrap()
        .contains("character"));

    let response = fixture.get("/api/v1/search?character=%20%20").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_aggregates_and_reports_cache_state() {
    let fixture = TestFixture::new();

    // Tag probes find nothing, so sources fetch under the fallback tag.
    fixture.transport.respond(
        &fixture.alpha.page_url("anya", 1, 100),
        &fixtures::page_json(&[
            fixtures::image_from("1", "https://img/a.png", 9, "Mock(alpha)"),
            fixtures::image_from("2", "https://img/both.png", 2, "Mock(alpha)"),
        ]),
    );
    fixture.transport.respond(
        &fixture.beta.page_url("anya", 1, 100),
        &fixtures::page_json(&[fixtures::image_from(
            "3",
            "https://img/both.png",
            5,
            "Mock(beta)",
        )]),
    );

    let response = fixture.get("/api/v1/search?character=anya").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total_images"], 2);
    assert_eq!(response.body["total_pages"], 1);
    assert_eq!(response.body["cached"], false);
    assert_eq!(response.body["source_counts"]["alpha"], 2);
    assert_eq!(response.body["source_counts"]["beta"], 0);
    assert_eq!(response.body["images"][0]["url"], "https://img/a.png");

    // Identical query again: served from cache.
    let response = fixture.get("/api/v1/search?character=anya").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["cached"], true);
    assert_eq!(response.body["total_images"], 2);
}

#[tokio::test]
async fn test_search_with_unreachable_sources_returns_empty_result() {
    let fixture = TestFixture::new();
    fixture.transport.set_fallback(|_| {
        Err(kaleido_core::Absorbed::Transport(
            "connection refused".to_string(),
        ))
    });

    let response = fixture.get("/api/v1/search?character=anya").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total_images"], 0);
    assert_eq!(response.body["total_pages"], 1);
    assert_eq!(response.body["images"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_search_pagination_parameters() {
    let fixture = TestFixture::new();

    let records: Vec<_> = (0..25)
        .map(|i| {
            fixtures::image_from(
                &i.to_string(),
                &format!("https://img/{i}.png"),
                25 - i,
                "Mock(alpha)",
            )
        })
        .collect();
    // The fetch page size is fixed by config; the request's `limit` only
    // shapes the returned slice.
    fixture.transport.respond(
        &fixture.alpha.page_url("anya", 1, 100),
        &fixtures::page_json(&records),
    );

    let response = fixture
        .get("/api/v1/search?character=anya&page=2&limit=10")
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["total_images"], 25);
    assert_eq!(response.body["total_pages"], 3);
    assert_eq!(response.body["page"], 2);
    assert_eq!(response.body["images"].as_array().unwrap().len(), 10);
    // First image of page 2 is the 11th by score.
    assert_eq!(response.body["images"][0]["score"], 15);

    // A page past the end is an empty slice, not an error.
    let response = fixture
        .get("/api/v1/search?character=anya&page=10&limit=10")
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["images"].as_array().unwrap().len(), 0);
}

// =============================================================================
// Tag discovery
// =============================================================================

#[tokio::test]
async fn test_tags_endpoint_requires_character() {
    let fixture = TestFixture::new();
    let response = fixture.get("/api/v1/tags").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tags_endpoint_resolves_per_source() {
    let fixture = TestFixture::new();

    fixture.transport.respond(
        &fixture.alpha.tag_url("anya_(spy_x_family)").unwrap(),
        &fixtures::tag_hits_json(&[("anya_forger_(spy_x_family)", 6000)]),
    );

    let response = fixture
        .get("/api/v1/tags?character=Anya%20Forger&series=Spy%20x%20Family")
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["tags"]["alpha"],
        "anya_forger_(spy_x_family)"
    );
    // Nothing scored for beta: normalized-name fallback.
    assert_eq!(response.body["tags"]["beta"], "anya_forger");
}

// =============================================================================
// Stats, cache control and metrics
// =============================================================================

#[tokio::test]
async fn test_stats_reflect_traffic_and_clear_resets_them() {
    let fixture = TestFixture::new();

    fixture.get("/api/v1/search?character=anya").await;
    fixture.get("/api/v1/search?character=anya").await;

    let response = fixture.get("/api/v1/stats").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["cache"]["images"]["size"], 1);
    assert_eq!(response.body["cache"]["images"]["hits"], 1);
    assert_eq!(response.body["cache"]["images"]["misses"], 1);

    let response = fixture.post("/api/v1/cache/clear").await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["cleared"], true);

    let response = fixture.get("/api/v1/stats").await;
    assert_eq!(response.body["cache"]["images"]["size"], 0);
    assert_eq!(response.body["cache"]["images"]["hits"], 0);
    assert_eq!(response.body["cache"]["tags"]["size"], 0);
}

#[tokio::test]
async fn test_metrics_endpoint_exposes_prometheus_text() {
    let fixture = TestFixture::new();

    // Generate some traffic first.
    fixture.get("/api/v1/health").await;

    let response = fixture.get("/metrics").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text.contains("# HELP"));
    assert!(response.text.contains("kaleido_http_requests_total"));
}
