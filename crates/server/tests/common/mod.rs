//! Common test utilities for E2E testing with mocks.
//!
//! Builds an in-process router wired to mock sources and a mock transport,
//! so the full HTTP surface can be exercised without external
//! infrastructure.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use kaleido_core::testing::{MockSource, MockTransport};
use kaleido_core::{
    Config, QueryCache, QueryOrchestrator, SourceAdapter, SourceRegistry, Transport,
};
use kaleido_server::{create_router, AppState};

/// Test fixture for E2E testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// let fixture = TestFixture::new();
/// fixture.transport.respond(&fixture.alpha.page_url("anya", 1, 100), "...");
///
/// let response = fixture.get("/api/v1/search?character=anya").await;
/// assert_eq!(response.status, StatusCode::OK);
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock transport - configure source responses and failures
    pub transport: Arc<MockTransport>,
    /// The two mock sources behind the router, in registry order
    pub alpha: MockSource,
    pub beta: MockSource,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    /// Parsed JSON body, or `Value::Null` for non-JSON responses.
    pub body: Value,
    /// Raw body text (for the metrics endpoint).
    pub text: String,
}

impl TestFixture {
    pub fn new() -> Self {
        let alpha = MockSource::new("alpha");
        let beta = MockSource::new("beta");
        let transport = Arc::new(MockTransport::new());

        let registry = Arc::new(SourceRegistry::new(vec![
            Arc::new(alpha.clone()) as Arc<dyn SourceAdapter>,
            Arc::new(beta.clone()) as Arc<dyn SourceAdapter>,
        ]));

        let config = Config::default();
        let cache = Arc::new(QueryCache::new(config.cache.to_options()));
        let orchestrator = QueryOrchestrator::new(
            registry,
            Arc::clone(&transport) as Arc<dyn Transport>,
            cache,
            config.fetch.to_options(),
            config.resolver.probe_timeout(),
        );

        let state = Arc::new(AppState::new(config, orchestrator));
        let router = create_router(state);

        Self {
            router,
            transport,
            alpha,
            beta,
        }
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path).await
    }

    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path).await
    }

    async fn request(&self, method: &str, path: &str) -> TestResponse {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .body(Body::empty())
            .expect("request builds");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router handles request");

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body collects")
            .to_bytes();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse { status, body, text }
    }
}
