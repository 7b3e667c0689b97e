//! Mock transport for testing.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::source::Absorbed;
use crate::transport::Transport;

type Handler = Box<dyn Fn(&str) -> Result<String, Absorbed> + Send + Sync>;

/// In-memory [`Transport`] implementation.
///
/// Responses are configured per exact URL; unknown URLs fall through to an
/// optional handler and finally to an empty JSON array, which every adapter
/// parses as an empty page. All requests are recorded for assertions.
///
/// # Example
///
/// ```rust,ignore
/// let transport = MockTransport::new();
/// transport.respond("https://example.com/posts?page=1", r#"[{"id": 1}]"#);
/// transport.fail("https://example.com/posts?page=2", Absorbed::Timeout);
///
/// let body = transport.get_text("https://example.com/posts?page=1", timeout).await?;
/// assert_eq!(transport.request_count(), 1);
/// ```
pub struct MockTransport {
    routes: Mutex<HashMap<String, Result<String, Absorbed>>>,
    fallback: Mutex<Option<Handler>>,
    requests: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            routes: Mutex::new(HashMap::new()),
            fallback: Mutex::new(None),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Serve `body` for an exact URL.
    pub fn respond(&self, url: &str, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(body.to_string()));
    }

    /// Fail an exact URL with the given absorbed error.
    pub fn fail(&self, url: &str, absorbed: Absorbed) {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(absorbed));
    }

    /// Handler for URLs with no exact route. Without one, unknown URLs
    /// return `"[]"`.
    pub fn set_fallback<F>(&self, handler: F)
    where
        F: Fn(&str) -> Result<String, Absorbed> + Send + Sync + 'static,
    {
        *self.fallback.lock().unwrap() = Some(Box::new(handler));
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn clear_recorded(&self) {
        self.requests.lock().unwrap().clear();
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get_text(&self, url: &str, _timeout: Duration) -> Result<String, Absorbed> {
        self.requests.lock().unwrap().push(url.to_string());

        if let Some(result) = self.routes.lock().unwrap().get(url) {
            return result.clone();
        }
        if let Some(handler) = self.fallback.lock().unwrap().as_ref() {
            return handler(url);
        }
        Ok("[]".to_string())
    }
}
