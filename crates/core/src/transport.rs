//! HTTP transport seam.
//!
//! Adapters are pure URL-builders/parsers; everything that actually talks
//! to the network goes through [`Transport`], so the whole fetch path can
//! run against a mock in tests.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::source::Absorbed;

/// Issues a single GET and returns the response body as text.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, Absorbed>;
}

/// Production transport backed by a shared `reqwest` client.
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, Absorbed> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(absorb_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Absorbed::Status(status.as_u16()));
        }

        response.text().await.map_err(absorb_reqwest)
    }
}

fn absorb_reqwest(e: reqwest::Error) -> Absorbed {
    if e.is_timeout() {
        Absorbed::Timeout
    } else {
        Absorbed::Transport(e.to_string())
    }
}
