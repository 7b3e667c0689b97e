//! Per-source page fetch scheduler.
//!
//! `fetch_all` retrieves every available page for one tag from one source
//! under that source's admission policy. It never raises: each page fetch
//! resolves to `Result<Vec<ImageRecord>, Absorbed>` and the absorbed branch
//! contributes an empty page. Exhaustiveness is traded for bounded latency,
//! so there are no retries and no backoff.

mod admission;

pub use admission::{Admission, TokenBucket};

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::metrics;
use crate::source::{Absorbed, ImageRecord, SourceAdapter, SourceRegistry};
use crate::transport::Transport;

/// Page traversal strategy, chosen at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "policy")]
pub enum SweepPolicy {
    /// Issue every page up to the cap unconditionally and keep whatever
    /// comes back. Simple baseline; wastes requests past the last real
    /// page.
    Fixed,
    /// Issue pages in fixed-size waves and stop once `max_empty_waves`
    /// consecutive waves return zero images.
    Adaptive {
        #[serde(default = "default_wave_size")]
        wave_size: u32,
        #[serde(default = "default_max_empty_waves")]
        max_empty_waves: u32,
    },
}

impl Default for SweepPolicy {
    fn default() -> Self {
        SweepPolicy::Adaptive {
            wave_size: default_wave_size(),
            max_empty_waves: default_max_empty_waves(),
        }
    }
}

fn default_wave_size() -> u32 {
    10
}

fn default_max_empty_waves() -> u32 {
    2
}

/// Tunables for the fetch scheduler.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub policy: SweepPolicy,
    /// Images requested per page.
    pub page_size: u32,
    /// Upper bound on pages per source, regardless of the source's own
    /// `max_pages`.
    pub global_page_cap: u32,
    /// Per-page request timeout.
    pub page_timeout: Duration,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            policy: SweepPolicy::default(),
            page_size: 100,
            global_page_cap: 200,
            page_timeout: Duration::from_secs(5),
        }
    }
}

/// Fetches all pages for a tag from each source, under per-source
/// admission control.
///
/// Owns one long-lived [`Admission`] context per registry source,
/// constructed once at startup.
pub struct PageFetcher {
    transport: Arc<dyn Transport>,
    admissions: HashMap<String, Admission>,
    options: FetchOptions,
}

impl PageFetcher {
    pub fn new(
        registry: &SourceRegistry,
        transport: Arc<dyn Transport>,
        options: FetchOptions,
    ) -> Self {
        let admissions = registry
            .iter()
            .map(|source| (source.name().to_string(), Admission::new(&source.meta())))
            .collect();
        Self {
            transport,
            admissions,
            options,
        }
    }

    /// Retrieve every available page of `tag` from `source`.
    ///
    /// Never fails; a fully unreachable source yields an empty list.
    pub async fn fetch_all(&self, source: &dyn SourceAdapter, tag: &str) -> Vec<ImageRecord> {
        let Some(admission) = self.admissions.get(source.name()) else {
            warn!(source = source.name(), "no admission context, skipping source");
            return Vec::new();
        };

        let last_page = source
            .meta()
            .max_pages
            .min(self.options.global_page_cap)
            .max(1);

        let images = match self.options.policy {
            SweepPolicy::Fixed => self.fixed_sweep(source, admission, tag, last_page).await,
            SweepPolicy::Adaptive {
                wave_size,
                max_empty_waves,
            } => {
                self.adaptive_sweep(source, admission, tag, last_page, wave_size, max_empty_waves)
                    .await
            }
        };

        metrics::SOURCE_IMAGES
            .with_label_values(&[source.name()])
            .observe(images.len() as f64);
        debug!(
            source = source.name(),
            tag,
            images = images.len(),
            "sweep complete"
        );
        images
    }

    async fn fixed_sweep(
        &self,
        source: &dyn SourceAdapter,
        admission: &Admission,
        tag: &str,
        last_page: u32,
    ) -> Vec<ImageRecord> {
        let pages =
            join_all((1..=last_page).map(|page| self.fetch_page(source, admission, tag, page)))
                .await;
        collect_pages(source.name(), pages)
    }

    async fn adaptive_sweep(
        &self,
        source: &dyn SourceAdapter,
        admission: &Admission,
        tag: &str,
        last_page: u32,
        wave_size: u32,
        max_empty_waves: u32,
    ) -> Vec<ImageRecord> {
        let wave_size = wave_size.max(1);
        let max_empty_waves = max_empty_waves.max(1);

        let mut images = Vec::new();
        let mut next_page = 1u32;
        let mut empty_waves = 0u32;

        while next_page <= last_page && empty_waves < max_empty_waves {
            let wave_end = last_page.min(next_page + wave_size - 1);
            let pages = join_all(
                (next_page..=wave_end).map(|page| self.fetch_page(source, admission, tag, page)),
            )
            .await;
            let wave = collect_pages(source.name(), pages);

            if wave.is_empty() {
                empty_waves += 1;
            } else {
                empty_waves = 0;
                images.extend(wave);
            }
            next_page = wave_end + 1;
        }

        images
    }

    /// Fetch and parse a single page. Admission is acquired before the
    /// request URL is even built, so queued pages hold no resources.
    async fn fetch_page(
        &self,
        source: &dyn SourceAdapter,
        admission: &Admission,
        tag: &str,
        page: u32,
    ) -> (u32, Result<Vec<ImageRecord>, Absorbed>) {
        let _permit = admission.admit().await;

        let url = source.build_query_url(tag, page, self.options.page_size);
        let result = match self.transport.get_text(&url, self.options.page_timeout).await {
            Ok(raw) => source.parse_response(&raw),
            Err(absorbed) => Err(absorbed),
        };
        (page, result)
    }
}

/// Flatten per-page results, mapping every absorbed page to an empty
/// contribution.
fn collect_pages(
    source: &str,
    pages: Vec<(u32, Result<Vec<ImageRecord>, Absorbed>)>,
) -> Vec<ImageRecord> {
    let mut images = Vec::new();
    for (page, result) in pages {
        match result {
            Ok(mut page_images) => {
                metrics::SOURCE_PAGE_REQUESTS
                    .with_label_values(&[source, "ok"])
                    .inc();
                images.append(&mut page_images);
            }
            Err(absorbed) => {
                debug!(source, page, %absorbed, "page absorbed");
                metrics::SOURCE_PAGE_REQUESTS
                    .with_label_values(&[source, "absorbed"])
                    .inc();
            }
        }
    }
    images
}
