//! Query orchestration: cache lookup, tag resolution, fan-out, aggregation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, info};

use crate::aggregate::{aggregate, paginate, PaginatedResult};
use crate::cache::QueryCache;
use crate::fetcher::{FetchOptions, PageFetcher};
use crate::metrics;
use crate::resolver::{cache_key, normalize, ResolvedTagSet, TagResolver};
use crate::source::SourceRegistry;
use crate::transport::Transport;

/// Errors surfaced to the caller. Everything network-related is absorbed
/// long before this level; only input validation can reject a query.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("character name must not be empty")]
    EmptyCharacter,
}

/// Entry point tying the resolver, the fetch scheduler and the cache
/// together.
pub struct QueryOrchestrator {
    registry: Arc<SourceRegistry>,
    resolver: TagResolver,
    fetcher: PageFetcher,
    cache: Arc<QueryCache>,
}

impl QueryOrchestrator {
    pub fn new(
        registry: Arc<SourceRegistry>,
        transport: Arc<dyn Transport>,
        cache: Arc<QueryCache>,
        fetch_options: FetchOptions,
        probe_timeout: Duration,
    ) -> Self {
        let resolver = TagResolver::new(
            Arc::clone(&registry),
            Arc::clone(&transport),
            Arc::clone(&cache),
            probe_timeout,
        );
        let fetcher = PageFetcher::new(&registry, transport, fetch_options);
        Self {
            registry,
            resolver,
            fetcher,
            cache,
        }
    }

    /// Run a full search and return one page of the combined result.
    ///
    /// On a cache hit the network is never touched. On a miss every source
    /// is swept in parallel; per-source failures have already been absorbed
    /// below this level, so the fan-out itself cannot fail. A query with
    /// zero reachable sources returns a well-formed empty result.
    pub async fn search(
        &self,
        character: &str,
        series: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<PaginatedResult, SearchError> {
        let character = character.trim();
        if character.is_empty() {
            return Err(SearchError::EmptyCharacter);
        }

        let key = cache_key(character, series);
        if let Some(cached) = self.cache.get_images(&key).await {
            debug!(character, "serving search from cache");
            metrics::SEARCHES_TOTAL.with_label_values(&["hit"]).inc();
            return Ok(paginate(&cached, page, page_size, true));
        }
        metrics::SEARCHES_TOTAL.with_label_values(&["miss"]).inc();

        let start = Instant::now();
        let tags = self.resolver.resolve(character, series).await;
        let fallback = normalize(character);

        let sweeps = self.registry.iter().map(|source| {
            let tag = tags.tag_for(source.name()).unwrap_or(&fallback);
            async move {
                (
                    source.name().to_string(),
                    self.fetcher.fetch_all(source.as_ref(), tag).await,
                )
            }
        });
        let per_source = futures::future::join_all(sweeps).await;

        let set = aggregate(per_source);
        let elapsed = start.elapsed();
        metrics::SEARCH_DURATION.observe(elapsed.as_secs_f64());
        info!(
            character,
            ?series,
            images = set.images.len(),
            source_counts = ?set.source_counts,
            elapsed_ms = elapsed.as_millis() as u64,
            "search complete"
        );

        self.cache.set_images(&key, set.clone()).await;
        Ok(paginate(&set, page, page_size, false))
    }

    /// Resolve per-source tags without fetching any images.
    pub async fn discover_tags(
        &self,
        character: &str,
        series: Option<&str>,
    ) -> Result<ResolvedTagSet, SearchError> {
        let character = character.trim();
        if character.is_empty() {
            return Err(SearchError::EmptyCharacter);
        }
        Ok(self.resolver.resolve(character, series).await)
    }

    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.cache
    }

    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }
}
