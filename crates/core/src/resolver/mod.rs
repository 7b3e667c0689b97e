//! Tag resolution engine.
//!
//! Booru sites disagree on what the "same" character is called, so before
//! any images are fetched each source's tag index is probed with a set of
//! normalized name variations. Hits are merged, scored against the
//! requested character and series, and the best candidate per source wins.
//! Resolution is best-effort: any probe failure is absorbed and at worst a
//! source falls back to the normalized character name.

mod normalize;
mod score;

pub use normalize::{
    cache_key, generate_variations, normalize, series_suffix, similarity, strip_series_suffix,
};
pub use score::{score_tag, TagCandidate};

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::QueryCache;
use crate::metrics;
use crate::source::{tag_aliases, SourceAdapter, SourceRegistry};
use crate::transport::Transport;

/// One chosen search tag per known source identifier.
///
/// Built once per `(character, series)` pair per tag-cache TTL window and
/// immutable afterwards. Aliased identifiers carry a copy of their primary
/// source's tag.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedTagSet(pub HashMap<String, String>);

impl ResolvedTagSet {
    pub fn tag_for(&self, source: &str) -> Option<&str> {
        self.0.get(source).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Resolves character/series names into per-source search tags.
pub struct TagResolver {
    registry: Arc<SourceRegistry>,
    transport: Arc<dyn Transport>,
    cache: Arc<QueryCache>,
    probe_timeout: Duration,
}

impl TagResolver {
    pub fn new(
        registry: Arc<SourceRegistry>,
        transport: Arc<dyn Transport>,
        cache: Arc<QueryCache>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            transport,
            cache,
            probe_timeout,
        }
    }

    /// Resolve the best search tag for every known source.
    ///
    /// Never fails: probe errors are absorbed per variation, and a source
    /// with no candidate scoring above zero falls back to the normalized
    /// character name.
    pub async fn resolve(&self, character: &str, series: Option<&str>) -> ResolvedTagSet {
        let key = cache_key(character, series);
        if let Some(cached) = self.cache.get_tags(&key).await {
            return cached;
        }

        let variations = generate_variations(character, series);
        debug!(character, ?series, ?variations, "probing tag variations");

        let probes = self.registry.iter().map(|source| {
            let variations = &variations;
            async move {
                (
                    source.name().to_string(),
                    self.resolve_source(source.as_ref(), variations, character, series)
                        .await,
                )
            }
        });
        let chosen = futures::future::join_all(probes).await;

        let fallback = normalize(character);
        let mut tags: HashMap<String, String> = HashMap::new();
        for (name, tag) in chosen {
            if let Some(tag) = tag {
                tags.insert(name, tag);
            }
        }

        // Aliased identifiers copy their primary's resolution.
        for (alias, primary) in tag_aliases() {
            if let Some(tag) = tags.get(*primary).cloned() {
                tags.insert((*alias).to_string(), tag);
            }
        }

        // Every known source identifier gets an entry.
        for source in self.registry.iter() {
            tags.entry(source.name().to_string())
                .or_insert_with(|| fallback.clone());
        }
        for (alias, _) in tag_aliases() {
            tags.entry((*alias).to_string())
                .or_insert_with(|| fallback.clone());
        }

        let set = ResolvedTagSet(tags);
        info!(character, ?series, tags = ?set.0, "tag resolution complete");
        self.cache.set_tags(&key, set.clone()).await;
        set
    }

    /// Probe one source with every variation, merge the hits and pick the
    /// highest-scoring candidate. `None` means the caller should fall back.
    ///
    /// Variations are probed sequentially; the sets are small enough that
    /// racing them buys nothing and only hammers the tag index.
    async fn resolve_source(
        &self,
        source: &dyn SourceAdapter,
        variations: &[String],
        character: &str,
        series: Option<&str>,
    ) -> Option<String> {
        // First-seen order is the tie-break for equal scores, so hits are
        // kept in insertion order while collisions keep the higher count.
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, u64> = HashMap::new();

        for variation in variations {
            let url = source.build_tag_search_url(variation)?;
            let hits = match self.transport.get_text(&url, self.probe_timeout).await {
                Ok(raw) => match source.parse_tag_search_response(&raw) {
                    Ok(hits) => hits,
                    Err(absorbed) => {
                        debug!(source = source.name(), %variation, %absorbed, "tag probe absorbed");
                        metrics::TAG_PROBES
                            .with_label_values(&[source.name(), "absorbed"])
                            .inc();
                        continue;
                    }
                },
                Err(absorbed) => {
                    debug!(source = source.name(), %variation, %absorbed, "tag probe absorbed");
                    metrics::TAG_PROBES
                        .with_label_values(&[source.name(), "absorbed"])
                        .inc();
                    continue;
                }
            };
            metrics::TAG_PROBES
                .with_label_values(&[source.name(), "ok"])
                .inc();

            for hit in hits {
                match counts.entry(hit.name.clone()) {
                    Entry::Occupied(mut entry) => {
                        if *entry.get() < hit.post_count {
                            entry.insert(hit.post_count);
                        }
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(hit.post_count);
                        order.push(hit.name);
                    }
                }
            }
        }

        let mut best: Option<TagCandidate> = None;
        for name in &order {
            let post_count = counts[name];
            let score = score_tag(name, character, series, post_count);
            if score > 0 && best.as_ref().is_none_or(|b| score > b.score) {
                best = Some(TagCandidate {
                    name: name.clone(),
                    post_count,
                    score,
                });
            }
        }

        match best {
            Some(candidate) => {
                debug!(
                    source = source.name(),
                    tag = %candidate.name,
                    score = candidate.score,
                    post_count = candidate.post_count,
                    "tag resolved"
                );
                metrics::TAG_RESOLUTIONS
                    .with_label_values(&[source.name(), "scored"])
                    .inc();
                Some(candidate.name)
            }
            None => {
                debug!(source = source.name(), "no candidate scored, falling back");
                metrics::TAG_RESOLUTIONS
                    .with_label_values(&[source.name(), "fallback"])
                    .inc();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolved_tag_set_lookup() {
        let mut map = HashMap::new();
        map.insert("safebooru".to_string(), "anya_(spy_x_family)".to_string());
        let set = ResolvedTagSet(map);

        assert_eq!(set.tag_for("safebooru"), Some("anya_(spy_x_family)"));
        assert_eq!(set.tag_for("danbooru"), None);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_resolved_tag_set_serde_is_transparent() {
        let mut map = HashMap::new();
        map.insert("safebooru".to_string(), "anya".to_string());
        let set = ResolvedTagSet(map);

        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"safebooru":"anya"}"#);

        let back: ResolvedTagSet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, set);
    }
}
