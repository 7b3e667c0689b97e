//! TTL + capacity-bounded result caches.
//!
//! Two independent keyed stores: image search results and resolved tag
//! sets. Capacity eviction comes from the LRU policy of the underlying
//! `lru` crate; TTL expiry is checked on read and an expired entry counts
//! as a miss. Callers treat absence uniformly whether it came from a miss,
//! expiry or eviction.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lru::LruCache;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::aggregate::SearchResultSet;
use crate::resolver::ResolvedTagSet;

/// Capacity and TTL settings for both stores.
#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub image_capacity: usize,
    pub image_ttl: Duration,
    pub tag_capacity: usize,
    pub tag_ttl: Duration,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            image_capacity: 500,
            image_ttl: Duration::from_secs(2 * 60 * 60),
            tag_capacity: 1000,
            tag_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

/// One keyed LRU store with TTL expiry and hit/miss counters.
struct Store<V> {
    entries: Mutex<LruCache<String, Entry<V>>>,
    ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone> Store<V> {
    fn new(capacity: usize, ttl: Duration) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    async fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.lock().await;
        let expired = match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    async fn set(&self, key: &str, value: V) {
        let entry = Entry {
            value,
            expires_at: Instant::now() + self.ttl,
        };
        self.entries.lock().await.put(key.to_string(), entry);
    }

    /// Presence check without touching the hit/miss counters or LRU order.
    async fn has(&self, key: &str) -> bool {
        self.entries
            .lock()
            .await
            .peek(key)
            .is_some_and(|e| e.expires_at > Instant::now())
    }

    async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    async fn clear(&self) {
        self.entries.lock().await.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
    }

    fn stats(&self, size: usize) -> StoreStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        StoreStats {
            size,
            hits,
            misses,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
        }
    }
}

/// Counters for one store.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StoreStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
}

/// Counters for both stores.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CacheStats {
    pub images: StoreStats,
    pub tags: StoreStats,
}

/// The shared query cache: image results and resolved tag sets.
///
/// The only state shared across concurrent queries; all mutation goes
/// through atomic get/set-by-key operations.
pub struct QueryCache {
    images: Store<SearchResultSet>,
    tags: Store<ResolvedTagSet>,
}

impl QueryCache {
    pub fn new(options: CacheOptions) -> Self {
        Self {
            images: Store::new(options.image_capacity, options.image_ttl),
            tags: Store::new(options.tag_capacity, options.tag_ttl),
        }
    }

    pub async fn get_images(&self, key: &str) -> Option<SearchResultSet> {
        self.images.get(key).await
    }

    pub async fn set_images(&self, key: &str, value: SearchResultSet) {
        self.images.set(key, value).await;
    }

    pub async fn has_images(&self, key: &str) -> bool {
        self.images.has(key).await
    }

    pub async fn get_tags(&self, key: &str) -> Option<ResolvedTagSet> {
        self.tags.get(key).await
    }

    pub async fn set_tags(&self, key: &str, value: ResolvedTagSet) {
        self.tags.set(key, value).await;
    }

    pub async fn has_tags(&self, key: &str) -> bool {
        self.tags.has(key).await
    }

    pub async fn stats(&self) -> CacheStats {
        CacheStats {
            images: self.images.stats(self.images.len().await),
            tags: self.tags.stats(self.tags.len().await),
        }
    }

    pub async fn clear(&self) {
        self.images.clear().await;
        self.tags.clear().await;
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}
