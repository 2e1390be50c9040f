//! A single bounded TTL map, the unit the three tiers in [`crate::ManhwaCache`]
//! are built from.
//!
//! §4.2: "`Get`/`Set` errors are swallowed" — there is no fallible path here
//! by construction: a miss and a swallowed error are the same observable
//! outcome, so `get` simply returns `Option<V>`.

use moka::future::Cache as MokaCache;
use moka::Expiry;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

#[derive(Clone)]
struct Entry<V> {
    value: V,
    ttl: Duration,
}

struct PerEntryExpiry;

impl<V: Clone + Send + Sync + 'static> Expiry<String, Entry<V>> for PerEntryExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Entry<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub key_count: u64,
}

/// One of Entity / Search / Tag. `V` is the opaque value type; per §4.2 "no
/// defensive cloning is performed", callers must treat returned values as
/// read-only.
pub struct TieredCache<V: Clone + Send + Sync + 'static> {
    name: &'static str,
    inner: MokaCache<String, Entry<V>>,
    default_ttl: Duration,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<V: Clone + Send + Sync + 'static> TieredCache<V> {
    pub fn new(name: &'static str, max_capacity: u64, default_ttl: Duration) -> Self {
        let inner = MokaCache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryExpiry)
            .build();
        TieredCache {
            name,
            inner,
            default_ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub async fn get(&self, key: &str) -> Option<V> {
        match self.inner.get(key).await {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// `ttl` overrides the tier default for this entry only.
    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl);
        self.inner.insert(key.into(), Entry { value, ttl }).await;
    }

    pub async fn invalidate(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    /// §4.2: "removes every key whose identifier contains the substring".
    /// Returns the number of keys removed.
    pub async fn delete_matching(&self, substring: &str) -> u64 {
        let matching: Vec<String> = self
            .inner
            .iter()
            .map(|(k, _)| (*k).clone())
            .filter(|k| k.contains(substring))
            .collect();
        let count = matching.len() as u64;
        for key in matching {
            self.inner.invalidate(&key).await;
        }
        tracing::debug!(tier = self.name, substring, count, "cache delete_matching");
        count
    }

    /// `moka` applies evictions and size-aware housekeeping on a background
    /// schedule; `run_pending_tasks` forces it so `key_count` is accurate
    /// for callers (e.g. `GET /cache/status`) immediately after a write.
    pub async fn stats(&self) -> CacheStats {
        self.inner.run_pending_tasks().await;
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            key_count: self.inner.entry_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn miss_on_empty_cache_counts_as_miss() {
        let cache: TieredCache<String> = TieredCache::new("test", 100, Duration::from_secs(60));
        assert_eq!(cache.get("absent").await, None);
        assert_eq!(cache.stats().await.misses, 1);
    }

    #[tokio::test]
    async fn set_then_get_is_a_hit() {
        let cache: TieredCache<String> = TieredCache::new("test", 100, Duration::from_secs(60));
        cache.set("k", "v".to_string(), None).await;
        assert_eq!(cache.get("k").await, Some("v".to_string()));
        assert_eq!(cache.stats().await.hits, 1);
    }

    #[tokio::test]
    async fn delete_matching_removes_only_matching_keys() {
        let cache: TieredCache<u32> = TieredCache::new("test", 100, Duration::from_secs(60));
        cache.set("search:a", 1, None).await;
        cache.set("search:b", 2, None).await;
        cache.set("manhwa:entity:1", 3, None).await;

        let removed = cache.delete_matching("search:").await;
        assert_eq!(removed, 2);
        assert!(cache.get("manhwa:entity:1").await.is_some());
    }

    #[tokio::test]
    async fn per_entry_ttl_overrides_default() {
        let cache: TieredCache<u32> = TieredCache::new("test", 100, Duration::from_secs(3600));
        cache.set("short-lived", 1, Some(Duration::from_millis(10))).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(cache.get("short-lived").await, None);
    }
}
