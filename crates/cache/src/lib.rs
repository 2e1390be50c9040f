//! # Manhwa Catalogue Cache
//!
//! The three bounded TTL maps (Entity, Search, Tag) and the request
//! coalescer that sit in front of the Store and Upstream client.

pub mod coalescer;
pub mod tiered;

pub use coalescer::Coalescer;
pub use tiered::{CacheStats, TieredCache};

use manhwa_core::models::manhwa::Manhwa;
use manhwa_core::models::search::SearchResponse;
use manhwa_core::models::tag::Tag;
use std::time::Duration;

/// §4.2 defaults.
pub const DEFAULT_ENTITY_TTL: Duration = Duration::from_secs(3600);
pub const DEFAULT_SEARCH_TTL: Duration = Duration::from_secs(300);
pub const DEFAULT_TAG_TTL: Duration = Duration::from_secs(86_400);

/// The three independent tiers named in §4.2, constructed once at startup
/// and shared across the service (§5: "Cache instances ... shared").
pub struct ManhwaCache {
    pub entity: TieredCache<Manhwa>,
    pub search: TieredCache<SearchResponse>,
    pub tag: TieredCache<Vec<Tag>>,
}

impl ManhwaCache {
    pub fn new(max_keys: u64, entity_ttl: Duration, search_ttl: Duration) -> Self {
        ManhwaCache {
            entity: TieredCache::new("entity", max_keys, entity_ttl),
            search: TieredCache::new("search", max_keys, search_ttl),
            tag: TieredCache::new("tag", max_keys, DEFAULT_TAG_TTL),
        }
    }

    /// §4.2 invalidation rule: after `Create`/`SyncOne`, delete every
    /// search-cache key by the `"search:"` substring.
    pub async fn invalidate_all_searches(&self) -> u64 {
        self.search.delete_matching("search:").await
    }

    pub async fn invalidate_entity(&self, id: i64) {
        self.entity.invalidate(&Manhwa::entity_cache_key(id)).await;
    }
}

impl Default for ManhwaCache {
    fn default() -> Self {
        ManhwaCache::new(1000, DEFAULT_ENTITY_TTL, DEFAULT_SEARCH_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manhwa_core::models::manhwa::{CoverUrls, TitleData};
    use manhwa_core::{DataSource, ManhwaStatus, SyncStatus};

    fn sample_row(id: i64) -> Manhwa {
        let now = chrono::Utc::now();
        Manhwa {
            id,
            upstream_id: None,
            data_source: DataSource::Local,
            title_data: TitleData::new("Title"),
            synopsis: "A synopsis long enough to pass validation.".into(),
            status: ManhwaStatus::Ongoing,
            publisher: None,
            start_year: None,
            end_year: None,
            total_chapters: None,
            special_chapters: None,
            covers: CoverUrls::default(),
            created_at: now,
            updated_at: now,
            last_synced_at: None,
            sync_status: SyncStatus::Current,
            version: 1,
            genres: Vec::new(),
        }
    }

    #[tokio::test]
    async fn entity_round_trips_through_cache() {
        let cache = ManhwaCache::default();
        let row = sample_row(1);
        cache.entity.set(Manhwa::entity_cache_key(1), row.clone(), None).await;

        let hit = cache.entity.get(&Manhwa::entity_cache_key(1)).await;
        assert_eq!(hit.unwrap().id, row.id);
    }

    #[tokio::test]
    async fn invalidate_entity_removes_only_that_key() {
        let cache = ManhwaCache::default();
        cache.entity.set(Manhwa::entity_cache_key(1), sample_row(1), None).await;
        cache.entity.set(Manhwa::entity_cache_key(2), sample_row(2), None).await;

        cache.invalidate_entity(1).await;

        assert!(cache.entity.get(&Manhwa::entity_cache_key(1)).await.is_none());
        assert!(cache.entity.get(&Manhwa::entity_cache_key(2)).await.is_some());
    }

    #[tokio::test]
    async fn invalidate_all_searches_clears_every_search_key() {
        let cache = ManhwaCache::default();
        let response = SearchResponse {
            results: vec![],
            pagination: manhwa_core::models::search::PaginationMeta {
                current_page: 1,
                total_pages: 0,
                total_results: 0,
            },
            metadata: manhwa_core::models::search::SearchMetadata {
                sources_queried: vec!["local".into()],
                query_time_ms: 1,
            },
        };
        cache.search.set("search:q=a", response.clone(), None).await;
        cache.search.set("search:q=b", response, None).await;

        let removed = cache.invalidate_all_searches().await;
        assert_eq!(removed, 2);
        assert_eq!(cache.search.stats().await.key_count, 0);
    }
}
