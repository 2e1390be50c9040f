//! The `Store` port (C1). §9 design note: "Persistence is treated as an
//! abstract Store with the operations the core needs" — everything below is
//! that abstraction; `PgStore` and `FakeStore` are its two implementations.

use crate::error::StoreError;
use async_trait::async_trait;
use manhwa_core::models::genre::Genre;
use manhwa_core::models::manhwa::{CoverUrls, Manhwa, TitleData};
use manhwa_core::{DataSource, ManhwaStatus, SyncStatus};
use manhwa_core::models::search::SearchFilters;
use chrono::{DateTime, Utc};

/// Payload for `Insert`. `id`, `created_at`, `updated_at`, and `version` are
/// Store-assigned.
#[derive(Debug, Clone)]
pub struct NewManhwa {
    pub upstream_id: Option<String>,
    pub data_source: DataSource,
    pub title_data: TitleData,
    pub synopsis: String,
    pub status: ManhwaStatus,
    pub publisher: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub total_chapters: Option<i32>,
    pub special_chapters: Option<i32>,
    pub covers: CoverUrls,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub sync_status: SyncStatus,
    pub genre_ids: Vec<i64>,
}

/// Partial update for `Update(id, patch)`. `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct ManhwaPatch {
    pub title_data: Option<TitleData>,
    pub synopsis: Option<String>,
    pub status: Option<ManhwaStatus>,
    pub publisher: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub total_chapters: Option<i32>,
    pub special_chapters: Option<i32>,
    pub covers: Option<CoverUrls>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub sync_status: Option<SyncStatus>,
    pub bump_version: bool,
}

/// A row returned from full-text or filter search, carrying the optional
/// relevance rank described in §4.1 ("each result row includes its rank as
/// `score`").
#[derive(Debug, Clone)]
pub struct SearchRow {
    pub manhwa: Manhwa,
    pub score: Option<f64>,
}

/// A row due for background re-synchronisation (§4.7 `QueueOutdated`).
#[derive(Debug, Clone)]
pub struct OutdatedRow {
    pub id: i64,
    pub upstream_id: String,
    pub was_failed: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Manhwa>, StoreError>;
    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Manhwa>, StoreError>;
    async fn find_by_upstream_id(&self, upstream_id: &str) -> Result<Option<Manhwa>, StoreError>;
    async fn insert(&self, row: NewManhwa) -> Result<i64, StoreError>;
    async fn update(&self, id: i64, patch: ManhwaPatch) -> Result<(), StoreError>;
    async fn mark_sync_failed(&self, id: i64) -> Result<(), StoreError>;

    async fn full_text_search(
        &self,
        query: &str,
        filters: &SearchFilters,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<SearchRow>, u64), StoreError>;

    async fn filter_search(
        &self,
        filters: &SearchFilters,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<SearchRow>, u64), StoreError>;

    async fn list_genres_by_slug(&self, slugs: &[String]) -> Result<Vec<Genre>, StoreError>;
    async fn list_all_genres(&self) -> Result<Vec<Genre>, StoreError>;

    /// §4.5 `RecentlyAdded`: rows ordered by `createdAt` descending.
    async fn list_recently_added(&self, limit: u32) -> Result<Vec<Manhwa>, StoreError>;

    /// Backs §4.7 `QueueOutdated`: up to `limit` Upstream-sourced rows never
    /// synced, synced more than 24h ago, or whose `syncStatus = Failed`,
    /// ordered Failed-first then oldest `lastSyncedAt` first.
    async fn find_outdated(&self, limit: i64) -> Result<Vec<OutdatedRow>, StoreError>;
}
