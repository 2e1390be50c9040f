//! The CatalogueService (C6): the public read/write facade described in
//! §4.6. It orchestrates the Cache (C2), Coalescer (C3), SearchEngine (C5),
//! Store (C1), and UpstreamClient (C4), and drives background refreshes
//! through the Syncer (C7) it owns.

pub mod error;
pub mod syncer;

pub use error::CatalogueError;
pub use syncer::{QueueItemStatus, SyncOutcome, SyncOutcomeStatus, SyncTarget, Syncer, SyncerStatus, DEFAULT_SYNC_BATCH_SIZE};

use async_trait::async_trait;
use chrono::Utc;
use manhwa_cache::{Coalescer, ManhwaCache};
use manhwa_core::models::genre::Genre;
use manhwa_core::models::manhwa::{CoverUrls, Manhwa, TitleData};
use manhwa_core::models::search::{
    truncate_synopsis, ManhwaSearchResult, PaginationMeta, SearchMetadata, SearchParams, SearchResponse,
};
use manhwa_core::models::tag::Tag;
use manhwa_core::sanitization::sanitize_search_query;
use manhwa_core::validation;
use manhwa_core::{DataSource, ManhwaStatus, SyncStatus};
use manhwa_search::SearchEngine;
use manhwa_store::{ManhwaPatch, NewManhwa, Store};
use manhwa_upstream::{UpstreamClient, UpstreamSearchParams};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// §4.6: "Resolve genre slugs to upstream tag UUIDs via Tag cache", keyed
/// by this single well-known entry — the Upstream tag dictionary has no
/// per-request variation, so it is one cache row rather than one per query.
const TAG_DICTIONARY_KEY: &str = "tags:dictionary";

/// §6 `POST /` body, reduced to the fields `Create` folds into a row.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateManhwaDto {
    pub title_data: TitleData,
    pub synopsis: String,
    pub status: ManhwaStatus,
    pub publisher: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub total_chapters: Option<i32>,
    pub special_chapters: Option<i32>,
    pub genre_slugs: Vec<String>,
}

/// §4.6 `SyncOne` return shape.
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub status: SyncReportStatus,
    pub message: String,
    pub last_synced_at: Option<chrono::DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncReportStatus {
    Success,
    Failed,
}

/// §6 `POST /bulk` response shape.
#[derive(Debug, Clone, Default)]
pub struct BulkGetResult {
    pub entities: HashMap<i64, Manhwa>,
    pub not_found: Vec<i64>,
}

pub struct CatalogueService {
    store: Arc<dyn Store>,
    cache: Arc<ManhwaCache>,
    search_coalescer: Coalescer<SearchResponse, CatalogueError>,
    search_engine: Arc<SearchEngine>,
    upstream: Arc<UpstreamClient>,
    syncer: Arc<Syncer>,
}

impl CatalogueService {
    /// Two-phase wiring with the `Syncer`: the service needs its own `Arc`
    /// before it can hand itself to `syncer.attach_target` as the
    /// production `SyncTarget` (§4.7 `ProcessQueue` calls back into
    /// `SyncOne`).
    pub fn new(
        store: Arc<dyn Store>,
        cache: Arc<ManhwaCache>,
        search_engine: Arc<SearchEngine>,
        upstream: Arc<UpstreamClient>,
        syncer: Arc<Syncer>,
    ) -> Arc<Self> {
        let service = Arc::new(CatalogueService {
            store,
            cache,
            search_coalescer: Coalescer::new(),
            search_engine,
            upstream,
            syncer: syncer.clone(),
        });
        let target: Arc<dyn SyncTarget> = service.clone();
        syncer.attach_target(target);
        service
    }

    /// §4.6 `Search`.
    pub async fn search(&self, params: SearchParams) -> Result<SearchResponse, CatalogueError> {
        let key = params.cache_key();
        if let Some(cached) = self.cache.search.get(&key).await {
            return Ok(cached);
        }

        let response = self.search_coalescer.coalesce(&key, || self.run_search(params)).await?;
        self.cache.search.set(key, response.clone(), None).await;
        Ok(response)
    }

    async fn run_search(&self, params: SearchParams) -> Result<SearchResponse, CatalogueError> {
        let started = Instant::now();
        let mut response = self.search_engine.full_text_search(&params, started).await?;

        if response.results.is_empty() && params.include_external {
            match self.external_search(&params).await {
                Ok(results) => {
                    let total = results.len() as u64;
                    response = SearchResponse {
                        results,
                        pagination: PaginationMeta {
                            current_page: params.pagination.page,
                            total_pages: 1,
                            total_results: total,
                        },
                        metadata: SearchMetadata {
                            sources_queried: vec!["local".to_string(), "external".to_string()],
                            query_time_ms: 0,
                        },
                    };
                }
                Err(err) => {
                    tracing::warn!(error = %err, "external search fallback failed, serving empty local result");
                    response.metadata.sources_queried.push("external (failed)".to_string());
                }
            }
        }

        response.metadata.query_time_ms = started.elapsed().as_millis() as u64;
        Ok(response)
    }

    /// §4.6 `Search` step "resolve genre slugs ... call UpstreamClient.Search
    /// ... transform each record".
    async fn external_search(&self, params: &SearchParams) -> Result<Vec<ManhwaSearchResult>, CatalogueError> {
        let tags = self.tag_dictionary().await;
        let included_tags: Vec<String> = params
            .filters
            .genres
            .iter()
            .filter_map(|slug| {
                let needle = slug.replace('-', " ").to_lowercase();
                tags.iter().find(|t| t.name.to_lowercase() == needle).map(|t| t.id.clone())
            })
            .collect();

        let status = params.filters.status.iter().map(|s| s.as_lower_str().to_string()).collect();
        let upstream_params = UpstreamSearchParams {
            title: sanitize_search_query(&params.query),
            limit: params.pagination.limit.min(100),
            offset: (params.pagination.page.saturating_sub(1)) * params.pagination.limit,
            status,
            included_tags,
            ..Default::default()
        };

        let (records, _total) = self.upstream.search(&upstream_params).await?;
        Ok(records
            .iter()
            .map(|record| {
                let partial = self.upstream.transform(record);
                ManhwaSearchResult {
                    id: 0,
                    title: partial.title_data.primary,
                    cover_thumb: partial.covers.thumb,
                    synopsis: truncate_synopsis(&partial.synopsis),
                    status: partial.status.as_lower_str().to_string(),
                    total_chapters: partial.total_chapters,
                    genres: manhwa_upstream::genre_names(record),
                    score: None,
                }
            })
            .collect())
    }

    /// The Upstream tag dictionary, cached in the Tag tier on first use.
    async fn tag_dictionary(&self) -> Vec<Tag> {
        if let Some(cached) = self.cache.tag.get(TAG_DICTIONARY_KEY).await {
            return cached;
        }
        let tags = self.upstream.list_tags().await;
        self.cache.tag.set(TAG_DICTIONARY_KEY, tags.clone(), None).await;
        tags
    }

    /// §4.6 `GetByID`.
    pub async fn get_by_id(&self, id: i64, force_refresh: bool) -> Result<Manhwa, CatalogueError> {
        let key = Manhwa::entity_cache_key(id);

        if !force_refresh {
            if let Some(cached) = self.cache.entity.get(&key).await {
                if cached.should_refresh(Utc::now()) {
                    if let Some(upstream_id) = cached.upstream_id.clone() {
                        self.syncer.sync_now(id, upstream_id);
                    }
                }
                return Ok(cached);
            }
        }

        let mut row = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogueError::NotFound(format!("manhwa {id} not found")))?;

        if force_refresh || row.should_refresh(Utc::now()) {
            if let Some(upstream_id) = row.upstream_id.clone() {
                match self.sync_one(id, &upstream_id).await {
                    Ok(_) => {
                        row = self
                            .store
                            .find_by_id(id)
                            .await?
                            .ok_or_else(|| CatalogueError::NotFound(format!("manhwa {id} not found")))?;
                    }
                    Err(err) => {
                        tracing::warn!(id, error = %err, "foreground sync failed, serving stale row");
                    }
                }
            }
        }

        self.cache.entity.set(key, row.clone(), None).await;
        Ok(row)
    }

    /// §4.6 `BulkGet`.
    pub async fn bulk_get(&self, ids: &[i64]) -> Result<BulkGetResult, CatalogueError> {
        let mut entities = HashMap::new();
        let mut misses = Vec::new();

        for &id in ids {
            match self.cache.entity.get(&Manhwa::entity_cache_key(id)).await {
                Some(row) => {
                    entities.insert(id, row);
                }
                None => misses.push(id),
            }
        }

        if !misses.is_empty() {
            let rows = self.store.find_by_ids(&misses).await?;
            for row in rows {
                self.cache.entity.set(Manhwa::entity_cache_key(row.id), row.clone(), None).await;
                entities.insert(row.id, row);
            }
        }

        let not_found = ids.iter().copied().filter(|id| !entities.contains_key(id)).collect();
        Ok(BulkGetResult { entities, not_found })
    }

    /// §4.6 `Create`.
    pub async fn create(&self, dto: CreateManhwaDto) -> Result<Manhwa, CatalogueError> {
        let synopsis = manhwa_core::sanitization::sanitize_text(&dto.synopsis);
        validation::validate_synopsis(&synopsis)?;
        validation::validate_year_range(dto.start_year, dto.end_year)?;

        let genres = if dto.genre_slugs.is_empty() {
            Vec::new()
        } else {
            self.store.list_genres_by_slug(&dto.genre_slugs).await?
        };
        if genres.len() != dto.genre_slugs.len() {
            let found: std::collections::HashSet<&str> = genres.iter().map(|g| g.slug.as_str()).collect();
            let unknown: Vec<&String> = dto.genre_slugs.iter().filter(|s| !found.contains(s.as_str())).collect();
            return Err(CatalogueError::BadInput(format!("unknown genre slug(s): {unknown:?}")));
        }

        let new_row = NewManhwa {
            upstream_id: None,
            data_source: DataSource::Local,
            title_data: dto.title_data,
            synopsis,
            status: dto.status,
            publisher: dto.publisher,
            start_year: dto.start_year,
            end_year: dto.end_year,
            total_chapters: dto.total_chapters,
            special_chapters: dto.special_chapters,
            covers: CoverUrls::default(),
            last_synced_at: None,
            sync_status: SyncStatus::Current,
            genre_ids: genres.iter().map(|g| g.id).collect(),
        };

        let id = self.store.insert(new_row).await?;
        let row = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogueError::Transient("row vanished immediately after insert".into()))?;

        self.cache.invalidate_all_searches().await;
        Ok(row)
    }

    /// §4.6 `Import`.
    pub async fn import(&self, upstream_id: &str) -> Result<Manhwa, CatalogueError> {
        if self.store.find_by_upstream_id(upstream_id).await?.is_some() {
            return Err(CatalogueError::BadInput(format!("'{upstream_id}' is already imported")));
        }

        let record = self.upstream.fetch_by_id(upstream_id).await?;
        let partial = self.upstream.transform(&record);

        let new_row = NewManhwa {
            upstream_id: Some(partial.upstream_id),
            data_source: DataSource::Upstream,
            title_data: partial.title_data,
            synopsis: partial.synopsis,
            status: partial.status,
            publisher: None,
            start_year: partial.start_year,
            end_year: None,
            total_chapters: partial.total_chapters,
            special_chapters: None,
            covers: partial.covers,
            last_synced_at: Some(Utc::now()),
            sync_status: SyncStatus::Current,
            genre_ids: Vec::new(),
        };

        let id = self.store.insert(new_row).await?;
        let row = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogueError::Transient("row vanished immediately after insert".into()))?;

        self.cache.invalidate_all_searches().await;
        Ok(row)
    }

    /// §4.6 `SyncOne`. This is also the body the production `SyncTarget`
    /// impl below delegates to, so the Syncer's batches and direct callers
    /// (`GetByID`, `POST /:id/refresh`) share one code path.
    pub async fn sync_one(&self, id: i64, upstream_id: &str) -> Result<SyncReport, CatalogueError> {
        match self.try_sync_one(id, upstream_id).await {
            Ok(report) => {
                self.cache.invalidate_entity(id).await;
                Ok(report)
            }
            Err(err) => {
                let _ = self.store.mark_sync_failed(id).await;
                self.cache.invalidate_entity(id).await;
                Err(CatalogueError::SyncFailed(sync_failure_message(&err)))
            }
        }
    }

    async fn try_sync_one(&self, id: i64, upstream_id: &str) -> Result<SyncReport, CatalogueError> {
        let record = self.upstream.fetch_by_id(upstream_id).await?;
        let partial = self.upstream.transform(&record);
        let now = Utc::now();

        let patch = ManhwaPatch {
            title_data: Some(partial.title_data),
            synopsis: Some(partial.synopsis),
            status: Some(partial.status),
            start_year: partial.start_year,
            total_chapters: partial.total_chapters,
            covers: Some(partial.covers),
            last_synced_at: Some(now),
            sync_status: Some(SyncStatus::Current),
            bump_version: true,
            ..Default::default()
        };

        self.store.update(id, patch).await?;
        Ok(SyncReport {
            status: SyncReportStatus::Success,
            message: "sync succeeded".to_string(),
            last_synced_at: Some(now),
        })
    }

    /// §4.6 `ListGenres`.
    pub async fn list_genres(&self) -> Result<Vec<Genre>, CatalogueError> {
        let mut genres = self.store.list_all_genres().await?;
        genres.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(genres)
    }

    /// §6 `GET /trending`. Delegates straight to the search engine; trending
    /// rows are never cached as a tier of their own (§4.2 lists Entity,
    /// Search, Tag — not a fourth "trending" map).
    pub async fn trending(&self, limit: u32) -> Result<Vec<ManhwaSearchResult>, CatalogueError> {
        Ok(self.search_engine.trending(limit).await?)
    }

    /// §6 `GET /recent`.
    pub async fn recently_added(&self, limit: u32) -> Result<Vec<ManhwaSearchResult>, CatalogueError> {
        Ok(self.search_engine.recently_added(limit).await?)
    }

    /// §6 `POST /:id/refresh` — synchronous `SyncOne`, returning the
    /// refreshed row (unlike [`Self::enqueue_sync`], which defers to the
    /// background worker).
    pub async fn refresh(&self, id: i64) -> Result<Manhwa, CatalogueError> {
        let row = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogueError::NotFound(format!("manhwa {id} not found")))?;
        let upstream_id = row
            .upstream_id
            .ok_or_else(|| CatalogueError::BadInput(format!("manhwa {id} has no upstream id to sync")))?;
        self.sync_one(id, &upstream_id).await?;
        self.store
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogueError::NotFound(format!("manhwa {id} not found")))
    }

    /// §6 `POST /sync/:id` → Syncer `Enqueue` at highest priority.
    pub async fn enqueue_sync(&self, id: i64) -> Result<(), CatalogueError> {
        let row = self
            .store
            .find_by_id(id)
            .await?
            .ok_or_else(|| CatalogueError::NotFound(format!("manhwa {id} not found")))?;
        let upstream_id = row
            .upstream_id
            .ok_or_else(|| CatalogueError::BadInput(format!("manhwa {id} has no upstream id to sync")))?;
        self.syncer.sync_now(id, upstream_id);
        Ok(())
    }

    /// §6 `POST /sync/all` → Syncer `KickFullSync` (`QueueOutdated` then
    /// `ProcessQueue`).
    pub async fn kick_full_sync(&self) -> Result<usize, CatalogueError> {
        let enqueued = self.syncer.queue_outdated(self.store.as_ref()).await?;
        self.syncer.spawn_process_queue();
        Ok(enqueued)
    }

    pub fn syncer(&self) -> &Arc<Syncer> {
        &self.syncer
    }

    pub fn cache(&self) -> &Arc<ManhwaCache> {
        &self.cache
    }
}

/// §4.6 `SyncOne` error-wrapping rules: Upstream `NotFound` gets a specific
/// message, `RateLimited` preserves its reason, everything else passes
/// through as-is under the `SyncFailed` kind.
fn sync_failure_message(err: &CatalogueError) -> String {
    match err {
        CatalogueError::NotFound(_) => "Manga no longer exists on Upstream".to_string(),
        CatalogueError::RateLimited(msg) => msg.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl SyncTarget for CatalogueService {
    async fn sync_one(&self, id: i64, upstream_id: &str) -> SyncOutcome {
        match CatalogueService::sync_one(self, id, upstream_id).await {
            Ok(report) => SyncOutcome {
                status: SyncOutcomeStatus::Success,
                message: report.message,
                last_synced_at: report.last_synced_at,
            },
            Err(err) => SyncOutcome {
                status: SyncOutcomeStatus::Failed,
                message: err.to_string(),
                last_synced_at: None,
            },
        }
    }
}
