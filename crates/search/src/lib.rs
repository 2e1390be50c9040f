//! # Manhwa Search Engine
//!
//! Translates a search request into a Store full-text query plus filters
//! (C5). Does not know about caching, coalescing, or Upstream — those are
//! `manhwa-catalogue`'s concern.

pub mod error;

pub use error::SearchError;

use manhwa_core::models::search::{
    truncate_synopsis, ManhwaSearchResult, PaginationMeta, SearchMetadata, SearchParams,
    SearchResponse,
};
use manhwa_core::sanitization::sanitize_search_query;
use manhwa_core::ManhwaStatus;
use manhwa_store::{SearchRow, Store};
use std::sync::Arc;

const MAX_TRENDING_OR_RECENT: u32 = 100;

pub struct SearchEngine {
    store: Arc<dyn Store>,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn Store>) -> Self {
        SearchEngine { store }
    }

    /// §4.5 entry point. `started_at` lets the caller measure
    /// `metadata.queryTime_ms` from the moment the request was accepted,
    /// not from when it reached the engine.
    pub async fn full_text_search(
        &self,
        params: &SearchParams,
        started_at: std::time::Instant,
    ) -> Result<SearchResponse, SearchError> {
        let sanitised = sanitize_search_query(&params.query);
        let page = params.pagination.page.max(1);
        let limit = params.pagination.limit.max(1);

        let (rows, total) = if sanitised.is_empty() {
            self.store.filter_search(&params.filters, page, limit).await?
        } else {
            self.store.full_text_search(&sanitised, &params.filters, page, limit).await?
        };

        let results = rows.into_iter().map(to_search_result).collect();
        Ok(build_response(results, total, page, limit, vec!["local".to_string()], started_at))
    }

    /// §4.5: "status = Ongoing, order by updatedAt desc", capped at 100.
    pub async fn trending(&self, limit: u32) -> Result<Vec<ManhwaSearchResult>, SearchError> {
        let limit = limit.min(MAX_TRENDING_OR_RECENT).max(1);
        let mut filters = manhwa_core::models::search::SearchFilters::default();
        filters.status = vec![ManhwaStatus::Ongoing];
        let (rows, _total) = self.store.filter_search(&filters, 1, limit).await?;
        Ok(rows.into_iter().map(to_search_result).collect())
    }

    /// §4.5: "order by createdAt desc", capped at 100.
    pub async fn recently_added(&self, limit: u32) -> Result<Vec<ManhwaSearchResult>, SearchError> {
        let limit = limit.min(MAX_TRENDING_OR_RECENT).max(1);
        let rows = self.store.list_recently_added(limit).await?;
        Ok(rows
            .into_iter()
            .map(|manhwa| to_search_result(SearchRow { manhwa, score: None }))
            .collect())
    }
}

fn to_search_result(row: SearchRow) -> ManhwaSearchResult {
    let manhwa = row.manhwa;
    ManhwaSearchResult {
        id: manhwa.id,
        title: manhwa.title_data.primary,
        cover_thumb: manhwa.covers.thumb,
        synopsis: truncate_synopsis(&manhwa.synopsis),
        status: manhwa.status.as_lower_str().to_string(),
        total_chapters: manhwa.total_chapters,
        genres: manhwa.genres,
        score: row.score,
    }
}

fn build_response(
    results: Vec<ManhwaSearchResult>,
    total: u64,
    page: u32,
    limit: u32,
    sources_queried: Vec<String>,
    started_at: std::time::Instant,
) -> SearchResponse {
    let total_pages = if total == 0 { 0 } else { ((total as f64) / (limit as f64)).ceil() as u32 };
    SearchResponse {
        results,
        pagination: PaginationMeta {
            current_page: page,
            total_pages,
            total_results: total,
        },
        metadata: SearchMetadata {
            sources_queried,
            query_time_ms: started_at.elapsed().as_millis() as u64,
        },
    }
}
