//! Search request shapes shared by `SearchEngine`, `CatalogueService`, and
//! the cache's key derivation (§4.2 "Search key derivation").

use crate::types::ManhwaStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub status: Vec<ManhwaStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year_range: Option<YearRange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination { page: 1, limit: 20 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub filters: SearchFilters,
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub include_external: bool,
}

impl SearchParams {
    /// §4.2: `"search:" + canonical(params)`. `canonical` is a stable
    /// ordering of every request field so that two logically equal requests
    /// (e.g. genre filters listed in different order) hash to the same key.
    pub fn cache_key(&self) -> String {
        let mut genres = self.filters.genres.clone();
        genres.sort();

        let mut statuses: Vec<&'static str> =
            self.filters.status.iter().map(ManhwaStatus::as_lower_str).collect();
        statuses.sort_unstable();

        let year_range = self
            .filters
            .year_range
            .map(|yr| format!("{:?}-{:?}", yr.start, yr.end))
            .unwrap_or_else(|| "none".to_string());

        format!(
            "search:q={}|genres={}|status={}|year={}|page={}|limit={}|ext={}",
            self.query.trim(),
            genres.join(","),
            statuses.join(","),
            year_range,
            self.pagination.page,
            self.pagination.limit,
            self.include_external,
        )
    }
}

/// §4.5 `SearchResponse`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<ManhwaSearchResult>,
    pub pagination: PaginationMeta,
    pub metadata: SearchMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_results: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchMetadata {
    pub sources_queried: Vec<String>,
    pub query_time_ms: u64,
}

/// §4.5 `ManhwaSearchResult`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManhwaSearchResult {
    pub id: i64,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_thumb: Option<String>,
    pub synopsis: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_chapters: Option<i32>,
    pub genres: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

/// §4.5 synopsis truncation rule, shared by `SearchEngine` and the external
/// fallback path in `CatalogueService`.
pub fn truncate_synopsis(synopsis: &str) -> String {
    const MAX: usize = 200;
    if synopsis.chars().count() <= MAX {
        return synopsis.to_string();
    }
    let truncated: String = synopsis.chars().take(MAX).collect();
    format!("{truncated}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_is_stable_under_genre_reordering() {
        let mut a = SearchParams {
            query: "solo".into(),
            ..Default::default()
        };
        a.filters.genres = vec!["action".into(), "drama".into()];
        let mut b = a.clone();
        b.filters.genres = vec!["drama".into(), "action".into()];

        assert_eq!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn cache_key_differs_on_query() {
        let mut a = SearchParams::default();
        a.query = "solo".into();
        let mut b = SearchParams::default();
        b.query = "tower".into();
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn truncate_synopsis_leaves_short_text_untouched() {
        assert_eq!(truncate_synopsis("short"), "short");
    }

    #[test]
    fn truncate_synopsis_caps_at_200_chars_plus_ellipsis() {
        let long = "a".repeat(250);
        let truncated = truncate_synopsis(&long);
        assert_eq!(truncated.chars().count(), 201);
        assert!(truncated.ends_with('…'));
    }
}
