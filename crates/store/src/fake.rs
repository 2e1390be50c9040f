//! In-memory `Store` used by tests in `manhwa-search` and `manhwa-catalogue`.
//!
//! A small, fully in-process stand-in rather than a mock framework, so
//! tests can seed rows directly and assert on post-call state.

use crate::error::StoreError;
use crate::traits::{ManhwaPatch, NewManhwa, OutdatedRow, SearchRow, Store};
use async_trait::async_trait;
use chrono::Utc;
use manhwa_core::models::genre::Genre;
use manhwa_core::models::manhwa::Manhwa;
use manhwa_core::models::search::SearchFilters;
use manhwa_core::{DataSource, SyncStatus};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeStore {
    rows: Mutex<HashMap<i64, Manhwa>>,
    genres: Mutex<HashMap<i64, Genre>>,
    next_id: AtomicI64,
}

impl FakeStore {
    pub fn new() -> Self {
        FakeStore {
            rows: Mutex::new(HashMap::new()),
            genres: Mutex::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    pub fn seed(&self, row: Manhwa) {
        self.rows.lock().unwrap().insert(row.id, row);
    }

    pub fn seed_genre(&self, genre: Genre) {
        self.genres.lock().unwrap().insert(genre.id, genre);
    }

    fn matches(row: &Manhwa, filters: &SearchFilters) -> bool {
        if !filters.status.is_empty() && !filters.status.contains(&row.status) {
            return false;
        }
        if !filters.genres.is_empty() {
            let has_genre = filters.genres.iter().any(|g| row.genres.iter().any(|rg| rg == g));
            if !has_genre {
                return false;
            }
        }
        if let Some(yr) = filters.year_range {
            let row_start = row.start_year.unwrap_or(i32::MIN);
            let row_end = row.end_year.unwrap_or(i32::MAX);
            let req_start = yr.start.unwrap_or(i32::MIN);
            let req_end = yr.end.unwrap_or(i32::MAX);
            if row_start.max(req_start) > row_end.min(req_end) {
                return false;
            }
        }
        true
    }

    fn paginate(mut rows: Vec<Manhwa>, page: u32, limit: u32) -> (Vec<Manhwa>, u64) {
        let total = rows.len() as u64;
        let start = ((page.saturating_sub(1)) as usize) * (limit as usize);
        if start >= rows.len() {
            return (Vec::new(), total);
        }
        let end = (start + limit as usize).min(rows.len());
        (rows.drain(start..end).collect(), total)
    }
}

#[async_trait]
impl Store for FakeStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Manhwa>, StoreError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Manhwa>, StoreError> {
        let rows = self.rows.lock().unwrap();
        Ok(ids.iter().filter_map(|id| rows.get(id).cloned()).collect())
    }

    async fn find_by_upstream_id(&self, upstream_id: &str) -> Result<Option<Manhwa>, StoreError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|r| r.upstream_id.as_deref() == Some(upstream_id))
            .cloned())
    }

    async fn insert(&self, row: NewManhwa) -> Result<i64, StoreError> {
        if let Some(upstream_id) = &row.upstream_id {
            let exists = self
                .rows
                .lock()
                .unwrap()
                .values()
                .any(|r| r.upstream_id.as_deref() == Some(upstream_id.as_str()));
            if exists {
                return Err(StoreError::Conflict(format!("upstream_id '{upstream_id}' already exists")));
            }
        }

        let genre_names: Vec<String> = {
            let genres = self.genres.lock().unwrap();
            row.genre_ids
                .iter()
                .filter_map(|id| genres.get(id).map(|g| g.name.clone()))
                .collect()
        };

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = Utc::now();
        let manhwa = Manhwa {
            id,
            upstream_id: row.upstream_id,
            data_source: row.data_source,
            title_data: row.title_data,
            synopsis: row.synopsis,
            status: row.status,
            publisher: row.publisher,
            start_year: row.start_year,
            end_year: row.end_year,
            total_chapters: row.total_chapters,
            special_chapters: row.special_chapters,
            covers: row.covers,
            created_at: now,
            updated_at: now,
            last_synced_at: row.last_synced_at,
            sync_status: row.sync_status,
            version: 1,
            genres: genre_names,
        };
        self.rows.lock().unwrap().insert(id, manhwa);
        Ok(id)
    }

    async fn update(&self, id: i64, patch: ManhwaPatch) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.get_mut(&id).ok_or(StoreError::NotFound)?;

        if let Some(title_data) = patch.title_data {
            row.title_data = title_data;
        }
        if let Some(synopsis) = patch.synopsis {
            row.synopsis = synopsis;
        }
        if let Some(status) = patch.status {
            row.status = status;
        }
        if let Some(publisher) = patch.publisher {
            row.publisher = Some(publisher);
        }
        if let Some(start_year) = patch.start_year {
            row.start_year = Some(start_year);
        }
        if let Some(end_year) = patch.end_year {
            row.end_year = Some(end_year);
        }
        if let Some(total_chapters) = patch.total_chapters {
            row.total_chapters = Some(total_chapters);
        }
        if let Some(special_chapters) = patch.special_chapters {
            row.special_chapters = Some(special_chapters);
        }
        if let Some(covers) = patch.covers {
            row.covers = covers;
        }
        if let Some(last_synced_at) = patch.last_synced_at {
            row.last_synced_at = Some(last_synced_at);
        }
        if let Some(sync_status) = patch.sync_status {
            row.sync_status = sync_status;
        }
        if patch.bump_version {
            row.version += 1;
        }
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_sync_failed(&self, id: i64) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows.get_mut(&id).ok_or(StoreError::NotFound)?;
        row.sync_status = SyncStatus::Failed;
        row.updated_at = Utc::now();
        Ok(())
    }

    async fn full_text_search(
        &self,
        query: &str,
        filters: &SearchFilters,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<SearchRow>, u64), StoreError> {
        // `plainto_tsquery` tokenizes on word boundaries and matches any
        // token, not the query as one contiguous phrase, so the fake must
        // do the same rather than a single `contains(&query.to_lowercase())`.
        let tokens: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_owned)
            .collect();
        let title_hits = |r: &Manhwa| -> usize {
            let title = r.title_data.primary.to_lowercase();
            tokens.iter().filter(|t| title.contains(t.as_str())).count()
        };
        let synopsis_hits = |r: &Manhwa| -> usize {
            let synopsis = r.synopsis.to_lowercase();
            tokens.iter().filter(|t| synopsis.contains(t.as_str())).count()
        };

        let mut matching: Vec<Manhwa> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| Self::matches(r, filters))
            .filter(|r| title_hits(r) > 0 || synopsis_hits(r) > 0)
            .cloned()
            .collect();
        // Toy rank: title matches outrank synopsis-only matches, matching
        // the title-weight-A > synopsis-weight-B ordering from §3/§8.
        matching.sort_by(|a, b| {
            let rank = |r: &Manhwa| -> f64 { if title_hits(r) > 0 { 1.0 } else { 0.5 } };
            rank(b).partial_cmp(&rank(a)).unwrap()
        });

        let (page_rows, total) = Self::paginate(matching, page, limit);
        let rows = page_rows
            .into_iter()
            .map(|manhwa| {
                let score = if title_hits(&manhwa) > 0 { 1.0 } else { 0.5 };
                SearchRow { manhwa, score: Some(score) }
            })
            .collect();
        Ok((rows, total))
    }

    async fn filter_search(
        &self,
        filters: &SearchFilters,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<SearchRow>, u64), StoreError> {
        let mut matching: Vec<Manhwa> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| Self::matches(r, filters))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        let (page_rows, total) = Self::paginate(matching, page, limit);
        let rows = page_rows
            .into_iter()
            .map(|manhwa| SearchRow { manhwa, score: None })
            .collect();
        Ok((rows, total))
    }

    async fn list_genres_by_slug(&self, slugs: &[String]) -> Result<Vec<Genre>, StoreError> {
        let genres = self.genres.lock().unwrap();
        Ok(genres.values().filter(|g| slugs.contains(&g.slug)).cloned().collect())
    }

    async fn list_all_genres(&self) -> Result<Vec<Genre>, StoreError> {
        let mut out: Vec<Genre> = self.genres.lock().unwrap().values().cloned().collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn list_recently_added(&self, limit: u32) -> Result<Vec<Manhwa>, StoreError> {
        let mut rows: Vec<Manhwa> = self.rows.lock().unwrap().values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit as usize);
        Ok(rows)
    }

    async fn find_outdated(&self, limit: i64) -> Result<Vec<OutdatedRow>, StoreError> {
        let now = Utc::now();
        let mut rows: Vec<(&Manhwa, bool)> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.data_source == DataSource::Upstream && r.upstream_id.is_some())
            .filter(|r| {
                r.last_synced_at.is_none()
                    || now.signed_duration_since(r.last_synced_at.unwrap()) > chrono::Duration::hours(24)
                    || r.sync_status == SyncStatus::Failed
            })
            .map(|r| (r, r.sync_status == SyncStatus::Failed))
            .collect::<Vec<_>>()
            .into_iter()
            .collect();
        rows.sort_by(|a, b| match b.1.cmp(&a.1) {
            std::cmp::Ordering::Equal => a.0.last_synced_at.cmp(&b.0.last_synced_at),
            other => other,
        });

        Ok(rows
            .into_iter()
            .take(limit as usize)
            .map(|(row, was_failed)| OutdatedRow {
                id: row.id,
                upstream_id: row.upstream_id.clone().unwrap_or_default(),
                was_failed,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manhwa_core::models::manhwa::{CoverUrls, TitleData};
    use manhwa_core::ManhwaStatus;

    fn row(id: i64, title: &str, synopsis: &str) -> Manhwa {
        let now = Utc::now();
        Manhwa {
            id,
            upstream_id: None,
            data_source: DataSource::Local,
            title_data: TitleData::new(title),
            synopsis: synopsis.into(),
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
    async fn title_match_outranks_synopsis_only_match() {
        let store = FakeStore::new();
        store.seed(row(1, "The Ascent", "mountain climb"));
        store.seed(row(2, "Ascent of the Tower", "floor"));

        let (results, total) = store
            .full_text_search("Ascent Tower", &SearchFilters::default(), 1, 10)
            .await
            .unwrap();

        assert_eq!(total, 2);
        assert_eq!(results[0].manhwa.id, 2);
    }

    #[tokio::test]
    async fn duplicate_upstream_id_is_rejected() {
        use crate::traits::NewManhwa;
        let store = FakeStore::new();
        let new_row = |upstream_id: &str| NewManhwa {
            upstream_id: Some(upstream_id.into()),
            data_source: DataSource::Upstream,
            title_data: TitleData::new("Title"),
            synopsis: "A synopsis long enough to pass.".into(),
            status: ManhwaStatus::Ongoing,
            publisher: None,
            start_year: None,
            end_year: None,
            total_chapters: None,
            special_chapters: None,
            covers: CoverUrls::default(),
            last_synced_at: None,
            sync_status: SyncStatus::Current,
            genre_ids: Vec::new(),
        };

        store.insert(new_row("U-1")).await.unwrap();
        let err = store.insert(new_row("U-1")).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
