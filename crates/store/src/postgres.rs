//! Postgres-backed `Store` implementation.
//!
//! A thin wrapper around `sqlx::PgPool` whose methods map 1:1 onto the
//! port's operations. The full-text and filter queries build their `WHERE`
//! clause dynamically with `sqlx::QueryBuilder` so filter predicates compose
//! without a combinatorial explosion of hand-written query variants.

use crate::error::StoreError;
use crate::traits::{ManhwaPatch, NewManhwa, OutdatedRow, SearchRow, Store};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use manhwa_core::models::genre::Genre;
use manhwa_core::models::manhwa::{CoverUrls, Manhwa, TitleData};
use manhwa_core::models::search::SearchFilters;
use manhwa_core::{DataSource, ManhwaStatus, SyncStatus};
use sqlx::postgres::Postgres;
use sqlx::{FromRow, PgPool, QueryBuilder, Row};

pub struct PgStore {
    pool: PgPool,
}

#[derive(FromRow)]
struct GenreRow {
    id: i64,
    name: String,
    slug: String,
}

impl GenreRow {
    fn into_genre(self) -> Genre {
        Genre {
            id: self.id,
            name: self.name,
            slug: self.slug,
        }
    }
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

#[derive(FromRow)]
struct ManhwaRow {
    id: i64,
    upstream_id: Option<String>,
    data_source: String,
    title_data: serde_json::Value,
    synopsis: String,
    status: String,
    publisher: Option<String>,
    start_year: Option<i32>,
    end_year: Option<i32>,
    total_chapters: Option<i32>,
    special_chapters: Option<i32>,
    covers: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_synced_at: Option<DateTime<Utc>>,
    sync_status: String,
    version: i64,
}

impl ManhwaRow {
    fn into_manhwa(self, genres: Vec<String>) -> Result<Manhwa, StoreError> {
        let data_source = match self.data_source.as_str() {
            "local" => DataSource::Local,
            "upstream" => DataSource::Upstream,
            other => return Err(StoreError::Transient(format!("unknown data_source '{other}'"))),
        };
        let sync_status = match self.sync_status.as_str() {
            "current" => SyncStatus::Current,
            "outdated" => SyncStatus::Outdated,
            "failed" => SyncStatus::Failed,
            other => return Err(StoreError::Transient(format!("unknown sync_status '{other}'"))),
        };
        let title_data: TitleData = serde_json::from_value(self.title_data)
            .map_err(|e| StoreError::Transient(e.to_string()))?;
        let covers: CoverUrls = serde_json::from_value(self.covers)
            .map_err(|e| StoreError::Transient(e.to_string()))?;

        Ok(Manhwa {
            id: self.id,
            upstream_id: self.upstream_id,
            data_source,
            title_data,
            synopsis: self.synopsis,
            status: ManhwaStatus::from_upstream_str(&self.status),
            publisher: self.publisher,
            start_year: self.start_year,
            end_year: self.end_year,
            total_chapters: self.total_chapters,
            special_chapters: self.special_chapters,
            covers,
            created_at: self.created_at,
            updated_at: self.updated_at,
            last_synced_at: self.last_synced_at,
            sync_status,
            version: self.version,
            genres,
        })
    }
}

/// §4.1: "Year-range filter matches rows whose start-end interval overlaps
/// the requested interval, treating null `endYear` as open-ended future."
fn push_year_range_overlap(qb: &mut QueryBuilder<'_, Postgres>, start: Option<i32>, end: Option<i32>) {
    qb.push(" AND COALESCE(m.end_year, 999999) >= ");
    qb.push_bind(start.unwrap_or(i32::MIN));
    qb.push(" AND m.start_year <= ");
    qb.push_bind(end.unwrap_or(i32::MAX));
}

fn push_common_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &SearchFilters) {
    if !filters.status.is_empty() {
        let statuses: Vec<&'static str> =
            filters.status.iter().map(ManhwaStatus::as_lower_str).collect();
        qb.push(" AND m.status = ANY(");
        qb.push_bind(statuses);
        qb.push(")");
    }
    if !filters.genres.is_empty() {
        qb.push(" AND EXISTS (SELECT 1 FROM manhwa_genres mg JOIN genres g ON g.id = mg.genre_id WHERE mg.manhwa_id = m.id AND g.slug = ANY(");
        qb.push_bind(filters.genres.clone());
        qb.push("))");
    }
    if let Some(yr) = filters.year_range {
        push_year_range_overlap(qb, yr.start, yr.end);
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Manhwa>, StoreError> {
        let row = sqlx::query_as::<_, ManhwaRow>("SELECT * FROM manhwa WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let genres = self.genre_names_for(id).await?;
                Ok(Some(row.into_manhwa(genres)?))
            }
            None => Ok(None),
        }
    }

    async fn find_by_ids(&self, ids: &[i64]) -> Result<Vec<Manhwa>, StoreError> {
        let rows = sqlx::query_as::<_, ManhwaRow>("SELECT * FROM manhwa WHERE id = ANY($1)")
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let genres = self.genre_names_for(row.id).await?;
            out.push(row.into_manhwa(genres)?);
        }
        Ok(out)
    }

    async fn find_by_upstream_id(&self, upstream_id: &str) -> Result<Option<Manhwa>, StoreError> {
        let row = sqlx::query_as::<_, ManhwaRow>("SELECT * FROM manhwa WHERE upstream_id = $1")
            .bind(upstream_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let genres = self.genre_names_for(row.id).await?;
                Ok(Some(row.into_manhwa(genres)?))
            }
            None => Ok(None),
        }
    }

    async fn insert(&self, row: NewManhwa) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;

        let data_source = match row.data_source {
            DataSource::Local => "local",
            DataSource::Upstream => "upstream",
        };
        let sync_status = match row.sync_status {
            SyncStatus::Current => "current",
            SyncStatus::Outdated => "outdated",
            SyncStatus::Failed => "failed",
        };

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO manhwa
                (upstream_id, data_source, title_data, synopsis, status, publisher,
                 start_year, end_year, total_chapters, special_chapters, covers,
                 last_synced_at, sync_status, version)
             VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13,1)
             RETURNING id",
        )
        .bind(&row.upstream_id)
        .bind(data_source)
        .bind(serde_json::to_value(&row.title_data).map_err(|e| StoreError::Invalid(e.to_string()))?)
        .bind(&row.synopsis)
        .bind(row.status.as_lower_str())
        .bind(&row.publisher)
        .bind(row.start_year)
        .bind(row.end_year)
        .bind(row.total_chapters)
        .bind(row.special_chapters)
        .bind(serde_json::to_value(&row.covers).map_err(|e| StoreError::Invalid(e.to_string()))?)
        .bind(row.last_synced_at)
        .bind(sync_status)
        .fetch_one(&mut *tx)
        .await?;

        for genre_id in &row.genre_ids {
            sqlx::query("INSERT INTO manhwa_genres (manhwa_id, genre_id) VALUES ($1, $2)")
                .bind(id)
                .bind(genre_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(id)
    }

    async fn update(&self, id: i64, patch: ManhwaPatch) -> Result<(), StoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("UPDATE manhwa SET updated_at = now()");

        // §3 invariant 2: recompute `search_vector` whenever `titleData.primary`
        // or `synopsis` changes. The trigger handles the recompute; we only
        // need to touch the changed columns so it fires.
        if let Some(title_data) = &patch.title_data {
            qb.push(", title_data = ");
            qb.push_bind(serde_json::to_value(title_data).map_err(|e| StoreError::Invalid(e.to_string()))?);
        }
        if let Some(synopsis) = &patch.synopsis {
            qb.push(", synopsis = ");
            qb.push_bind(synopsis);
        }
        if let Some(status) = patch.status {
            qb.push(", status = ");
            qb.push_bind(status.as_lower_str());
        }
        if let Some(publisher) = &patch.publisher {
            qb.push(", publisher = ");
            qb.push_bind(publisher);
        }
        if let Some(start_year) = patch.start_year {
            qb.push(", start_year = ");
            qb.push_bind(start_year);
        }
        if let Some(end_year) = patch.end_year {
            qb.push(", end_year = ");
            qb.push_bind(end_year);
        }
        if let Some(total_chapters) = patch.total_chapters {
            qb.push(", total_chapters = ");
            qb.push_bind(total_chapters);
        }
        if let Some(special_chapters) = patch.special_chapters {
            qb.push(", special_chapters = ");
            qb.push_bind(special_chapters);
        }
        if let Some(covers) = &patch.covers {
            qb.push(", covers = ");
            qb.push_bind(serde_json::to_value(covers).map_err(|e| StoreError::Invalid(e.to_string()))?);
        }
        if let Some(last_synced_at) = patch.last_synced_at {
            qb.push(", last_synced_at = ");
            qb.push_bind(last_synced_at);
        }
        if let Some(sync_status) = patch.sync_status {
            let value = match sync_status {
                SyncStatus::Current => "current",
                SyncStatus::Outdated => "outdated",
                SyncStatus::Failed => "failed",
            };
            qb.push(", sync_status = ");
            qb.push_bind(value);
        }
        if patch.bump_version {
            qb.push(", version = version + 1");
        }

        qb.push(" WHERE id = ");
        qb.push_bind(id);

        let result = qb.build().execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn mark_sync_failed(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE manhwa SET sync_status = 'failed', updated_at = now() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn full_text_search(
        &self,
        query: &str,
        filters: &SearchFilters,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<SearchRow>, u64), StoreError> {
        let offset = (page.saturating_sub(1) as i64) * limit as i64;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT m.*, ts_rank(m.search_vector, plainto_tsquery('english', ",
        );
        qb.push_bind(query);
        qb.push(")) AS rank FROM manhwa m WHERE m.search_vector @@ plainto_tsquery('english', ");
        qb.push_bind(query);
        qb.push(")");
        push_common_filters(&mut qb, filters);
        qb.push(" ORDER BY rank DESC LIMIT ");
        qb.push_bind(limit as i64);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb.build().fetch_all(&self.pool).await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let rank: f64 = row.try_get("rank").unwrap_or(0.0);
            let manhwa_row: ManhwaRow = ManhwaRow::from_row(row).map_err(StoreError::from_sqlx_alias)?;
            let genres = self.genre_names_for(manhwa_row.id).await?;
            out.push(SearchRow {
                manhwa: manhwa_row.into_manhwa(genres)?,
                score: Some(rank),
            });
        }

        let total = self.count_full_text(query, filters).await?;
        Ok((out, total))
    }

    async fn filter_search(
        &self,
        filters: &SearchFilters,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<SearchRow>, u64), StoreError> {
        let offset = (page.saturating_sub(1) as i64) * limit as i64;

        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM manhwa m WHERE true");
        push_common_filters(&mut qb, filters);
        qb.push(" ORDER BY m.updated_at DESC LIMIT ");
        qb.push_bind(limit as i64);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let rows = qb.build_query_as::<ManhwaRow>().fetch_all(&self.pool).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let genres = self.genre_names_for(row.id).await?;
            out.push(SearchRow {
                manhwa: row.into_manhwa(genres)?,
                score: None,
            });
        }

        let total = self.count_filter(filters).await?;
        Ok((out, total))
    }

    async fn list_genres_by_slug(&self, slugs: &[String]) -> Result<Vec<Genre>, StoreError> {
        let rows = sqlx::query_as::<_, GenreRow>("SELECT id, name, slug FROM genres WHERE slug = ANY($1)")
            .bind(slugs)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(GenreRow::into_genre).collect())
    }

    async fn list_all_genres(&self) -> Result<Vec<Genre>, StoreError> {
        let rows = sqlx::query_as::<_, GenreRow>("SELECT id, name, slug FROM genres ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(GenreRow::into_genre).collect())
    }

    async fn list_recently_added(&self, limit: u32) -> Result<Vec<Manhwa>, StoreError> {
        let rows = sqlx::query_as::<_, ManhwaRow>(
            "SELECT * FROM manhwa ORDER BY created_at DESC LIMIT $1",
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let genres = self.genre_names_for(row.id).await?;
            out.push(row.into_manhwa(genres)?);
        }
        Ok(out)
    }

    async fn find_outdated(&self, limit: i64) -> Result<Vec<OutdatedRow>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, upstream_id, (sync_status = 'failed') AS was_failed
             FROM manhwa
             WHERE data_source = 'upstream'
               AND upstream_id IS NOT NULL
               AND (last_synced_at IS NULL OR last_synced_at < now() - interval '24 hours' OR sync_status = 'failed')
             ORDER BY was_failed DESC, last_synced_at ASC NULLS FIRST
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(OutdatedRow {
                    id: row.try_get("id").map_err(StoreError::from_sqlx_alias)?,
                    upstream_id: row.try_get("upstream_id").map_err(StoreError::from_sqlx_alias)?,
                    was_failed: row.try_get("was_failed").map_err(StoreError::from_sqlx_alias)?,
                })
            })
            .collect()
    }
}

impl PgStore {
    async fn genre_names_for(&self, manhwa_id: i64) -> Result<Vec<String>, StoreError> {
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT g.name FROM genres g
             JOIN manhwa_genres mg ON mg.genre_id = g.id
             WHERE mg.manhwa_id = $1
             ORDER BY g.name ASC",
        )
        .bind(manhwa_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(names)
    }

    async fn count_full_text(&self, query: &str, filters: &SearchFilters) -> Result<u64, StoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(
            "SELECT count(*) FROM manhwa m WHERE m.search_vector @@ plainto_tsquery('english', ",
        );
        qb.push_bind(query);
        qb.push(")");
        push_common_filters(&mut qb, filters);
        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count as u64)
    }

    async fn count_filter(&self, filters: &SearchFilters) -> Result<u64, StoreError> {
        let mut qb: QueryBuilder<Postgres> = QueryBuilder::new("SELECT count(*) FROM manhwa m WHERE true");
        push_common_filters(&mut qb, filters);
        let count: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(count as u64)
    }
}

impl StoreError {
    fn from_sqlx_alias(err: sqlx::Error) -> Self {
        StoreError::from(err)
    }
}
