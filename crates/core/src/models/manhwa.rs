//! The `Manhwa` entity and its structured sub-records.
//!
//! §9 Design Notes: "Dynamic JSON-shaped title data becomes a typed record
//! with a stable serialisation" — `TitleData` below is that record.

use crate::types::{DataSource, ManhwaStatus, SyncStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// §3: `titleData` — `{ primary, alternatives: [(languageCode, title)...], romanized? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleData {
    pub primary: String,
    #[serde(default)]
    pub alternatives: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub romanized: Option<String>,
}

impl TitleData {
    pub fn new(primary: impl Into<String>) -> Self {
        TitleData {
            primary: primary.into(),
            alternatives: Vec::new(),
            romanized: None,
        }
    }
}

/// §3: cover URLs at three resolutions, derived from the upstream filename.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverUrls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub large: Option<String>,
}

/// The primary entity of the catalogue. See §3 for invariants; they are
/// enforced by the `Store` implementation and by `manhwa-catalogue`'s
/// service methods rather than by this struct's constructor, since several
/// (e.g. "genre rows referenced by a junction must exist") span tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manhwa {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_id: Option<String>,
    pub data_source: DataSource,
    pub title_data: TitleData,
    pub synopsis: String,
    pub status: ManhwaStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_chapters: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_chapters: Option<i32>,
    #[serde(default)]
    pub covers: CoverUrls,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<DateTime<Utc>>,
    pub sync_status: SyncStatus,
    pub version: i64,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl Manhwa {
    /// §4.6 `shouldRefresh`: Upstream-sourced rows never synced, or synced
    /// more than 24h ago, are due for a background refresh.
    pub fn should_refresh(&self, now: DateTime<Utc>) -> bool {
        if self.data_source != DataSource::Upstream {
            return false;
        }
        match self.last_synced_at {
            None => true,
            Some(last) => now.signed_duration_since(last) > chrono::Duration::hours(24),
        }
    }

    /// §GLOSSARY "Stale": older than 24h or `syncStatus != Current`.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.sync_status != SyncStatus::Current || self.should_refresh(now)
    }

    pub fn entity_cache_key(id: i64) -> String {
        format!("manhwa:entity:{id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(data_source: DataSource, last_synced_at: Option<DateTime<Utc>>) -> Manhwa {
        let now = Utc::now();
        Manhwa {
            id: 1,
            upstream_id: if data_source == DataSource::Upstream {
                Some("u-1".into())
            } else {
                None
            },
            data_source,
            title_data: TitleData::new("Title"),
            synopsis: "A long enough synopsis for testing purposes.".into(),
            status: ManhwaStatus::Ongoing,
            publisher: None,
            start_year: None,
            end_year: None,
            total_chapters: None,
            special_chapters: None,
            covers: CoverUrls::default(),
            created_at: now,
            updated_at: now,
            last_synced_at,
            sync_status: SyncStatus::Current,
            version: 1,
            genres: Vec::new(),
        }
    }

    #[test]
    fn local_rows_never_need_refresh() {
        let row = sample(DataSource::Local, None);
        assert!(!row.should_refresh(Utc::now()));
    }

    #[test]
    fn never_synced_upstream_row_needs_refresh() {
        let row = sample(DataSource::Upstream, None);
        assert!(row.should_refresh(Utc::now()));
    }

    #[test]
    fn recently_synced_upstream_row_does_not_need_refresh() {
        let row = sample(DataSource::Upstream, Some(Utc::now()));
        assert!(!row.should_refresh(Utc::now()));
    }

    #[test]
    fn upstream_row_synced_25h_ago_needs_refresh() {
        let row = sample(DataSource::Upstream, Some(Utc::now() - chrono::Duration::hours(25)));
        assert!(row.should_refresh(Utc::now()));
    }

    #[test]
    fn entity_cache_key_matches_spec_format() {
        assert_eq!(Manhwa::entity_cache_key(42), "manhwa:entity:42");
    }
}
