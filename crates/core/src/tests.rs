//! Integration tests exercising the core types together.

use crate::models::manhwa::{CoverUrls, Manhwa, TitleData};
use crate::models::search::SearchParams;
use crate::types::{DataSource, ManhwaStatus, SyncStatus};
use crate::validation::{validate_page_size, validate_synopsis, validate_year_range};
use chrono::Utc;

fn sample_manhwa() -> Manhwa {
    let now = Utc::now();
    Manhwa {
        id: 1,
        upstream_id: None,
        data_source: DataSource::Local,
        title_data: TitleData::new("The Ascent"),
        synopsis: "A climber scales an impossible mountain.".into(),
        status: ManhwaStatus::Ongoing,
        publisher: None,
        start_year: Some(2020),
        end_year: None,
        total_chapters: None,
        special_chapters: None,
        covers: CoverUrls::default(),
        created_at: now,
        updated_at: now,
        last_synced_at: None,
        sync_status: SyncStatus::Current,
        version: 1,
        genres: vec!["action".into()],
    }
}

#[test]
fn manhwa_round_trips_through_json() {
    let row = sample_manhwa();
    let json = serde_json::to_string(&row).unwrap();
    let back: Manhwa = serde_json::from_str(&json).unwrap();
    assert_eq!(back.title_data.primary, "The Ascent");
    assert_eq!(back.genres, vec!["action".to_string()]);
}

#[test]
fn local_row_is_never_stale_by_refresh_rule() {
    let row = sample_manhwa();
    assert!(!row.should_refresh(Utc::now()));
}

#[test]
fn search_params_default_pagination_matches_spec_default() {
    let params = SearchParams::default();
    assert_eq!(params.pagination.page, 1);
    assert_eq!(params.pagination.limit, 20);
}

#[test]
fn create_validation_chain_rejects_short_synopsis_before_year_check() {
    assert!(validate_synopsis("short").is_err());
    assert!(validate_synopsis(&sample_manhwa().synopsis).is_ok());
    assert!(validate_year_range(Some(2024), Some(2020)).is_err());
    assert!(validate_page_size(20).is_ok());
}
