//! §4.4 "Transform": reduces an upstream manga record to a partial manhwa,
//! and the accompanying cover-URL construction and tag-dictionary shape.

use manhwa_core::models::manhwa::{CoverUrls, TitleData};
use manhwa_core::ManhwaStatus;
use serde::Deserialize;
use std::collections::HashMap;

/// Localised-string maps as the upstream catalogue returns them, e.g.
/// `{"en": "Solo Leveling", "ko": "나 혼자만 레벨업"}`.
pub type LocalizedMap = HashMap<String, String>;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MangaAttributes {
    pub title: LocalizedMap,
    #[serde(default)]
    pub alt_titles: Vec<LocalizedMap>,
    pub description: LocalizedMap,
    pub status: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub last_chapter: Option<String>,
    /// Tags are embedded on the manga record itself (not a relationship),
    /// each carrying its own localised name and group — `"genre"`,
    /// `"theme"`, `"format"`, etc.
    #[serde(default)]
    pub tags: Vec<EmbeddedTag>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddedTag {
    pub id: String,
    pub attributes: EmbeddedTagAttributes,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddedTagAttributes {
    pub name: LocalizedMap,
    pub group: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverArtAttributes {
    pub file_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Relationship {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: Option<CoverArtAttributes>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MangaRecord {
    pub id: String,
    pub attributes: MangaAttributes,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

/// The fields `SyncOne`/`Import` fold into a `Manhwa` row.
#[derive(Debug, Clone)]
pub struct PartialManhwa {
    pub upstream_id: String,
    pub title_data: TitleData,
    pub synopsis: String,
    pub status: ManhwaStatus,
    pub start_year: Option<i32>,
    pub total_chapters: Option<i32>,
    pub covers: CoverUrls,
}

/// First non-empty of `en`, `ko`, `ja`, else any remaining entry.
fn select_localized(map: &LocalizedMap) -> String {
    for lang in ["en", "ko", "ja"] {
        if let Some(value) = map.get(lang) {
            if !value.trim().is_empty() {
                return value.clone();
            }
        }
    }
    map.values().find(|v| !v.trim().is_empty()).cloned().unwrap_or_default()
}

/// First alt-title keyed by one of `ja-ro`, `ko-ro`, `en-ro`.
fn select_romanized(alt_titles: &[LocalizedMap]) -> Option<String> {
    for lang in ["ja-ro", "ko-ro", "en-ro"] {
        for alt in alt_titles {
            if let Some(value) = alt.get(lang) {
                if !value.trim().is_empty() {
                    return Some(value.clone());
                }
            }
        }
    }
    None
}

fn cover_filename(record: &MangaRecord) -> Option<&str> {
    record
        .relationships
        .iter()
        .find(|r| r.kind == "cover_art")
        .and_then(|r| r.attributes.as_ref())
        .map(|a| a.file_name.as_str())
}

/// §4.4: `{base}/covers/{upstreamId}/{filename}{qualitySuffix}`.
pub fn cover_urls(base_url: &str, upstream_id: &str, filename: Option<&str>) -> CoverUrls {
    let Some(filename) = filename else {
        return CoverUrls::default();
    };
    CoverUrls {
        thumb: Some(format!("{base_url}/covers/{upstream_id}/{filename}.256.jpg")),
        medium: Some(format!("{base_url}/covers/{upstream_id}/{filename}.512.jpg")),
        large: Some(format!("{base_url}/covers/{upstream_id}/{filename}")),
    }
}

/// §4.6 "genres taken from tags whose `group = 'genre'`" — used by the
/// external-fallback search path, not by `transform` itself (genre linking
/// during import/sync is not enforced, per §4.6 `Import`).
pub fn genre_names(record: &MangaRecord) -> Vec<String> {
    record
        .attributes
        .tags
        .iter()
        .filter(|tag| tag.attributes.group == "genre")
        .map(|tag| select_localized(&tag.attributes.name))
        .collect()
}

pub fn transform(record: &MangaRecord, base_url: &str) -> PartialManhwa {
    let mut title_data = TitleData::new(select_localized(&record.attributes.title));
    title_data.alternatives = record
        .attributes
        .alt_titles
        .iter()
        .flat_map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())))
        .collect();
    title_data.romanized = select_romanized(&record.attributes.alt_titles);

    PartialManhwa {
        upstream_id: record.id.clone(),
        title_data,
        synopsis: select_localized(&record.attributes.description),
        status: ManhwaStatus::from_upstream_str(&record.attributes.status),
        start_year: record.attributes.year,
        total_chapters: record
            .attributes
            .last_chapter
            .as_ref()
            .and_then(|s| s.parse::<f64>().ok())
            .map(|f| f as i32),
        covers: cover_urls(base_url, &record.id, cover_filename(record)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn localized(pairs: &[(&str, &str)]) -> LocalizedMap {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn select_localized_prefers_english() {
        let map = localized(&[("ko", "한국어"), ("en", "English Title"), ("ja", "日本語")]);
        assert_eq!(select_localized(&map), "English Title");
    }

    #[test]
    fn select_localized_falls_back_to_korean_then_japanese_then_any() {
        let ko_only = localized(&[("ko", "한국어")]);
        assert_eq!(select_localized(&ko_only), "한국어");

        let other_only = localized(&[("fr", "Titre")]);
        assert_eq!(select_localized(&other_only), "Titre");
    }

    #[test]
    fn select_romanized_prefers_ko_ro_order() {
        let alts = vec![
            localized(&[("en-ro", "En Romanized")]),
            localized(&[("ko-ro", "Ko Romanized")]),
        ];
        assert_eq!(select_romanized(&alts), Some("Ko Romanized".to_string()));
    }

    #[test]
    fn cover_urls_build_expected_suffixes() {
        let urls = cover_urls("https://upstream.example", "U-1", Some("cover.jpg"));
        assert_eq!(urls.thumb.unwrap(), "https://upstream.example/covers/U-1/cover.jpg.256.jpg");
        assert_eq!(urls.medium.unwrap(), "https://upstream.example/covers/U-1/cover.jpg.512.jpg");
        assert_eq!(urls.large.unwrap(), "https://upstream.example/covers/U-1/cover.jpg");
    }

    #[test]
    fn cover_urls_absent_without_cover_art_relationship() {
        let urls = cover_urls("https://upstream.example", "U-1", None);
        assert!(urls.thumb.is_none() && urls.medium.is_none() && urls.large.is_none());
    }

    #[test]
    fn unknown_status_defaults_to_ongoing() {
        let record = MangaRecord {
            id: "U-1".into(),
            attributes: MangaAttributes {
                title: localized(&[("en", "Title")]),
                alt_titles: vec![],
                description: localized(&[("en", "Synopsis")]),
                status: "weird-status".into(),
                year: Some(2022),
                last_chapter: Some("120".into()),
                tags: vec![],
            },
            relationships: vec![],
        };
        let partial = transform(&record, "https://upstream.example");
        assert_eq!(partial.status, ManhwaStatus::Ongoing);
        assert_eq!(partial.total_chapters, Some(120));
    }

    #[test]
    fn genre_names_keeps_only_genre_group_tags() {
        let record = MangaRecord {
            id: "U-1".into(),
            attributes: MangaAttributes {
                title: localized(&[("en", "Title")]),
                alt_titles: vec![],
                description: localized(&[("en", "Synopsis")]),
                status: "ongoing".into(),
                year: None,
                last_chapter: None,
                tags: vec![
                    EmbeddedTag {
                        id: "t-1".into(),
                        attributes: EmbeddedTagAttributes {
                            name: localized(&[("en", "Action")]),
                            group: "genre".into(),
                        },
                    },
                    EmbeddedTag {
                        id: "t-2".into(),
                        attributes: EmbeddedTagAttributes {
                            name: localized(&[("en", "Long Strip")]),
                            group: "format".into(),
                        },
                    },
                ],
            },
            relationships: vec![],
        };

        assert_eq!(genre_names(&record), vec!["Action".to_string()]);
    }
}
