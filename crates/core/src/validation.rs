//! Field-level validation helpers used by `Create`, `Import`, and the search
//! request path. HTTP-level request shape validation (body schema, required
//! fields) is an external concern per the design; these functions validate
//! the semantic constraints spec.md places on the data model itself.

use crate::error::CoreError;
use crate::types::ManhwaStatus;
use once_cell::sync::Lazy;
use regex::Regex;

/// §6: `pagination.limit` is `1..=100`.
pub fn validate_page_size(limit: u32) -> Result<(), CoreError> {
    if limit < 1 {
        return Err(CoreError::invalid("limit", "page size must be at least 1"));
    }
    if limit > 100 {
        return Err(CoreError::invalid("limit", "page size too large (max 100)"));
    }
    Ok(())
}

/// §6: `pagination.page >= 1`.
pub fn validate_page(page: u32) -> Result<(), CoreError> {
    if page < 1 {
        return Err(CoreError::invalid("page", "page must be at least 1"));
    }
    Ok(())
}

/// §3 invariant 4: `endYear >= startYear` when both present.
pub fn validate_year_range(start: Option<i32>, end: Option<i32>) -> Result<(), CoreError> {
    if let (Some(s), Some(e)) = (start, end) {
        if e < s {
            return Err(CoreError::invalid(
                "endYear",
                format!("endYear ({e}) must be >= startYear ({s})"),
            ));
        }
    }
    Ok(())
}

/// §3: synopsis required, >= 10 chars on create.
pub fn validate_synopsis(synopsis: &str) -> Result<(), CoreError> {
    if synopsis.trim().chars().count() < 10 {
        return Err(CoreError::invalid(
            "synopsis",
            "synopsis must be at least 10 characters",
        ));
    }
    Ok(())
}

/// §6: search `filters.genres` capped at 10 entries.
pub fn validate_genre_slugs(slugs: &[String]) -> Result<(), CoreError> {
    if slugs.len() > 10 {
        return Err(CoreError::invalid(
            "genres",
            "at most 10 genre filters are allowed",
        ));
    }
    Ok(())
}

/// §6: `query` body field is `1..=200` chars.
pub fn validate_query_length(query: &str) -> Result<(), CoreError> {
    if query.is_empty() {
        return Err(CoreError::invalid("query", "query cannot be empty"));
    }
    if query.chars().count() > 200 {
        return Err(CoreError::invalid("query", "query too long (max 200 chars)"));
    }
    Ok(())
}

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").unwrap());

/// Genre slugs are lower-case, hyphen-separated tokens.
pub fn validate_slug(slug: &str) -> Result<(), CoreError> {
    if !SLUG_RE.is_match(slug) {
        return Err(CoreError::invalid(
            "slug",
            format!("'{slug}' is not a valid slug (expected lower-case, hyphen-separated)"),
        ));
    }
    Ok(())
}

/// §6: `filters.status` values map onto `ManhwaStatus`; unknown values are
/// rejected rather than silently defaulted (unlike the upstream transform,
/// which defaults unknown values to `Ongoing` per §4.4).
pub fn validate_status_filter(values: &[String]) -> Result<Vec<ManhwaStatus>, CoreError> {
    values
        .iter()
        .map(|v| match v.to_lowercase().as_str() {
            "ongoing" => Ok(ManhwaStatus::Ongoing),
            "completed" => Ok(ManhwaStatus::Completed),
            "hiatus" => Ok(ManhwaStatus::Hiatus),
            "cancelled" => Ok(ManhwaStatus::Cancelled),
            other => Err(CoreError::invalid(
                "status",
                format!("unknown status filter '{other}'"),
            )),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_within_bounds_is_ok() {
        assert!(validate_page_size(1).is_ok());
        assert!(validate_page_size(20).is_ok());
        assert!(validate_page_size(100).is_ok());
    }

    #[test]
    fn page_size_zero_is_rejected() {
        let err = validate_page_size(0).unwrap_err();
        assert!(err.to_string().contains("at least 1"));
    }

    #[test]
    fn page_size_over_max_is_rejected() {
        let err = validate_page_size(101).unwrap_err();
        assert!(err.to_string().contains("too large"));
    }

    #[test]
    fn year_range_valid_when_end_after_start() {
        assert!(validate_year_range(Some(2020), Some(2024)).is_ok());
        assert!(validate_year_range(Some(2020), None).is_ok());
        assert!(validate_year_range(None, None).is_ok());
    }

    #[test]
    fn year_range_rejects_end_before_start() {
        let err = validate_year_range(Some(2024), Some(2020)).unwrap_err();
        assert!(err.to_string().contains("endYear"));
    }

    #[test]
    fn synopsis_must_reach_minimum_length() {
        assert!(validate_synopsis("too short").is_err());
        assert!(validate_synopsis("this synopsis is long enough").is_ok());
    }

    #[test]
    fn genre_slug_filter_capped_at_ten() {
        let ten: Vec<String> = (0..10).map(|i| format!("g{i}")).collect();
        assert!(validate_genre_slugs(&ten).is_ok());
        let eleven: Vec<String> = (0..11).map(|i| format!("g{i}")).collect();
        assert!(validate_genre_slugs(&eleven).is_err());
    }

    #[test]
    fn query_length_bounds() {
        assert!(validate_query_length("").is_err());
        assert!(validate_query_length(&"a".repeat(200)).is_ok());
        assert!(validate_query_length(&"a".repeat(201)).is_err());
    }

    #[test]
    fn slug_format_validation() {
        assert!(validate_slug("action").is_ok());
        assert!(validate_slug("slice-of-life").is_ok());
        assert!(validate_slug("Action").is_err());
        assert!(validate_slug("slice_of_life").is_err());
        assert!(validate_slug("-leading").is_err());
    }

    #[test]
    fn status_filter_accepts_known_values_only() {
        let ok = validate_status_filter(&["ongoing".into(), "Completed".into()]).unwrap();
        assert_eq!(ok, vec![ManhwaStatus::Ongoing, ManhwaStatus::Completed]);

        assert!(validate_status_filter(&["whatever".into()]).is_err());
    }
}
