//! Input sanitisation for free-text fields and search queries.

use once_cell::sync::Lazy;
use regex::Regex;

/// §4.5 step 1: "Sanitise query: drop `'`, `\"`, `\\`."
pub fn sanitize_search_query(query: &str) -> String {
    query
        .chars()
        .filter(|c| !matches!(c, '\'' | '"' | '\\'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Strips HTML/script content from free-text fields (`synopsis`, titles)
/// supplied on `Create`. Upstream-sourced text is assumed pre-sanitised by
/// the transform step and is not re-run through this.
pub fn sanitize_text(input: &str) -> String {
    ammonia::Builder::empty().clean(input).to_string().trim().to_string()
}

static XSS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<script|javascript:|onerror=|onload=|<iframe").unwrap()
});

/// Used by validation to reject (rather than silently clean) fields that
/// look like an injection attempt.
pub fn contains_xss_patterns(input: &str) -> bool {
    XSS_PATTERN.is_match(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_search_query_drops_quotes_and_backslashes() {
        assert_eq!(sanitize_search_query(r#"solo's "leveling\""#), "solos leveling");
    }

    #[test]
    fn sanitize_search_query_trims_surrounding_whitespace() {
        assert_eq!(sanitize_search_query("  tower of god  "), "tower of god");
    }

    #[test]
    fn sanitize_text_strips_script_tags() {
        let cleaned = sanitize_text("<script>alert(1)</script>hello");
        assert_eq!(cleaned, "hello");
    }

    #[test]
    fn sanitize_text_passes_plain_text_through() {
        assert_eq!(sanitize_text("A perfectly ordinary synopsis."), "A perfectly ordinary synopsis.");
    }

    #[test]
    fn contains_xss_patterns_flags_script_tag() {
        assert!(contains_xss_patterns("<script>evil()</script>"));
        assert!(contains_xss_patterns("onerror=alert(1)"));
    }

    #[test]
    fn contains_xss_patterns_ignores_clean_text() {
        assert!(!contains_xss_patterns("A tower climbing manhwa."));
    }
}
