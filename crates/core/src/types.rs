//! Shared enums for the manhwa catalogue.

use serde::{Deserialize, Serialize};

/// Where a manhwa row originated. Local-only records never synchronise
/// against Upstream (invariant 1 of the data model).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Local,
    Upstream,
}

/// Serialisation status of a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManhwaStatus {
    Ongoing,
    Completed,
    Hiatus,
    Cancelled,
}

impl ManhwaStatus {
    /// Parse a status from a free-form upstream string, defaulting to
    /// `Ongoing` for anything unrecognised (§4.4 "Transform").
    pub fn from_upstream_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "completed" | "complete" => ManhwaStatus::Completed,
            "hiatus" => ManhwaStatus::Hiatus,
            "cancelled" | "canceled" => ManhwaStatus::Cancelled,
            _ => ManhwaStatus::Ongoing,
        }
    }

    /// Lower-case wire representation, as `SearchEngine` results require.
    pub fn as_lower_str(&self) -> &'static str {
        match self {
            ManhwaStatus::Ongoing => "ongoing",
            ManhwaStatus::Completed => "completed",
            ManhwaStatus::Hiatus => "hiatus",
            ManhwaStatus::Cancelled => "cancelled",
        }
    }
}

/// Freshness of an Upstream-sourced row relative to the last successful sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Current,
    Outdated,
    Failed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_from_upstream_str_defaults_to_ongoing() {
        assert_eq!(ManhwaStatus::from_upstream_str("weird"), ManhwaStatus::Ongoing);
        assert_eq!(ManhwaStatus::from_upstream_str(""), ManhwaStatus::Ongoing);
    }

    #[test]
    fn status_from_upstream_str_is_case_insensitive() {
        assert_eq!(ManhwaStatus::from_upstream_str("COMPLETED"), ManhwaStatus::Completed);
        assert_eq!(ManhwaStatus::from_upstream_str("Hiatus"), ManhwaStatus::Hiatus);
        assert_eq!(ManhwaStatus::from_upstream_str("canceled"), ManhwaStatus::Cancelled);
    }

    #[test]
    fn status_serializes_lower_case() {
        let json = serde_json::to_string(&ManhwaStatus::Ongoing).unwrap();
        assert_eq!(json, r#""ongoing""#);
    }

    #[test]
    fn as_lower_str_matches_serde_rename() {
        for status in [
            ManhwaStatus::Ongoing,
            ManhwaStatus::Completed,
            ManhwaStatus::Hiatus,
            ManhwaStatus::Cancelled,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!(r#""{}""#, status.as_lower_str()));
        }
    }
}
