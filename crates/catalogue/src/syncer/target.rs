//! The callback the Syncer drives work through, kept narrow so the Syncer
//! does not depend on the whole of `CatalogueService` (which in turn owns
//! the Syncer). `CatalogueService` is the only production implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcomeStatus {
    Success,
    Failed,
}

#[derive(Debug, Clone)]
pub struct SyncOutcome {
    pub status: SyncOutcomeStatus,
    pub message: String,
    pub last_synced_at: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait SyncTarget: Send + Sync {
    async fn sync_one(&self, id: i64, upstream_id: &str) -> SyncOutcome;
}
