//! Session-token refresh protocol (§4.4 "Authentication").
//!
//! A `tokio::sync::RwLock` holds the shared token state: read first, then a
//! double-checked write-lock acquisition so a concurrent refresh storm
//! collapses to a single outstanding login (§5: "A concurrent 401 refresh
//! must not cause more than one outstanding login per window.").

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::RwLock;

const TOKEN_LIFETIME_MINUTES: i64 = 15;
const REFRESH_MARGIN_MINUTES: i64 = 1;

#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
}

impl SessionToken {
    fn due_for_refresh(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.issued_at)
            >= ChronoDuration::minutes(TOKEN_LIFETIME_MINUTES - REFRESH_MARGIN_MINUTES)
    }
}

/// Paths the session token is attached to (§4.4).
pub fn is_protected_path(path: &str) -> bool {
    path.starts_with("/user")
        || path.starts_with("/manga/draft")
        || path.starts_with("/upload")
        || (path.starts_with("/chapter/") && path.ends_with("/read"))
}

pub struct SessionManager {
    token: RwLock<Option<SessionToken>>,
}

impl Default for SessionManager {
    fn default() -> Self {
        SessionManager { token: RwLock::new(None) }
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a token, logging in via `login_fn` only if none is cached or
    /// the cached one is due for proactive refresh.
    pub async fn token<F, Fut>(&self, login_fn: F) -> Result<String, crate::error::UpstreamError>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<String, crate::error::UpstreamError>>,
    {
        let now = Utc::now();
        {
            let guard = self.token.read().await;
            if let Some(existing) = guard.as_ref() {
                if !existing.due_for_refresh(now) {
                    return Ok(existing.token.clone());
                }
            }
        }

        let mut guard = self.token.write().await;
        if let Some(existing) = guard.as_ref() {
            if !existing.due_for_refresh(now) {
                return Ok(existing.token.clone());
            }
        }

        let fresh = login_fn().await?;
        *guard = Some(SessionToken { token: fresh.clone(), issued_at: now });
        Ok(fresh)
    }

    /// §4.4: "On a 401 to a protected request, the client discards the
    /// cached token."
    pub async fn invalidate(&self) {
        *self.token.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_paths_match_spec_patterns() {
        assert!(is_protected_path("/user"));
        assert!(is_protected_path("/user/follows"));
        assert!(is_protected_path("/manga/draft"));
        assert!(is_protected_path("/upload/session"));
        assert!(is_protected_path("/chapter/abc-123/read"));
        assert!(!is_protected_path("/manga/abc-123"));
        assert!(!is_protected_path("/chapter/abc-123"));
    }

    #[tokio::test]
    async fn token_is_reused_when_not_due_for_refresh() {
        let manager = SessionManager::new();
        let calls = std::sync::Arc::new(std::sync::atomic::AtomicU32::new(0));

        for _ in 0..3 {
            let calls = calls.clone();
            manager
                .token(|| async move {
                    calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    Ok("token-a".to_string())
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_a_fresh_login_on_next_call() {
        let manager = SessionManager::new();
        manager.token(|| async { Ok("first".to_string()) }).await.unwrap();
        manager.invalidate().await;
        let token = manager.token(|| async { Ok("second".to_string()) }).await.unwrap();
        assert_eq!(token, "second");
    }
}
