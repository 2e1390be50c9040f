//! §6 "Environment configuration": every knob the service reads at startup,
//! loaded through the `config` crate with `dotenvy` populating the process
//! environment first so a local `.env` behaves the same as exported vars.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub upstream_api_url: String,
    pub upstream_username: String,
    pub upstream_secret: String,

    #[serde(default = "default_sync_batch_size")]
    pub sync_batch_size: usize,
    /// Seconds between cron-triggered sync sweeps. Named to match
    /// `SYNC_CRON_SCHEDULE` rather than full cron syntax — see `load`.
    #[serde(default = "default_sync_cron_schedule")]
    pub sync_cron_schedule: u64,

    #[serde(default = "default_cache_ttl_default")]
    pub cache_ttl_default: u64,
    #[serde(default = "default_cache_ttl_search")]
    pub cache_ttl_search: u64,
    #[serde(default = "default_cache_max_keys")]
    pub cache_max_keys: u64,

    #[serde(default = "default_bind_port")]
    pub bind_port: u16,
}

fn default_sync_batch_size() -> usize {
    manhwa_catalogue::DEFAULT_SYNC_BATCH_SIZE
}
fn default_sync_cron_schedule() -> u64 {
    3600
}
fn default_cache_ttl_default() -> u64 {
    3600
}
fn default_cache_ttl_search() -> u64 {
    300
}
fn default_cache_max_keys() -> u64 {
    1000
}
fn default_bind_port() -> u16 {
    8080
}

impl Settings {
    /// Loads `.env` (if present) then layers process environment over the
    /// defaults above. `SYNC_CRON_SCHEDULE` holds an interval in seconds —
    /// the Syncer drives it with a `tokio::time::interval`, not a cron
    /// expression evaluator.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::Environment::default().try_parsing(true))
            .build()?;

        config.try_deserialize()
    }

    pub fn sync_cron_interval(&self) -> Duration {
        Duration::from_secs(self.sync_cron_schedule)
    }

    pub fn cache_ttl_default(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_default)
    }

    pub fn cache_ttl_search(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_search)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_helpers_convert_seconds() {
        let settings = Settings {
            database_url: "postgres://localhost/test".into(),
            upstream_api_url: "https://upstream.example".into(),
            upstream_username: "user".into(),
            upstream_secret: "secret".into(),
            sync_batch_size: 10,
            sync_cron_schedule: 1800,
            cache_ttl_default: 3600,
            cache_ttl_search: 300,
            cache_max_keys: 1000,
            bind_port: 8080,
        };

        assert_eq!(settings.sync_cron_interval(), Duration::from_secs(1800));
        assert_eq!(settings.cache_ttl_default(), Duration::from_secs(3600));
        assert_eq!(settings.cache_ttl_search(), Duration::from_secs(300));
    }
}
