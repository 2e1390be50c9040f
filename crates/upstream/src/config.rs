//! §4.4 "Configuration: base URL, identifying agent string, credentials
//! (user, secret), request timeout 10s."

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
    pub user_agent: String,
    pub username: String,
    pub secret: String,
    pub timeout: Duration,
}

impl UpstreamConfig {
    pub fn new(base_url: impl Into<String>, username: impl Into<String>, secret: impl Into<String>) -> Self {
        UpstreamConfig {
            base_url: base_url.into(),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            username: username.into(),
            secret: secret.into(),
            timeout: Duration::from_secs(10),
        }
    }
}
