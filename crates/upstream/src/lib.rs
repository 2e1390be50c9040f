//! # Manhwa Upstream Client
//!
//! Rate-limited, token-authenticated HTTP client to the external catalogue
//! (C4), plus the transform step that reduces its records to partial
//! manhwa rows.

pub mod client;
pub mod config;
pub mod error;
pub mod rate_limit;
pub mod session;
pub mod transform;

pub use client::{UpstreamClient, UpstreamSearchParams};
pub use config::UpstreamConfig;
pub use error::UpstreamError;
pub use transform::{genre_names, MangaRecord, PartialManhwa};
