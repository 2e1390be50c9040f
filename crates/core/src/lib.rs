//! # Manhwa Catalogue Core
//!
//! Shared data model, error types, and validation/sanitization helpers for
//! the manhwa catalogue gateway.
//!
//! ## Modules
//!
//! - `types`: shared enums (`ManhwaStatus`, `DataSource`, `SyncStatus`)
//! - `models`: domain models for manhwa, genres, and search requests
//! - `error`: the core error type and its HTTP-facing `appCode`
//! - `validation`: field-level validation used by `Create`/`Import`
//! - `sanitization`: input sanitisation for free-text fields and search queries

pub mod error;
pub mod models;
pub mod sanitization;
pub mod types;
pub mod validation;

#[cfg(test)]
mod tests;

pub use error::CoreError;
pub use models::{genre, manhwa, search, tag};
pub use types::*;

/// Result type alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
