//! Core validation errors.
//!
//! This is deliberately narrow: it covers only the field-level validation
//! performed in `manhwa-core`. The Kind table of the design (`NotFound`,
//! `Conflict`, `RateLimited`, ...) lives in `manhwa-catalogue::error` since
//! it aggregates failures from every downstream crate.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("{field}: {message}")]
    Invalid { field: String, message: String },
}

impl CoreError {
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}
