//! Error normalisation for the Upstream client (§4.4 "Error normalisation").

use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum UpstreamError {
    #[error("rate limited")]
    RateLimited,
    #[error("bad input: {0}")]
    BadInput(String),
    #[error("not found")]
    NotFound,
    #[error("unauthorised")]
    Unauthorised,
    #[error("external API error (status {status}): {message}")]
    ExternalApiError { status: u16, message: String },
    #[error("offset + limit exceeds the 10,000 pagination ceiling")]
    PaginationLimitExceeded,
    #[error("transient upstream error: {0}")]
    Transient(String),
}

/// Body shape of an Upstream error response: `{result: "error", errors: [...]}`.
#[derive(Debug, serde::Deserialize)]
pub(crate) struct UpstreamErrorBody {
    pub result: String,
    #[serde(default)]
    pub errors: Vec<UpstreamErrorDetail>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct UpstreamErrorDetail {
    pub id: String,
}

impl UpstreamError {
    /// §4.4: map a parsed error body plus the HTTP status to a `Kind`.
    pub(crate) fn from_body(status: u16, body: &UpstreamErrorBody) -> Self {
        let code = body.errors.first().map(|e| e.id.as_str()).unwrap_or_default();
        match code {
            "captcha_required_exception" => UpstreamError::RateLimited,
            "validation_exception" => UpstreamError::BadInput(code.to_string()),
            "entity_not_found_exception" => UpstreamError::NotFound,
            _ => UpstreamError::ExternalApiError {
                status,
                message: code.to_string(),
            },
        }
    }
}
