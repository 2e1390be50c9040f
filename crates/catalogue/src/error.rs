//! §7: the Kind table aggregating failures from every downstream crate,
//! independent of transport. Transport adapters (`manhwa-api`) translate
//! these into HTTP responses via `http_status`/`app_code`.

use manhwa_core::CoreError;
use manhwa_search::SearchError;
use manhwa_store::StoreError;
use manhwa_upstream::UpstreamError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum CatalogueError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadInput(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    RateLimited(String),
    #[error("{0}")]
    Unauthorised(String),
    #[error("{0}")]
    ExternalApiError(String),
    #[error("{0}")]
    SyncFailed(String),
    #[error("{0}")]
    Transient(String),
}

impl CatalogueError {
    pub fn http_status(&self) -> u16 {
        match self {
            CatalogueError::NotFound(_) => 404,
            CatalogueError::BadInput(_) => 400,
            CatalogueError::Conflict(_) => 409,
            CatalogueError::RateLimited(_) => 429,
            CatalogueError::Unauthorised(_) => 401,
            CatalogueError::ExternalApiError(_) => 502,
            CatalogueError::SyncFailed(_) => 500,
            CatalogueError::Transient(_) => 500,
        }
    }

    /// §6 error response `appCode`.
    pub fn app_code(&self) -> &'static str {
        match self {
            CatalogueError::NotFound(_) => "manhwa_not_found",
            CatalogueError::BadInput(_) => "bad_input",
            CatalogueError::Conflict(_) => "invalid_manhwa_data",
            CatalogueError::RateLimited(_) => "rate_limit_exceeded",
            CatalogueError::Unauthorised(_) => "external_api_error",
            CatalogueError::ExternalApiError(_) => "external_api_error",
            CatalogueError::SyncFailed(_) => "sync_failed",
            CatalogueError::Transient(_) => "manhwa_search_failed",
        }
    }
}

impl From<StoreError> for CatalogueError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => CatalogueError::NotFound("manhwa not found".into()),
            StoreError::Conflict(msg) => CatalogueError::Conflict(msg),
            StoreError::Transient(msg) => CatalogueError::Transient(msg),
            StoreError::Invalid(msg) => CatalogueError::BadInput(msg),
        }
    }
}

impl From<UpstreamError> for CatalogueError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::RateLimited => CatalogueError::RateLimited("upstream rate limit exceeded".into()),
            UpstreamError::BadInput(msg) => CatalogueError::BadInput(msg),
            UpstreamError::NotFound => CatalogueError::NotFound("manga no longer exists on Upstream".into()),
            UpstreamError::Unauthorised => CatalogueError::Unauthorised("upstream session rejected".into()),
            UpstreamError::ExternalApiError { status, message } => {
                CatalogueError::ExternalApiError(format!("upstream returned {status}: {message}"))
            }
            UpstreamError::PaginationLimitExceeded => {
                CatalogueError::BadInput("offset + limit exceeds pagination ceiling".into())
            }
            UpstreamError::Transient(msg) => CatalogueError::Transient(msg),
        }
    }
}

impl From<CoreError> for CatalogueError {
    fn from(err: CoreError) -> Self {
        CatalogueError::BadInput(err.to_string())
    }
}

impl From<SearchError> for CatalogueError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::Store(store_err) => store_err.into(),
        }
    }
}
