use manhwa_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error, Clone)]
pub enum SearchError {
    #[error(transparent)]
    Store(#[from] StoreError),
}
