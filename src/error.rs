use thiserror::Error;

use crate::fetcher::{FailureClass, FetchFailure};
use crate::storage::StoreError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] rquest::Error),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Forbidden - Access denied")]
    Forbidden,

    #[error(transparent)]
    Fetch(#[from] FetchFailure),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Conflicting write for {key}: concurrent reconcile of one identity key")]
    ReconcileConflict { key: String },
}

impl Error {
    /// Whether the caller may retry the failed operation with backoff.
    /// Terminal fetch outcomes and reconcile conflicts are never retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(_) | Error::RateLimit => true,
            Error::Fetch(failure) => failure.class() == FailureClass::Transient,
            _ => false,
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { key } => Error::ReconcileConflict { key },
            StoreError::Backend(msg) => Error::Storage(msg),
        }
    }
}
