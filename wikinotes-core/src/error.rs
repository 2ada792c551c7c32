//! Error types for the store, the link maintainer and the wiki facade.

use std::path::PathBuf;

use thiserror::Error;
use wikinotes_types::PageId;

/// Failures raised by a [`crate::PageStore`] implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to open store at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Page name already taken: {0}")]
    NameTaken(String),
}

/// A page's outbound links could not be re-derived.
///
/// The previous edge set is left in place. Callers log this and move on; the
/// next save of the page (or a reindex) tries again.
#[derive(Error, Debug)]
#[error("Failed to reconcile links for page {page}: {source}")]
pub struct ReconcileError {
    pub page: PageId,
    #[source]
    pub source: StoreError,
}

/// Outcomes of the page operations exposed to the HTTP layer.
#[derive(Error, Debug)]
pub enum WikiError {
    #[error("Page not found: {0}")]
    NotFound(String),

    #[error("Page with this name already exists: {0}")]
    Conflict(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for WikiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NameTaken(name) => WikiError::Conflict(name),
            other => WikiError::Storage(other),
        }
    }
}

pub type Result<T, E = WikiError> = std::result::Result<T, E>;
