//! Error taxonomy surfaced to collaborators

use crate::storage::StorageError;
use thiserror::Error;

/// Errors returned by the case file core
///
/// `Validation` and `NotFound` are caller-actionable and carry a message fit
/// to show verbatim. `Store` wraps a persistence failure; it is logged where
/// it surfaces and never retried here.
#[derive(Debug, Error)]
pub enum CaseFileError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(StorageError),
}

impl CaseFileError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<StorageError> for CaseFileError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::CaseNotFound(id) => Self::NotFound(format!("case {}", id)),
            StorageError::DocumentNotFound(id) => Self::NotFound(format!("document {}", id)),
            StorageError::Invalid(msg) => Self::Validation(msg),
            other => Self::Store(other),
        }
    }
}

/// Result type for core operations
pub type CaseFileResult<T> = Result<T, CaseFileError>;
