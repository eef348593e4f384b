//! Storage trait definitions

use crate::model::{Analysis, Case, CaseId, CaseUpdate, Document, DocumentId, NewCase, NewDocument};
use serde::Serialize;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Date parsing error: {0}")]
    DateParse(String),

    #[error("Case not found: {0}")]
    CaseNotFound(CaseId),

    #[error("Document not found: {0}")]
    DocumentNotFound(DocumentId),

    #[error("Invalid input: {0}")]
    Invalid(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Filter criteria for listing cases
#[derive(Debug, Clone, Default)]
pub struct CaseFilter {
    /// Case-insensitive substring matched against case name or client name
    pub search: Option<String>,
    /// Exact status match
    pub status: Option<String>,
}

impl CaseFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the search term. Blank terms are ignored; the term is trimmed.
    pub fn with_search(mut self, term: impl AsRef<str>) -> Self {
        let term = term.as_ref().trim();
        self.search = (!term.is_empty()).then(|| term.to_string());
        self
    }

    /// Set the exact status to match. Blank statuses are ignored; the
    /// status is trimmed.
    pub fn with_status(mut self, status: impl AsRef<str>) -> Self {
        let status = status.as_ref().trim();
        self.status = (!status.is_empty()).then(|| status.to_string());
        self
    }

    /// The search term folded for matching against the stored folded columns
    pub fn folded_search(&self) -> Option<String> {
        self.search.as_deref().map(fold)
    }
}

/// A case together with its live document count
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseSummary {
    #[serde(flatten)]
    pub case: Case,
    pub document_count: u64,
}

/// One window of a filtered case listing, read from a single snapshot
#[derive(Debug, Clone)]
pub struct CaseWindow {
    pub items: Vec<CaseSummary>,
    /// Size of the whole filtered set, not just this window
    pub total: u64,
}

/// Trait for case/document storage backends
///
/// Implementations must be thread-safe (Send + Sync). Every method is
/// atomic on its own; `delete_case` removes the case and all of its
/// documents as one unit, and `update_document_analysis` is the only
/// write path for a document's analysis.
pub trait CaseStore: Send + Sync {
    // === Case Operations ===

    /// Insert a case. Fails with `Invalid` on an empty case or client name.
    fn create_case(&self, new: &NewCase) -> StorageResult<Case>;

    /// Load a case by ID
    fn get_case(&self, id: CaseId) -> StorageResult<Option<Case>>;

    /// Apply a partial update and bump `updated_at`
    fn update_case(&self, id: CaseId, update: &CaseUpdate) -> StorageResult<Case>;

    /// Delete a case and its documents. Returns the number of documents removed.
    fn delete_case(&self, id: CaseId) -> StorageResult<usize>;

    /// List cases matching `filter`, newest first, windowed by limit/offset
    fn list_cases(&self, filter: &CaseFilter, limit: u64, offset: u64) -> StorageResult<CaseWindow>;

    // === Document Operations ===

    /// Insert a document. Fails with `CaseNotFound` if the owning case is absent.
    fn create_document(&self, new: &NewDocument) -> StorageResult<Document>;

    /// Load a document by ID
    fn get_document(&self, id: DocumentId) -> StorageResult<Option<Document>>;

    /// Delete a single document
    fn delete_document(&self, id: DocumentId) -> StorageResult<()>;

    /// Documents of a case in timeline order: event date ascending, undated
    /// last, ties by creation order
    fn list_documents(&self, case_id: CaseId) -> StorageResult<Vec<Document>>;

    /// A case and its timeline read from one snapshot, so a concurrent
    /// cascade delete is seen either entirely or not at all
    fn get_case_with_documents(&self, id: CaseId) -> StorageResult<Option<(Case, Vec<Document>)>>;

    /// Documents still waiting for an analysis, oldest first
    fn list_pending_documents(&self, limit: u64) -> StorageResult<Vec<Document>>;

    /// Replace a document's analysis wholesale and return the stored document
    fn update_document_analysis(&self, id: DocumentId, analysis: &Analysis) -> StorageResult<Document>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: CaseStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}

/// Unicode-aware case folding used for search columns and terms
pub(crate) fn fold(text: &str) -> String {
    text.to_lowercase()
}

/// Trim a required text field, rejecting blank values
pub(crate) fn required_text(field: &str, value: &str) -> StorageResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(StorageError::Invalid(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}
