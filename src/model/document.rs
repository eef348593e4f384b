//! Document records

use super::analysis::Analysis;
use super::case::CaseId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(i64);

impl DocumentId {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A file-backed record belonging to exactly one case
///
/// A document without an analysis is a valid terminal state; analysis is
/// attached later, and only through the store's analysis write path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: DocumentId,
    pub case_id: CaseId,
    pub document_name: String,
    /// Opaque address in the external blob store
    pub storage_path: Option<String>,
    /// The date the document's content pertains to
    pub event_date: Option<NaiveDate>,
    pub document_type: Option<String>,
    pub ai_analysis: Option<Analysis>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn is_analyzed(&self) -> bool {
        self.ai_analysis.is_some()
    }
}

/// Input for creating a document, as supplied by the upload collaborator
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub case_id: CaseId,
    pub document_name: String,
    pub storage_path: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub document_type: Option<String>,
}

impl NewDocument {
    pub fn new(case_id: CaseId, document_name: impl Into<String>) -> Self {
        Self {
            case_id,
            document_name: document_name.into(),
            storage_path: None,
            event_date: None,
            document_type: None,
        }
    }

    pub fn with_storage_path(mut self, path: impl Into<String>) -> Self {
        self.storage_path = Some(path.into());
        self
    }

    pub fn with_event_date(mut self, date: NaiveDate) -> Self {
        self.event_date = Some(date);
        self
    }

    pub fn with_document_type(mut self, document_type: impl Into<String>) -> Self {
        self.document_type = Some(document_type.into());
        self
    }
}
