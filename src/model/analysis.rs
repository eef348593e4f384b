//! The structured analysis attached to a document

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Document type used when neither the model nor the caller classified it.
pub const UNKNOWN_DOCUMENT_TYPE: &str = "unknown";

/// Document types the model is prompted to choose from.
///
/// Anything else the model returns is kept verbatim; this list is advisory.
pub const KNOWN_DOCUMENT_TYPES: &[&str] = &[
    "contract",
    "motion",
    "brief",
    "evidence",
    "correspondence",
    UNKNOWN_DOCUMENT_TYPE,
];

/// Schema-valid analysis of a document.
///
/// Stored wholesale on the document: a re-analysis replaces the previous
/// value, it is never merged into it. `confidence_score` is always within
/// `0.0..=1.0`, and `raw_response` is only present when the model output
/// could not be structured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub summary: String,
    #[serde(default)]
    pub key_facts: Vec<String>,
    #[serde(default)]
    pub legal_citations: Vec<String>,
    #[serde(default)]
    pub extracted_tables: Vec<String>,
    pub document_type: String,
    pub confidence_score: f64,
    pub processing_timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl Analysis {
    /// Whether this is the fallback produced for unstructured model output
    pub fn is_degraded(&self) -> bool {
        self.raw_response.is_some()
    }

    /// Whether the document type is one of [`KNOWN_DOCUMENT_TYPES`]
    pub fn has_known_document_type(&self) -> bool {
        KNOWN_DOCUMENT_TYPES.contains(&self.document_type.as_str())
    }
}
