//! Attaching normalized analyses to documents
//!
//! Ingestion steps:
//! 1. Look up the document (fails with `NotFound`, nothing written)
//! 2. Normalize the raw model response, outside any store lock
//! 3. Replace the document's analysis in a single atomic store write
//! 4. Return the analysis as read back from the store
//!
//! Re-ingesting is safe: the same response yields the same analysis apart
//! from its processing timestamp. Concurrent ingests of one document resolve
//! last-write-wins at the store; a document deleted between steps 1 and 3
//! surfaces as `NotFound`.

use super::normalize::normalize_at;
use crate::error::{CaseFileError, CaseFileResult};
use crate::model::{Analysis, DocumentId};
use crate::storage::CaseStore;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

/// Applies model responses to documents through the store's analysis write path.
#[derive(Clone)]
pub struct AnalysisIngestor {
    store: Arc<dyn CaseStore>,
}

impl AnalysisIngestor {
    pub fn new(store: Arc<dyn CaseStore>) -> Self {
        Self { store }
    }

    /// Ingest `raw_response` for a document.
    ///
    /// Without an explicit hint, the document's current type is used as one.
    pub fn ingest(
        &self,
        document_id: DocumentId,
        raw_response: &str,
        document_type_hint: Option<&str>,
    ) -> CaseFileResult<Analysis> {
        self.ingest_at(document_id, raw_response, document_type_hint, Utc::now())
    }

    /// Same as [`ingest`](Self::ingest) with an explicit processing timestamp
    pub fn ingest_at(
        &self,
        document_id: DocumentId,
        raw_response: &str,
        document_type_hint: Option<&str>,
        now: DateTime<Utc>,
    ) -> CaseFileResult<Analysis> {
        let document = self
            .store
            .get_document(document_id)?
            .ok_or_else(|| CaseFileError::NotFound(format!("document {}", document_id)))?;

        let hint = document_type_hint
            .filter(|h| !h.trim().is_empty())
            .or(document.document_type.as_deref());
        let normalized = normalize_at(raw_response, hint, now);
        let degraded = normalized.is_degraded();

        let stored = self
            .store
            .update_document_analysis(document_id, normalized.analysis())?;
        let analysis = stored
            .ai_analysis
            .unwrap_or_else(|| normalized.into_analysis());

        info!(
            document_id = %document_id,
            case_id = %stored.case_id,
            degraded,
            document_type = %analysis.document_type,
            confidence = analysis.confidence_score,
            "ingested analysis"
        );

        Ok(analysis)
    }
}
