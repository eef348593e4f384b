//! Transport-independent API layer.
//!
//! `CaseFileApi` is the single entry point for collaborators (upload
//! handlers, API routes, the CLI). They never reach into the store, the
//! ingestor or the query service directly. Every method returns plain data
//! values or a [`CaseFileError`]; store failures are logged here, once, and
//! passed through without retry.

use std::sync::Arc;

use crate::analysis::AnalysisIngestor;
use crate::config::ListingDefaults;
use crate::error::{CaseFileError, CaseFileResult};
use crate::model::{Analysis, Case, CaseId, CaseUpdate, Document, DocumentId, NewCase, NewDocument};
use crate::query::{CaseDetail, CaseQueryService, Page, PageRequest};
use crate::storage::{CaseFilter, CaseStore, CaseSummary};
use tracing::{error, info};

/// Single entry point for all consumer-facing operations.
#[derive(Clone)]
pub struct CaseFileApi {
    store: Arc<dyn CaseStore>,
    ingestor: AnalysisIngestor,
    queries: CaseQueryService,
}

impl CaseFileApi {
    /// Create a new API instance over a store.
    pub fn new(store: Arc<dyn CaseStore>, listing: ListingDefaults) -> Self {
        Self {
            ingestor: AnalysisIngestor::new(store.clone()),
            queries: CaseQueryService::new(store.clone(), listing),
            store,
        }
    }

    // --- Cases ---

    pub fn create_case(&self, new: NewCase) -> CaseFileResult<Case> {
        let case = surface("create_case", self.store.create_case(&new).map_err(CaseFileError::from))?;
        info!(case_id = %case.id, "created case");
        Ok(case)
    }

    pub fn update_case(&self, id: CaseId, update: CaseUpdate) -> CaseFileResult<Case> {
        surface("update_case", self.store.update_case(id, &update).map_err(CaseFileError::from))
    }

    /// Delete a case together with all of its documents
    pub fn delete_case(&self, id: CaseId) -> CaseFileResult<()> {
        let documents = surface("delete_case", self.store.delete_case(id).map_err(CaseFileError::from))?;
        info!(case_id = %id, documents, "deleted case");
        Ok(())
    }

    /// Paginated, searchable case listing with live document counts
    pub fn list_cases(
        &self,
        request: PageRequest,
        filter: &CaseFilter,
    ) -> CaseFileResult<Page<CaseSummary>> {
        surface("list_cases", self.queries.list_cases(request, filter))
    }

    /// A case and its documents ordered as a timeline
    pub fn get_case(&self, id: CaseId) -> CaseFileResult<CaseDetail> {
        surface("get_case", self.queries.get_case(id))
    }

    // --- Documents ---

    pub fn create_document(&self, new: NewDocument) -> CaseFileResult<Document> {
        let document = surface(
            "create_document",
            self.store.create_document(&new).map_err(CaseFileError::from),
        )?;
        info!(document_id = %document.id, case_id = %document.case_id, "created document");
        Ok(document)
    }

    pub fn get_document(&self, id: DocumentId) -> CaseFileResult<Document> {
        surface(
            "get_document",
            self.store
                .get_document(id)
                .map_err(CaseFileError::from)
                .and_then(|doc| doc.ok_or_else(|| CaseFileError::NotFound(format!("document {}", id)))),
        )
    }

    pub fn delete_document(&self, id: DocumentId) -> CaseFileResult<()> {
        surface("delete_document", self.store.delete_document(id).map_err(CaseFileError::from))?;
        info!(document_id = %id, "deleted document");
        Ok(())
    }

    /// Documents still waiting for an analysis, oldest first
    pub fn pending_documents(&self, limit: u64) -> CaseFileResult<Vec<Document>> {
        surface(
            "pending_documents",
            self.store.list_pending_documents(limit).map_err(CaseFileError::from),
        )
    }

    // --- Analysis ---

    /// Normalize a raw model response and attach it to a document.
    ///
    /// Malformed responses are stored as a degraded analysis rather than
    /// rejected; only a missing document or a store failure is an error.
    pub fn ingest(
        &self,
        document_id: DocumentId,
        raw_response: &str,
        document_type_hint: Option<&str>,
    ) -> CaseFileResult<Analysis> {
        surface(
            "ingest",
            self.ingestor.ingest(document_id, raw_response, document_type_hint),
        )
    }
}

/// Log store failures at the boundary; caller-actionable errors pass quietly.
fn surface<T>(operation: &str, result: CaseFileResult<T>) -> CaseFileResult<T> {
    if let Err(CaseFileError::Store(err)) = &result {
        error!(operation, error = %err, "store operation failed");
    }
    result
}
