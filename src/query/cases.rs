//! Case listings and case timelines

use super::types::{CaseDetail, Page, PageRequest};
use crate::config::ListingDefaults;
use crate::error::{CaseFileError, CaseFileResult};
use crate::model::CaseId;
use crate::storage::{CaseFilter, CaseStore, CaseSummary};
use std::sync::Arc;
use tracing::debug;

/// Read-side service over the case store.
///
/// Never fails on bad pagination input; document counts are computed live
/// by the store on every listing.
#[derive(Clone)]
pub struct CaseQueryService {
    store: Arc<dyn CaseStore>,
    defaults: ListingDefaults,
}

impl CaseQueryService {
    pub fn new(store: Arc<dyn CaseStore>, defaults: ListingDefaults) -> Self {
        Self { store, defaults }
    }

    /// List cases newest first, filtered and paginated
    pub fn list_cases(
        &self,
        request: PageRequest,
        filter: &CaseFilter,
    ) -> CaseFileResult<Page<CaseSummary>> {
        let pagination = request.resolve(&self.defaults);
        let window = self
            .store
            .list_cases(filter, pagination.page_size, pagination.offset())?;

        debug!(
            page = pagination.page,
            page_size = pagination.page_size,
            total = window.total,
            search = filter.search.as_deref().unwrap_or(""),
            "listed cases"
        );

        Ok(Page {
            items: window.items,
            total: window.total,
            page: pagination.page,
            page_size: pagination.page_size,
            page_count: pagination.page_count(window.total),
        })
    }

    /// A case with its chronological document timeline
    pub fn get_case(&self, id: CaseId) -> CaseFileResult<CaseDetail> {
        let (case, documents) = self
            .store
            .get_case_with_documents(id)?
            .ok_or_else(|| CaseFileError::NotFound(format!("case {}", id)))?;

        Ok(CaseDetail { case, documents })
    }
}
