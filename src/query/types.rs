//! Query request and result types

use crate::config::ListingDefaults;
use crate::model::{Case, Document};
use serde::{Deserialize, Serialize};

/// Pagination as supplied by a caller; any value may be missing or invalid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageRequest {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl PageRequest {
    pub fn new(page: i64, page_size: i64) -> Self {
        Self {
            page: Some(page),
            page_size: Some(page_size),
        }
    }

    /// Resolve into a valid window. Missing or non-positive values fall back
    /// to page 1 and the default page size; oversized pages are capped.
    pub fn resolve(&self, defaults: &ListingDefaults) -> Pagination {
        let max_page_size = defaults.max_page_size.max(1);
        let default_page_size = defaults.default_page_size.clamp(1, max_page_size);

        let page = self
            .page
            .and_then(|p| u64::try_from(p).ok())
            .filter(|p| *p >= 1)
            .unwrap_or(1);
        let page_size = self
            .page_size
            .and_then(|s| u64::try_from(s).ok())
            .filter(|s| *s >= 1)
            .map_or(default_page_size, |s| s.min(max_page_size));

        Pagination { page, page_size }
    }
}

/// A validated page window; both fields are at least 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
}

impl Pagination {
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.page_size)
    }

    pub fn page_count(&self, total: u64) -> u64 {
        total.div_ceil(self.page_size)
    }
}

/// One page of results. `total` and `page_count` describe the whole
/// filtered set.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub page_count: u64,
}

/// A case with its documents in timeline order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaseDetail {
    #[serde(flatten)]
    pub case: Case,
    pub documents: Vec<Document>,
}
