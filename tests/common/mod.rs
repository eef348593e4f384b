//! Shared fixtures for integration tests

use casefile::{CaseFileApi, ListingDefaults, OpenStore, SqliteStore};
use std::path::Path;
use std::sync::Arc;

/// An API over a fresh in-memory store
#[allow(dead_code)]
pub fn memory_api() -> CaseFileApi {
    let store = SqliteStore::open_in_memory().expect("in-memory store should open");
    CaseFileApi::new(Arc::new(store), ListingDefaults::default())
}

/// An API over an on-disk store at `path`
#[allow(dead_code)]
pub fn file_api(path: &Path) -> CaseFileApi {
    let store = SqliteStore::open(path).expect("file store should open");
    CaseFileApi::new(Arc::new(store), ListingDefaults::default())
}

/// A well-formed model response with the given summary and confidence
#[allow(dead_code)]
pub fn response(summary: &str, confidence: f64) -> String {
    serde_json::json!({
        "summary": summary,
        "keyFacts": ["Signed 2024-01-10"],
        "legalCitations": [],
        "documentType": "contract",
        "confidenceScore": confidence,
    })
    .to_string()
}
