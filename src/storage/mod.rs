//! Storage backends for cases and documents
//!
//! Backends implement the `CaseStore` trait. The primary implementation is
//! `SqliteStore` for persistent storage.

mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{
    CaseFilter, CaseStore, CaseSummary, CaseWindow, OpenStore, StorageError, StorageResult,
};
