//! Casefile: legal case tracking with AI document analysis ingestion
//!
//! Tracks cases and their documents, and attaches analyses produced by an
//! external language model to documents.
//!
//! # Core Concepts
//!
//! - **Cases**: legal matters owning zero or more documents
//! - **Documents**: file-backed records with an optional analysis
//! - **Analyses**: schema-valid structured output, normalized from whatever
//!   text the model returned; unusable output becomes a degraded analysis
//!   instead of an error
//!
//! # Example
//!
//! ```
//! use casefile::{CaseFileApi, ListingDefaults, NewCase, NewDocument, OpenStore, SqliteStore};
//! use std::sync::Arc;
//!
//! let store = SqliteStore::open_in_memory().unwrap();
//! let api = CaseFileApi::new(Arc::new(store), ListingDefaults::default());
//!
//! let case = api.create_case(NewCase::new("Contract Dispute Resolution", "ABC Corporation")).unwrap();
//! let doc = api.create_document(NewDocument::new(case.id, "Initial_Contract_2024.pdf")).unwrap();
//! let analysis = api.ingest(doc.id, r#"{"summary": "A supply contract.", "confidence_score": 1.4}"#, None).unwrap();
//! assert_eq!(analysis.confidence_score, 1.0);
//! ```

pub mod analysis;
mod api;
pub mod config;
mod error;
mod model;
pub mod query;
pub mod storage;

pub use analysis::{normalize, AnalysisIngestor, DegradeReason, NormalizedAnalysis};
pub use api::CaseFileApi;
pub use config::{Config, ConfigError, ListingDefaults};
pub use error::{CaseFileError, CaseFileResult};
pub use model::{
    Analysis, Case, CaseId, CaseUpdate, Document, DocumentId, NewCase, NewDocument,
    DEFAULT_STATUS, KNOWN_DOCUMENT_TYPES, UNKNOWN_DOCUMENT_TYPE,
};
pub use query::{CaseDetail, Page, PageRequest};
pub use storage::{CaseFilter, CaseStore, CaseSummary, OpenStore, SqliteStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
