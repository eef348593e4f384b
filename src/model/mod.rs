//! Core record types: cases, documents and their analyses

mod analysis;
mod case;
mod document;

pub use analysis::{Analysis, KNOWN_DOCUMENT_TYPES, UNKNOWN_DOCUMENT_TYPE};
pub use case::{Case, CaseId, CaseUpdate, NewCase, DEFAULT_STATUS};
pub use document::{Document, DocumentId, NewDocument};
