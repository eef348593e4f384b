//! Model response handling: normalization and ingestion

mod ingest;
mod normalize;

pub use ingest::AnalysisIngestor;
pub use normalize::{
    normalize, normalize_at, DegradeReason, NormalizedAnalysis, DEFAULT_CONFIDENCE,
    DEGRADED_SUMMARY,
};
