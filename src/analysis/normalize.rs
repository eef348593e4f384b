//! Normalization of raw model output into a schema-valid `Analysis`
//!
//! Model responses are expected to carry a JSON object but frequently
//! don't: they arrive wrapped in markdown fences, prefixed with prose,
//! truncated, or missing required fields. Normalization never fails.
//! It yields either a clean analysis built from the parsed fields or a
//! degraded one that keeps the raw text for manual review.
//!
//! Clean path rules:
//! - `summary` must be a non-blank string, otherwise the response degrades
//! - `confidenceScore` is clamped into `0.0..=1.0`; absent or non-numeric → 0.5
//! - sequence fields default to empty
//! - `documentType` falls back to the caller's hint, then `"unknown"`
//! - `processingTimestamp` is always the normalization instant
//!
//! Keys are accepted in camelCase or snake_case.

use crate::model::{Analysis, UNKNOWN_DOCUMENT_TYPE};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Confidence used when the model gave none, and for every degraded analysis
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Summary stored on a degraded analysis
pub const DEGRADED_SUMMARY: &str =
    "Analysis completed but the response could not be structured. The raw model output has been kept for manual review.";

/// Why a response could not be structured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradeReason {
    /// No JSON object could be found in the response
    Unparseable,
    /// A JSON object was found but had no usable summary
    MissingSummary,
}

impl std::fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unparseable => write!(f, "no JSON object in response"),
            Self::MissingSummary => write!(f, "response has no summary"),
        }
    }
}

/// Outcome of normalization: both arms hold a schema-valid analysis
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedAnalysis {
    Clean(Analysis),
    Degraded {
        analysis: Analysis,
        reason: DegradeReason,
    },
}

impl NormalizedAnalysis {
    pub fn analysis(&self) -> &Analysis {
        match self {
            Self::Clean(analysis) | Self::Degraded { analysis, .. } => analysis,
        }
    }

    pub fn into_analysis(self) -> Analysis {
        match self {
            Self::Clean(analysis) | Self::Degraded { analysis, .. } => analysis,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn degrade_reason(&self) -> Option<DegradeReason> {
        match self {
            Self::Clean(_) => None,
            Self::Degraded { reason, .. } => Some(*reason),
        }
    }
}

/// Normalize `raw`, stamping the current time
pub fn normalize(raw: &str, document_type_hint: Option<&str>) -> NormalizedAnalysis {
    normalize_at(raw, document_type_hint, Utc::now())
}

/// Normalize `raw`, stamping `now` as the processing timestamp
pub fn normalize_at(
    raw: &str,
    document_type_hint: Option<&str>,
    now: DateTime<Utc>,
) -> NormalizedAnalysis {
    let hint = document_type_hint
        .map(str::trim)
        .filter(|h| !h.is_empty());

    let parsed = match extract_json(raw) {
        Some(Value::Object(obj)) => obj,
        _ => return degraded(raw, hint, now, DegradeReason::Unparseable),
    };

    let summary = match field(&parsed, &["summary"])
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        Some(summary) => summary.to_string(),
        None => return degraded(raw, hint, now, DegradeReason::MissingSummary),
    };

    let document_type = field(&parsed, &["documentType", "document_type"])
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .or(hint)
        .unwrap_or(UNKNOWN_DOCUMENT_TYPE)
        .to_string();

    let analysis = Analysis {
        summary,
        key_facts: string_list(field(&parsed, &["keyFacts", "key_facts"])),
        legal_citations: string_list(field(&parsed, &["legalCitations", "legal_citations"])),
        extracted_tables: string_list(field(&parsed, &["extractedTables", "extracted_tables"])),
        document_type,
        confidence_score: confidence(field(&parsed, &["confidenceScore", "confidence_score"])),
        processing_timestamp: now,
        raw_response: None,
    };
    debug!(
        document_type = %analysis.document_type,
        known_type = analysis.has_known_document_type(),
        confidence = analysis.confidence_score,
        key_facts = analysis.key_facts.len(),
        "normalized model response"
    );

    NormalizedAnalysis::Clean(analysis)
}

fn degraded(
    raw: &str,
    hint: Option<&str>,
    now: DateTime<Utc>,
    reason: DegradeReason,
) -> NormalizedAnalysis {
    warn!(%reason, response_len = raw.len(), "model response degraded to fallback analysis");

    NormalizedAnalysis::Degraded {
        analysis: Analysis {
            summary: DEGRADED_SUMMARY.to_string(),
            key_facts: Vec::new(),
            legal_citations: Vec::new(),
            extracted_tables: Vec::new(),
            document_type: hint.unwrap_or(UNKNOWN_DOCUMENT_TYPE).to_string(),
            confidence_score: DEFAULT_CONFIDENCE,
            processing_timestamp: now,
            raw_response: Some(raw.to_string()),
        },
        reason,
    }
}

/// Extract a JSON object from model response text.
///
/// Tries, in order:
/// 1. Direct parse (response is pure JSON)
/// 2. The body of a ```json ... ``` or ``` ... ``` fenced block
/// 3. The span from the first `{` to the last `}`
fn extract_json(text: &str) -> Option<Value> {
    let trimmed = text.trim();

    let fenced = fenced_block(trimmed);
    let braced = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&trimmed[start..=end]),
        _ => None,
    };

    [Some(trimmed), fenced, braced]
        .into_iter()
        .flatten()
        .find_map(|candidate| {
            serde_json::from_str::<Value>(candidate.trim())
                .ok()
                .filter(Value::is_object)
        })
}

fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    // Skip the info string ("json", "JSON", ...) up to the end of the line
    let body = &after[after.find('\n')? + 1..];
    body.find("```").map(|end| &body[..end])
}

/// First non-null value among `names`
fn field<'a>(obj: &'a Map<String, Value>, names: &[&str]) -> Option<&'a Value> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find(|v| !v.is_null())
}

fn confidence(value: Option<&Value>) -> f64 {
    let score = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match score.filter(|s| s.is_finite()) {
        Some(s) => s.clamp(0.0, 1.0),
        None => DEFAULT_CONFIDENCE,
    }
}

/// Coerce a loosely typed field into an ordered list of strings.
///
/// A lone string becomes a one-element list. Nulls and blank strings are
/// dropped; numbers and booleans are stringified; nested arrays and objects
/// (tables emitted as rows, for instance) are kept as compact JSON text.
fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        None => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter_map(item_text).collect(),
        Some(other) => item_text(other).into_iter().collect(),
    }
}

fn item_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) | Value::Array(_) | Value::Object(_) => {
            Some(value.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::Rng;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 7, 4, 15, 0, 0).unwrap()
    }

    fn clean(raw: &str, hint: Option<&str>) -> Analysis {
        match normalize_at(raw, hint, at()) {
            NormalizedAnalysis::Clean(a) => a,
            other => panic!("expected clean analysis, got {:?}", other),
        }
    }

    fn degraded_reason(raw: &str) -> DegradeReason {
        normalize_at(raw, None, at())
            .degrade_reason()
            .expect("expected degraded analysis")
    }

    // --- Clean path ---

    #[test]
    fn full_payload_is_taken_as_given() {
        let raw = r#"{
            "summary": "Supply agreement between ABC Corporation and Widget LLC.",
            "keyFacts": ["Term of 24 months", "Net 30 payment"],
            "legalCitations": ["UCC § 2-207"],
            "extractedTables": ["Item | Qty\nBolts | 100"],
            "documentType": "contract",
            "confidenceScore": 0.92
        }"#;

        let a = clean(raw, None);
        assert_eq!(a.summary, "Supply agreement between ABC Corporation and Widget LLC.");
        assert_eq!(a.key_facts, vec!["Term of 24 months", "Net 30 payment"]);
        assert_eq!(a.legal_citations, vec!["UCC § 2-207"]);
        assert_eq!(a.extracted_tables, vec!["Item | Qty\nBolts | 100"]);
        assert_eq!(a.document_type, "contract");
        assert_eq!(a.confidence_score, 0.92);
        assert_eq!(a.raw_response, None);
    }

    #[test]
    fn snake_case_keys_are_accepted() {
        let a = clean(
            r#"{"summary": "s", "key_facts": ["k"], "legal_citations": ["c"],
                "extracted_tables": ["t"], "document_type": "motion", "confidence_score": 0.3}"#,
            None,
        );
        assert_eq!(a.key_facts, vec!["k"]);
        assert_eq!(a.legal_citations, vec!["c"]);
        assert_eq!(a.extracted_tables, vec!["t"]);
        assert_eq!(a.document_type, "motion");
        assert_eq!(a.confidence_score, 0.3);
    }

    #[test]
    fn confidence_above_range_clamps_to_one() {
        let a = clean(r#"{"summary": "...", "confidence_score": 1.4}"#, None);
        assert_eq!(a.confidence_score, 1.0);
    }

    #[test]
    fn confidence_below_range_clamps_to_zero() {
        let a = clean(r#"{"summary": "...", "confidenceScore": -0.2}"#, None);
        assert_eq!(a.confidence_score, 0.0);
    }

    #[test]
    fn missing_or_non_numeric_confidence_defaults() {
        assert_eq!(clean(r#"{"summary": "s"}"#, None).confidence_score, DEFAULT_CONFIDENCE);
        assert_eq!(
            clean(r#"{"summary": "s", "confidenceScore": "high"}"#, None).confidence_score,
            DEFAULT_CONFIDENCE
        );
        assert_eq!(
            clean(r#"{"summary": "s", "confidenceScore": [0.9]}"#, None).confidence_score,
            DEFAULT_CONFIDENCE
        );
    }

    #[test]
    fn numeric_string_confidence_is_numeric() {
        let a = clean(r#"{"summary": "s", "confidenceScore": " 0.75 "}"#, None);
        assert_eq!(a.confidence_score, 0.75);
    }

    #[test]
    fn random_confidences_always_land_in_range() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let score: f64 = rng.gen_range(-10.0..10.0);
            let raw = serde_json::json!({ "summary": "s", "confidenceScore": score }).to_string();
            let a = clean(&raw, None);
            assert!((0.0..=1.0).contains(&a.confidence_score), "{} escaped range", score);
            if (0.0..=1.0).contains(&score) {
                assert!((a.confidence_score - score).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn missing_sequences_become_empty() {
        let a = clean(r#"{"summary": "s", "keyFacts": null}"#, None);
        assert!(a.key_facts.is_empty());
        assert!(a.legal_citations.is_empty());
        assert!(a.extracted_tables.is_empty());
    }

    #[test]
    fn loose_sequence_items_are_coerced() {
        let a = clean(
            r#"{"summary": "s",
                "keyFacts": "Only one fact",
                "legalCitations": ["42 U.S.C. § 1983", null, "  ", 7],
                "extractedTables": [[["Date", "Amount"], ["2024-01-01", 500]]]}"#,
            None,
        );
        assert_eq!(a.key_facts, vec!["Only one fact"]);
        assert_eq!(a.legal_citations, vec!["42 U.S.C. § 1983", "7"]);
        assert_eq!(a.extracted_tables, vec![r#"[["Date","Amount"],["2024-01-01",500]]"#]);
    }

    #[test]
    fn hint_fills_absent_document_type_only() {
        assert_eq!(clean(r#"{"summary": "s"}"#, Some("evidence")).document_type, "evidence");
        assert_eq!(
            clean(r#"{"summary": "s", "documentType": "brief"}"#, Some("evidence")).document_type,
            "brief"
        );
        assert_eq!(clean(r#"{"summary": "s"}"#, None).document_type, UNKNOWN_DOCUMENT_TYPE);
        assert_eq!(clean(r#"{"summary": "s"}"#, Some("  ")).document_type, UNKNOWN_DOCUMENT_TYPE);
    }

    #[test]
    fn unrecognized_document_type_is_kept_verbatim() {
        let a = clean(r#"{"summary": "s", "documentType": "Deposition Transcript"}"#, None);
        assert_eq!(a.document_type, "Deposition Transcript");
        assert!(!a.has_known_document_type());
    }

    #[test]
    fn supplied_timestamp_is_ignored() {
        let a = clean(
            r#"{"summary": "s", "processingTimestamp": "1999-01-01T00:00:00Z"}"#,
            None,
        );
        assert_eq!(a.processing_timestamp, at());
    }

    #[test]
    fn summary_is_trimmed() {
        assert_eq!(clean(r#"{"summary": "  A short summary.  "}"#, None).summary, "A short summary.");
    }

    #[test]
    fn fenced_json_is_extracted() {
        let raw = "Here is the analysis:\n```json\n{\"summary\": \"Fenced.\", \"confidenceScore\": 0.6}\n```\nLet me know!";
        let a = clean(raw, None);
        assert_eq!(a.summary, "Fenced.");
        assert_eq!(a.confidence_score, 0.6);
    }

    #[test]
    fn json_surrounded_by_prose_is_extracted() {
        let a = clean(r#"Sure! {"summary": "Embedded."} Hope this helps."#, None);
        assert_eq!(a.summary, "Embedded.");
    }

    // --- Degraded path ---

    #[test]
    fn non_json_degrades_with_raw_text() {
        let raw = "The document appears to be a motion to dismiss.";
        let result = normalize_at(raw, Some("motion"), at());

        assert_eq!(result.degrade_reason(), Some(DegradeReason::Unparseable));
        let a = result.into_analysis();
        assert_eq!(a.summary, DEGRADED_SUMMARY);
        assert_eq!(a.confidence_score, DEFAULT_CONFIDENCE);
        assert_eq!(a.raw_response.as_deref(), Some(raw));
        assert_eq!(a.document_type, "motion");
        assert!(a.key_facts.is_empty() && a.legal_citations.is_empty() && a.extracted_tables.is_empty());
        assert_eq!(a.processing_timestamp, at());
    }

    #[test]
    fn missing_summary_degrades() {
        assert_eq!(
            degraded_reason(r#"{"keyFacts": ["a"], "confidenceScore": 0.9}"#),
            DegradeReason::MissingSummary
        );
        assert_eq!(degraded_reason(r#"{"summary": "   "}"#), DegradeReason::MissingSummary);
        assert_eq!(degraded_reason(r#"{"summary": 12}"#), DegradeReason::MissingSummary);
    }

    #[test]
    fn degraded_keeps_original_untrimmed_text() {
        let raw = "  {\"keyFacts\": []}\n";
        let a = normalize_at(raw, None, at()).into_analysis();
        assert_eq!(a.raw_response.as_deref(), Some(raw));
        assert_eq!(a.document_type, UNKNOWN_DOCUMENT_TYPE);
    }

    #[test]
    fn non_object_json_degrades() {
        assert_eq!(degraded_reason(r#"["summary", "facts"]"#), DegradeReason::Unparseable);
        assert_eq!(degraded_reason(r#""just a string""#), DegradeReason::Unparseable);
        assert_eq!(degraded_reason(""), DegradeReason::Unparseable);
    }

    #[test]
    fn truncated_json_degrades() {
        assert_eq!(
            degraded_reason(r#"{"summary": "Cut off mid"#),
            DegradeReason::Unparseable
        );
    }

    #[test]
    fn same_input_normalizes_identically() {
        let raw = r#"{"summary": "Stable.", "keyFacts": ["x"], "confidenceScore": 0.4}"#;
        assert_eq!(normalize_at(raw, None, at()), normalize_at(raw, None, at()));
    }
}
