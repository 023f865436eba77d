//! Fill safe defaults for whatever the model left out.

use crate::domain::analysis::{SUMMARY_PLACEHOLDER, UNKNOWN_DOCUMENT_TYPE};
use crate::domain::{AnalysisResult, RawAnalysis};

/// Present values pass through untouched. Missing, null and empty strings
/// fall back to the defaults; missing lists become empty.
pub fn normalize(raw: RawAnalysis) -> AnalysisResult {
    AnalysisResult {
        summary: non_empty_or(raw.summary, SUMMARY_PLACEHOLDER),
        document_type: non_empty_or(raw.identified_document_type, UNKNOWN_DOCUMENT_TYPE),
        pros: raw.pros.unwrap_or_default(),
        cons: raw.cons.unwrap_or_default(),
    }
}

fn non_empty_or(value: Option<String>, default: &str) -> String {
    value
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}
