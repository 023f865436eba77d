//! Document analysis models.

use serde::{Deserialize, Serialize};

use super::payload::DataUri;

/// Largest document accepted for analysis (5 MiB).
pub const MAX_DOCUMENT_BYTES: usize = 5 * 1024 * 1024;

/// Media types the model is asked to read.
pub const ACCEPTED_MEDIA_TYPES: [&str; 4] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

/// Classification vocabulary offered to the model. It may answer with a
/// free-form label when none fits.
pub const DOCUMENT_CATEGORIES: [&str; 5] = [
    "Legal Document",
    "User Agreement",
    "Privacy Policy",
    "Service Agreement",
    "Other",
];

pub const SUMMARY_PLACEHOLDER: &str = "Summary could not be generated.";
pub const UNKNOWN_DOCUMENT_TYPE: &str = "Unknown";

/// Raw caller input before validation.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub documents: Vec<DataUri>,
}

impl Submission {
    pub fn single(document: DataUri) -> Self {
        Self {
            documents: vec![document],
        }
    }
}

/// A submission that passed the acceptance policy.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    document: DataUri,
}

impl AnalysisRequest {
    /// Only the validator constructs requests.
    pub(crate) fn new(document: DataUri) -> Self {
        Self { document }
    }

    pub fn document(&self) -> &DataUri {
        &self.document
    }
}

/// What the model actually returned. The output schema marks every field as
/// required, but nothing guarantees the model honours it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAnalysis {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub identified_document_type: Option<String>,
    #[serde(default)]
    pub pros: Option<Vec<String>>,
    #[serde(default)]
    pub cons: Option<Vec<String>>,
}

/// Fully-populated analysis handed to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    pub document_type: String,
    pub pros: Vec<String>,
    pub cons: Vec<String>,
}
