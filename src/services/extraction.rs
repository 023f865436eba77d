//! Seam between the pipeline and the generative model.

use async_trait::async_trait;

use crate::domain::RawAnalysis;
use crate::error::ExtractionError;
use crate::pipeline::request_builder::AnalysisPrompt;

/// Result of one model invocation. Only lives until normalization.
pub type ExtractionOutcome = Result<RawAnalysis, ExtractionError>;

/// A structured-generation capability: given an instruction, an attached
/// document and an output schema, return data shaped by that schema.
///
/// Implementations make exactly one round trip per `invoke` and never retry.
/// Conformance to the schema is best effort; callers normalize the output.
#[async_trait]
pub trait StructuredExtractor: Send + Sync {
    async fn invoke(&self, prompt: &AnalysisPrompt) -> ExtractionOutcome;

    /// Cheap reachability probe for health reporting.
    async fn health_check(&self) -> Result<(), ExtractionError> {
        Ok(())
    }
}
