//! Entry point that runs one submission through the pipeline.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::domain::{AnalysisResult, DataUri, Submission};
use crate::error::{AnalysisError, ExtractionError};
use crate::pipeline::cancel::CancelSignal;
use crate::pipeline::{normalizer, request_builder, validator};
use crate::services::extraction::{ExtractionOutcome, StructuredExtractor};

/// Where a single analysis currently is. Not kept across calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Validating,
    Building,
    Extracting,
    Normalizing,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Building => "building",
            Self::Extracting => "extracting",
            Self::Normalizing => "normalizing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Per-call stage tracker.
struct Run {
    stage: Stage,
    started: Instant,
}

impl Run {
    fn start() -> Self {
        Self {
            stage: Stage::Idle,
            started: Instant::now(),
        }
    }

    fn advance(&mut self, next: Stage) {
        debug!(from = %self.stage, to = %next, "Analysis stage");
        self.stage = next;
    }

    fn fail(&mut self, err: AnalysisError) -> AnalysisError {
        let failed_in = self.stage;
        self.stage = Stage::Failed;
        let elapsed_ms = self.started.elapsed().as_millis() as u64;

        match &err {
            AnalysisError::Input(e) => {
                warn!(stage = %failed_in, code = e.code(), error = %e, elapsed_ms, "Submission rejected");
            }
            AnalysisError::Extraction(e) => {
                error!(stage = %failed_in, code = e.code(), error = %e, elapsed_ms, "Analysis failed");
            }
        }
        err
    }
}

/// Sequences validate → build → extract → normalize for each submission.
#[derive(Clone)]
pub struct DocumentAnalyzer {
    extractor: Arc<dyn StructuredExtractor>,
    deadline: Duration,
}

impl DocumentAnalyzer {
    pub fn new(extractor: Arc<dyn StructuredExtractor>, deadline: Duration) -> Self {
        Self {
            extractor,
            deadline,
        }
    }

    pub fn extractor(&self) -> &Arc<dyn StructuredExtractor> {
        &self.extractor
    }

    /// Analyze one submission. Input problems are reported before the model
    /// is contacted; a result is returned only when every stage succeeded.
    pub async fn analyze(
        &self,
        submission: Submission,
        cancel: &CancelSignal,
    ) -> Result<AnalysisResult, AnalysisError> {
        let mut run = Run::start();

        run.advance(Stage::Validating);
        let request = validator::validate(submission).map_err(|e| run.fail(e.into()))?;

        run.advance(Stage::Building);
        let prompt = request_builder::build_prompt(&request);

        run.advance(Stage::Extracting);
        let raw = self
            .extract(&prompt, cancel)
            .await
            .map_err(|e| run.fail(e.into()))?;

        run.advance(Stage::Normalizing);
        let result = normalizer::normalize(raw);

        run.advance(Stage::Done);
        info!(
            media_type = %request.document().essence(),
            size_bytes = request.document().len(),
            document_type = %result.document_type,
            pros = result.pros.len(),
            cons = result.cons.len(),
            elapsed_ms = run.started.elapsed().as_millis() as u64,
            "Analysis complete"
        );

        Ok(result)
    }

    /// Optional-result form: `None` means the analysis could not be
    /// completed. The cause is logged, not returned.
    pub async fn analyze_document(&self, document: DataUri) -> Option<AnalysisResult> {
        self.analyze(Submission::single(document), &CancelSignal::never())
            .await
            .ok()
    }

    async fn extract(
        &self,
        prompt: &request_builder::AnalysisPrompt,
        cancel: &CancelSignal,
    ) -> ExtractionOutcome {
        let mut cancel = cancel.clone();
        if cancel.is_cancelled() {
            return Err(ExtractionError::Cancelled);
        }

        tokio::select! {
            outcome = tokio::time::timeout(self.deadline, self.extractor.invoke(prompt)) => {
                outcome.unwrap_or(Err(ExtractionError::TimedOut { after: self.deadline }))
            }
            _ = cancel.cancelled() => Err(ExtractionError::Cancelled),
        }
    }
}
