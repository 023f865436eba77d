//! Domain types shared by the pipeline, services and routes.

pub mod analysis;
pub mod audio;
pub mod payload;

pub use analysis::{AnalysisRequest, AnalysisResult, RawAnalysis, Submission};
pub use audio::{AudioFormat, AudioRequest, AudioResult};
pub use payload::DataUri;
