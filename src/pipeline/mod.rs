//! Document analysis pipeline.
//!
//! Encoder → validator → request builder → extraction → normalizer, driven
//! per call by [`DocumentAnalyzer`].

pub mod cancel;
pub mod encoder;
pub mod normalizer;
pub mod orchestrator;
pub mod request_builder;
pub mod validator;

pub use cancel::{CancelHandle, CancelSignal};
pub use orchestrator::{DocumentAnalyzer, Stage};
pub use request_builder::AnalysisPrompt;
