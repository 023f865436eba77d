//! Service layer modules for external integrations.
//!
//! Contains the structured-extraction seam with its Gemini client, and the
//! speech synthesis seam with its placeholder backend.

pub mod extraction;
pub mod gemini;
pub mod synthesis;

pub use extraction::{ExtractionOutcome, StructuredExtractor};
pub use gemini::{GeminiClient, GeminiConfig};
pub use synthesis::{SpeechSynthesizer, UnavailableSynthesizer};
