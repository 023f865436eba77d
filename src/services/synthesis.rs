//! Text-to-speech seam. Only a placeholder backend exists for now.

use async_trait::async_trait;

use crate::domain::{AudioRequest, AudioResult};
use crate::error::SynthesisError;

const PREVIEW_CHARS: usize = 100;

/// Converts text to encoded audio. Real backends return the same two-branch
/// result, so callers do not change when one is plugged in.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, request: &AudioRequest) -> AudioResult;
}

/// Reports synthesis as unavailable for every non-empty text.
#[derive(Debug, Clone, Default)]
pub struct UnavailableSynthesizer;

impl UnavailableSynthesizer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SpeechSynthesizer for UnavailableSynthesizer {
    async fn synthesize(&self, request: &AudioRequest) -> AudioResult {
        if request.text.trim().is_empty() {
            return SynthesisError::EmptyText.into();
        }

        let preview: String = request.text.chars().take(PREVIEW_CHARS).collect();
        tracing::debug!(preview = %preview, "Text-to-speech requested");
        tracing::warn!("Text-to-speech backend is not configured");

        SynthesisError::Unavailable.into()
    }
}
