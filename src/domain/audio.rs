//! Text-to-speech request/response contract.

use serde::{Deserialize, Serialize};

use super::payload::DataUri;
use crate::error::SynthesisError;

#[derive(Debug, Clone, Deserialize)]
pub struct AudioRequest {
    #[serde(default)]
    pub text: String,
}

impl AudioRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Either encoded audio or a human-readable reason there is none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AudioResult {
    Success {
        #[serde(rename = "audioDataUri")]
        audio: DataUri,
    },
    Failure {
        #[serde(rename = "errorMessage")]
        error_message: String,
    },
}

impl AudioResult {
    pub fn success(audio: DataUri) -> Self {
        Self::Success { audio }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn audio(&self) -> Option<&DataUri> {
        match self {
            Self::Success { audio } => Some(audio),
            Self::Failure { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { error_message } => Some(error_message),
        }
    }
}

impl From<SynthesisError> for AudioResult {
    fn from(e: SynthesisError) -> Self {
        Self::Failure {
            error_message: e.to_string(),
        }
    }
}

/// Container formats recognizable from their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Wav,
    Mp3,
    Ogg,
    Flac,
}

impl AudioFormat {
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => Some(Self::Wav),
            [b'I', b'D', b'3', ..] => Some(Self::Mp3),
            // MPEG audio frame sync: 11 set bits
            [0xFF, second, ..] if second & 0xE0 == 0xE0 => Some(Self::Mp3),
            [b'O', b'g', b'g', b'S', ..] => Some(Self::Ogg),
            [b'f', b'L', b'a', b'C', ..] => Some(Self::Flac),
            _ => None,
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            Self::Wav => "audio/wav",
            Self::Mp3 => "audio/mpeg",
            Self::Ogg => "audio/ogg",
            Self::Flac => "audio/flac",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_serializes_with_error_message_only() {
        let result = AudioResult::from(SynthesisError::Unavailable);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "errorMessage": "Text-to-Speech feature is not available." })
        );
    }

    #[test]
    fn success_serializes_audio_as_data_uri() {
        let result = AudioResult::success(DataUri::new("audio/mpeg", b"ID3".to_vec()));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["audioDataUri"], "data:audio/mpeg;base64,SUQz");
        assert!(json.get("errorMessage").is_none());
    }

    #[test]
    fn sniffs_common_containers() {
        assert_eq!(
            AudioFormat::sniff(b"RIFF\x24\x00\x00\x00WAVEfmt "),
            Some(AudioFormat::Wav)
        );
        assert_eq!(AudioFormat::sniff(b"ID3\x04"), Some(AudioFormat::Mp3));
        assert_eq!(AudioFormat::sniff(&[0xFF, 0xFB, 0x90]), Some(AudioFormat::Mp3));
        assert_eq!(AudioFormat::sniff(b"OggS\x00"), Some(AudioFormat::Ogg));
        assert_eq!(AudioFormat::sniff(b"fLaC"), Some(AudioFormat::Flac));
        assert_eq!(AudioFormat::sniff(b"%PDF-1.7"), None);
        assert_eq!(AudioFormat::sniff(b"RIFF"), None);
    }
}
