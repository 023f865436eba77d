//! Self-describing encoded payloads (`data:<media-type>;base64,<payload>`).

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::error::InputError;

const SCHEME: &str = "data:";
const BASE64_MARKER: &str = ";base64";

/// Binary content paired with the media type its producer declared.
#[derive(Clone, PartialEq, Eq)]
pub struct DataUri {
    media_type: String,
    bytes: Vec<u8>,
}

impl DataUri {
    pub fn new(media_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Decode a `data:` URI. Only base64-encoded URIs are accepted.
    pub fn parse(input: &str) -> Result<Self, InputError> {
        let rest = input
            .trim()
            .strip_prefix(SCHEME)
            .ok_or_else(|| malformed("missing 'data:' prefix"))?;

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| malformed("missing ',' separator"))?;

        let media_type = header
            .strip_suffix(BASE64_MARKER)
            .ok_or_else(|| malformed("payload must be base64-encoded"))?;

        if media_type.is_empty() || !media_type.contains('/') {
            return Err(malformed("missing media type"));
        }

        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| malformed(&format!("invalid base64: {e}")))?;

        Ok(Self::new(media_type, bytes))
    }

    /// Media type exactly as declared, parameters included.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Lower-cased `type/subtype` without parameters.
    pub fn essence(&self) -> String {
        self.media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Base64 of the payload alone, as sent in inline attachments.
    pub fn base64_data(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

fn malformed(reason: &str) -> InputError {
    InputError::MalformedPayload(reason.to_string())
}

impl fmt::Display for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SCHEME}{}{BASE64_MARKER},{}",
            self.media_type,
            self.base64_data()
        )
    }
}

// Payloads can be megabytes; keep them out of debug logs.
impl fmt::Debug for DataUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataUri")
            .field("media_type", &self.media_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Serialize for DataUri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DataUri {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DataUri::parse(&raw).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_conventional_data_uri() {
        let uri = DataUri::new("text/plain", b"hello".to_vec());
        assert_eq!(uri.to_string(), "data:text/plain;base64,aGVsbG8=");
    }

    #[test]
    fn decoding_reproduces_bytes_and_media_type() {
        let bytes: Vec<u8> = (0..=255u8).chain([0, 0, 255]).collect();
        let original = DataUri::new("application/pdf", bytes.clone());

        let decoded = DataUri::parse(&original.to_string()).unwrap();

        assert_eq!(decoded.bytes(), bytes.as_slice());
        assert_eq!(decoded.media_type(), "application/pdf");
        assert_eq!(decoded, original);
    }

    #[test]
    fn parameters_are_kept_but_excluded_from_essence() {
        let uri = DataUri::parse("data:Text/Plain;charset=utf-8;base64,aGk=").unwrap();
        assert_eq!(uri.media_type(), "Text/Plain;charset=utf-8");
        assert_eq!(uri.essence(), "text/plain");
        assert_eq!(uri.bytes(), b"hi");
    }

    #[test]
    fn rejects_malformed_uris() {
        for input in [
            "text/plain;base64,aGk=",
            "data:text/plain;base64",
            "data:text/plain,hi",
            "data:;base64,aGk=",
            "data:text/plain;base64,***",
        ] {
            let err = DataUri::parse(input).unwrap_err();
            assert!(
                matches!(err, InputError::MalformedPayload(_)),
                "{input} -> {err:?}"
            );
        }
    }

    #[test]
    fn serde_uses_the_string_form() {
        let uri = DataUri::new("text/plain", b"hi".to_vec());
        let json = serde_json::to_string(&uri).unwrap();
        assert_eq!(json, "\"data:text/plain;base64,aGk=\"");

        let back: DataUri = serde_json::from_str(&json).unwrap();
        assert_eq!(back, uri);
    }

    #[test]
    fn debug_output_omits_content() {
        let uri = DataUri::new("text/plain", vec![b'x'; 4096]);
        let debug = format!("{uri:?}");
        assert!(debug.contains("4096"));
        assert!(!debug.contains("eHh4"));
    }
}
