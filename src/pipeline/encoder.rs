//! Turn files and uploads into `DataUri` payloads.

use std::path::Path;

use crate::domain::DataUri;
use crate::error::EncodeError;

const FALLBACK_MEDIA_TYPE: &str = "application/octet-stream";

/// Media type for a file name, judged by its extension.
pub fn guess_media_type(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_raw()
        .unwrap_or(FALLBACK_MEDIA_TYPE)
        .to_string()
}

/// Encode bytes that are already in memory under their declared type.
pub fn encode_bytes(declared_type: &str, bytes: impl Into<Vec<u8>>) -> DataUri {
    DataUri::new(declared_type, bytes)
}

/// Read a whole file and encode it. The media type defaults to a guess from
/// the extension when the caller declares none.
pub async fn encode_file(path: &Path, declared_type: Option<&str>) -> Result<DataUri, EncodeError> {
    let bytes = tokio::fs::read(path).await.map_err(|source| EncodeError::Read {
        name: path.display().to_string(),
        source,
    })?;

    let media_type = match declared_type {
        Some(media_type) => media_type.to_string(),
        None => guess_media_type(&path.to_string_lossy()),
    };

    tracing::debug!(
        path = %path.display(),
        media_type = %media_type,
        size_bytes = bytes.len(),
        "Encoded document"
    );

    Ok(DataUri::new(media_type, bytes))
}
