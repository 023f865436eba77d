//! Acceptance policy applied before any network use.

use crate::domain::analysis::{ACCEPTED_MEDIA_TYPES, MAX_DOCUMENT_BYTES};
use crate::domain::{AnalysisRequest, DataUri, Submission};
use crate::error::InputError;

/// Check a submission and turn it into an analysis request. Rules run in a
/// fixed order and the first violation is reported.
pub fn validate(submission: Submission) -> Result<AnalysisRequest, InputError> {
    let mut documents = submission.documents;

    let document = match documents.len() {
        0 => return Err(InputError::MissingDocument),
        1 => documents.remove(0),
        count => return Err(InputError::TooManyDocuments { count }),
    };

    check_size(&document)?;
    check_media_type(&document)?;

    Ok(AnalysisRequest::new(document))
}

fn check_size(document: &DataUri) -> Result<(), InputError> {
    if document.len() > MAX_DOCUMENT_BYTES {
        return Err(InputError::FileTooLarge {
            size: document.len(),
            limit: MAX_DOCUMENT_BYTES,
        });
    }
    if document.is_empty() {
        return Err(InputError::EmptyDocument);
    }
    Ok(())
}

fn check_media_type(document: &DataUri) -> Result<(), InputError> {
    let essence = document.essence();
    if ACCEPTED_MEDIA_TYPES.contains(&essence.as_str()) {
        Ok(())
    } else {
        Err(InputError::UnsupportedType {
            media_type: document.media_type().to_string(),
        })
    }
}
