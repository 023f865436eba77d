//! Document analysis endpoints.
//!
//! Both endpoints feed the same pipeline; they differ only in how the
//! document arrives (data URI in JSON, or a multipart upload).

use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        rejection::JsonRejection,
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::Instrument;

use crate::api::DataResponse;
use crate::app::AppState;
use crate::domain::analysis::MAX_DOCUMENT_BYTES;
use crate::domain::{AnalysisResult, DataUri, Submission};
use crate::error::{ApiError, ApiResult, EncodeError, InputError};
use crate::middleware::RequestId;
use crate::pipeline::encoder;

/// Multipart field names that carry a document.
const DOCUMENT_FIELDS: [&str; 2] = ["file", "document"];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub document_data_uri: Option<String>,
}

/// Analyze a document sent as a data URI.
///
/// POST /v1/analyze
pub async fn analyze_document(
    State(state): State<Arc<AppState>>,
    request_id: RequestId,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Response {
    let submission = match body {
        Ok(Json(req)) => parse_submission(req),
        // A body over the request limit cannot hold an acceptable document
        Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            Err(InputError::FileTooLarge {
                size: state.settings.max_request_bytes,
                limit: MAX_DOCUMENT_BYTES,
            }
            .into())
        }
        Err(rejection) => Err(rejection.into()),
    };

    let result = match submission {
        Ok(submission) => run_analysis(&state, &request_id, submission).await,
        Err(e) => Err(e),
    };

    respond(result, request_id)
}

/// Analyze a document sent as a multipart upload.
///
/// POST /v1/analyze/upload
pub async fn upload_document(
    State(state): State<Arc<AppState>>,
    request_id: RequestId,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let submission = match multipart {
        Ok(mut multipart) => {
            read_documents(&mut multipart, state.settings.max_request_bytes).await
        }
        Err(rejection) => Err(ApiError::BadRequest(rejection.body_text())),
    };

    let result = match submission {
        Ok(submission) => run_analysis(&state, &request_id, submission).await,
        Err(e) => Err(e),
    };

    respond(result, request_id)
}

fn parse_submission(req: AnalyzeRequest) -> ApiResult<Submission> {
    match req.document_data_uri.as_deref().map(DataUri::parse) {
        None => Ok(Submission::default()),
        Some(Ok(document)) => Ok(Submission::single(document)),
        Some(Err(e)) => Err(e.into()),
    }
}

async fn run_analysis(
    state: &AppState,
    request_id: &RequestId,
    submission: Submission,
) -> ApiResult<AnalysisResult> {
    let span = tracing::info_span!(
        "analyze",
        request_id = request_id.as_deref().unwrap_or("-")
    );

    async move {
        tracing::info!(documents = submission.documents.len(), "Analysis requested");
        state
            .analyzer
            .analyze(submission, &state.shutdown)
            .await
            .map_err(Into::into)
    }
    .instrument(span)
    .await
}

/// Document parts collected from an upload. Parts above the size ceiling
/// are drained and counted but never buffered.
#[derive(Default)]
struct Upload {
    documents: Vec<DataUri>,
    oversized: Vec<usize>,
}

impl Upload {
    /// Same precedence as the validator: cardinality before size.
    fn into_submission(self) -> Result<Submission, InputError> {
        let count = self.documents.len() + self.oversized.len();
        if count > 1 {
            return Err(InputError::TooManyDocuments { count });
        }
        match self.oversized.first() {
            Some(&size) => Err(InputError::FileTooLarge {
                size,
                limit: MAX_DOCUMENT_BYTES,
            }),
            None => Ok(Submission {
                documents: self.documents,
            }),
        }
    }
}

enum PartBody {
    Complete(Vec<u8>),
    Oversized(usize),
    /// The request body limit cut the part off.
    Truncated,
}

/// Collect every document part. Other fields are ignored. Once the body
/// limit cuts the request off, the part being read counts as oversized and
/// is reported at the limit.
async fn read_documents(multipart: &mut Multipart, body_limit: usize) -> ApiResult<Submission> {
    let mut upload = Upload::default();

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) if is_body_limit(&e) => {
                upload.oversized.push(body_limit);
                break;
            }
            Err(e) => return Err(EncodeError::Upload(e.body_text()).into()),
        };

        let is_document = field
            .name()
            .is_some_and(|name| DOCUMENT_FIELDS.contains(&name));
        if !is_document {
            continue;
        }

        let declared_type = field
            .content_type()
            .map(|ct| ct.to_string())
            .or_else(|| field.file_name().map(encoder::guess_media_type))
            .unwrap_or_else(|| "application/octet-stream".to_string());

        match read_part(&mut field).await? {
            PartBody::Complete(bytes) => upload
                .documents
                .push(encoder::encode_bytes(&declared_type, bytes)),
            PartBody::Oversized(size) => upload.oversized.push(size),
            PartBody::Truncated => {
                upload.oversized.push(body_limit);
                break;
            }
        }
    }

    upload.into_submission().map_err(ApiError::from)
}

/// Buffer a part up to the document ceiling; past it, only count bytes.
async fn read_part(field: &mut Field<'_>) -> Result<PartBody, EncodeError> {
    let mut bytes = Vec::new();
    let mut size = 0usize;

    loop {
        match field.chunk().await {
            Ok(Some(chunk)) => {
                size += chunk.len();
                if size <= MAX_DOCUMENT_BYTES {
                    bytes.extend_from_slice(&chunk);
                } else if !bytes.is_empty() {
                    bytes = Vec::new();
                }
            }
            Ok(None) => break,
            Err(e) if is_body_limit(&e) => return Ok(PartBody::Truncated),
            Err(e) => return Err(EncodeError::Upload(e.body_text())),
        }
    }

    if size > MAX_DOCUMENT_BYTES {
        Ok(PartBody::Oversized(size))
    } else {
        Ok(PartBody::Complete(bytes))
    }
}

fn is_body_limit(e: &MultipartError) -> bool {
    e.status() == StatusCode::PAYLOAD_TOO_LARGE
}

fn respond(result: ApiResult<AnalysisResult>, request_id: RequestId) -> Response {
    match result {
        Ok(analysis) => DataResponse::with_request_id(analysis, request_id.0).into_response(),
        Err(e) => e.into_response_with_request_id(request_id.0),
    }
}
