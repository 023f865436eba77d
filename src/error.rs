//! Error taxonomy for the analysis pipeline and its HTTP boundary.
//!
//! Domain errors stay tagged all the way to the boundary so callers can tell
//! bad input (fix and resubmit) from a failing model service (retry later).

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

/// Submission rejected before any network use.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("No document was provided")]
    MissingDocument,

    #[error("Only one document can be analyzed at a time (got {count})")]
    TooManyDocuments { count: usize },

    #[error("Document exceeds the {limit}-byte maximum (received {size} bytes)")]
    FileTooLarge { size: usize, limit: usize },

    #[error("Document is empty")]
    EmptyDocument,

    #[error("Unsupported document type '{media_type}'; accepted: PDF, DOC, DOCX, TXT")]
    UnsupportedType { media_type: String },

    #[error("Malformed document payload: {0}")]
    MalformedPayload(String),
}

impl InputError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingDocument => "MISSING_DOCUMENT",
            Self::TooManyDocuments { .. } => "TOO_MANY_DOCUMENTS",
            Self::FileTooLarge { .. } => "FILE_TOO_LARGE",
            Self::EmptyDocument => "EMPTY_DOCUMENT",
            Self::UnsupportedType { .. } => "UNSUPPORTED_TYPE",
            Self::MalformedPayload(_) => "MALFORMED_PAYLOAD",
        }
    }
}

/// Failure of the single round trip to the generative model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Model service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Model response does not match the output schema: {0}")]
    SchemaViolation(String),

    #[error("Model returned an empty response")]
    EmptyResponse,

    #[error("Model did not respond within {after:?}")]
    TimedOut { after: Duration },

    #[error("Analysis was cancelled")]
    Cancelled,
}

impl ExtractionError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::SchemaViolation(_) => "SCHEMA_VIOLATION",
            Self::EmptyResponse => "EMPTY_RESPONSE",
            Self::TimedOut { .. } => "TIMED_OUT",
            Self::Cancelled => "CANCELLED",
        }
    }
}

/// Reason a speech synthesis request produced no audio.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SynthesisError {
    #[error("Text to synthesize must not be empty.")]
    EmptyText,

    #[error("Text-to-Speech feature is not available.")]
    Unavailable,

    #[error("Failed to generate audio: {0}")]
    Backend(String),
}

/// Reading the bytes of a document failed. Never carries partial data.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Failed to read document '{name}': {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read uploaded document: {0}")]
    Upload(String),
}

/// Tagged failure of one `analyze` call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl AnalysisError {
    /// Input errors need a different submission; extraction errors may go
    /// away if the same request is sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Extraction(_))
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Input(e) => e.code(),
            Self::Extraction(e) => e.code(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),
}

impl From<InputError> for ApiError {
    fn from(e: InputError) -> Self {
        Self::Analysis(AnalysisError::Input(e))
    }
}

impl From<EncodeError> for ApiError {
    fn from(e: EncodeError) -> Self {
        Self::BadRequest(e.to_string())
    }
}

/// Bodies axum could not turn into the expected JSON shape.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge(rejection.body_text())
        } else {
            InputError::MalformedPayload(rejection.body_text()).into()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Analysis(AnalysisError::Input(e)) => match e {
                InputError::FileTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
                InputError::UnsupportedType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                _ => StatusCode::BAD_REQUEST,
            },
            Self::Analysis(AnalysisError::Extraction(e)) => match e {
                ExtractionError::TimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
                ExtractionError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                _ => StatusCode::BAD_GATEWAY,
            },
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Analysis(e) => e.code(),
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg) => msg.clone(),
            Self::Analysis(AnalysisError::Input(e)) => e.to_string(),
            // Model service details stay in the logs
            Self::Analysis(AnalysisError::Extraction(e)) => match e {
                ExtractionError::TimedOut { .. } | ExtractionError::Cancelled => e.to_string(),
                _ => "The document could not be analyzed. Please try again.".to_string(),
            },
            Self::PayloadTooLarge(msg) => msg.clone(),
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Analysis(e) => e.is_retryable(),
            Self::BadRequest(_) | Self::PayloadTooLarge(_) => false,
        }
    }

    /// Render the error body, tagging it with the caller's request id.
    pub fn into_response_with_request_id(self, request_id: Option<String>) -> Response {
        match &self {
            Self::Analysis(AnalysisError::Extraction(e)) => {
                tracing::error!(error = %e, code = e.code(), "Analysis failed");
            }
            _ => {
                tracing::warn!(error = %self, "API error");
            }
        }

        let status = self.status_code();
        let body = ErrorResponse {
            code: self.error_code().to_string(),
            message: self.public_message(),
            retryable: self.retryable(),
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.into_response_with_request_id(None)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
