#![allow(dead_code)]

use async_trait::async_trait;
use axum::{body::Body, http::Request, response::Response, Router};
use http_body_util::BodyExt;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use doclens_backend::app::{create_app, AppState};
use doclens_backend::config::Settings;
use doclens_backend::domain::RawAnalysis;
use doclens_backend::error::ExtractionError;
use doclens_backend::pipeline::{AnalysisPrompt, CancelSignal, DocumentAnalyzer};
use doclens_backend::services::{
    ExtractionOutcome, SpeechSynthesizer, StructuredExtractor, UnavailableSynthesizer,
};

pub type Responder = Box<dyn Fn(&AnalysisPrompt) -> ExtractionOutcome + Send + Sync>;

/// Extractor double that counts calls and keeps every prompt it saw.
pub struct ScriptedExtractor {
    responder: Responder,
    calls: AtomicUsize,
    prompts: Mutex<Vec<AnalysisPrompt>>,
}

impl ScriptedExtractor {
    pub fn new(
        responder: impl Fn(&AnalysisPrompt) -> ExtractionOutcome + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn returning(raw: RawAnalysis) -> Arc<Self> {
        Self::new(move |_| Ok(raw.clone()))
    }

    pub fn failing(err: ExtractionError) -> Arc<Self> {
        Self::new(move |_| Err(err.clone()))
    }

    /// Echo the attached document's text back as the summary.
    pub fn echoing() -> Arc<Self> {
        Self::new(|prompt| {
            Ok(RawAnalysis {
                summary: Some(String::from_utf8_lossy(prompt.attachment.bytes()).into_owned()),
                identified_document_type: Some(prompt.attachment_mime_type()),
                pros: Some(vec![]),
                cons: None,
            })
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<AnalysisPrompt> {
        self.prompts.lock().clone()
    }
}

#[async_trait]
impl StructuredExtractor for ScriptedExtractor {
    async fn invoke(&self, prompt: &AnalysisPrompt) -> ExtractionOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(prompt.clone());
        // Yield so concurrent callers interleave
        tokio::task::yield_now().await;
        (self.responder)(prompt)
    }
}

pub fn init_tracing() {
    doclens_backend::logging::init_test_logging();
}

pub fn test_settings(overrides: &[(&str, &str)]) -> Settings {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("GEMINI_API_KEY".into(), "test-key".into());
    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }
    Settings::from_lookup(|key| vars.get(key).cloned()).expect("test settings should be valid")
}

pub fn analyzer(extractor: Arc<dyn StructuredExtractor>) -> DocumentAnalyzer {
    DocumentAnalyzer::new(extractor, Duration::from_secs(5))
}

pub fn test_app(extractor: Arc<dyn StructuredExtractor>) -> Router {
    test_app_with(extractor, Arc::new(UnavailableSynthesizer::new()))
}

pub fn test_app_with(
    extractor: Arc<dyn StructuredExtractor>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
) -> Router {
    init_tracing();
    let state = AppState::new(
        test_settings(&[]),
        analyzer(extractor),
        synthesizer,
        CancelSignal::never(),
    );
    create_app(state)
}

pub fn json_request(uri: &str, body: &Value) -> Request<Body> {
    raw_json_request(uri, body.to_string())
}

/// POST a body as-is under a JSON content type.
pub fn raw_json_request(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .expect("request builder should not fail")
}

pub const BOUNDARY: &str = "doclens-test-boundary";

/// One multipart part: (field name, file name, content type, bytes).
pub type Part<'a> = (&'a str, &'a str, &'a str, &'a [u8]);

pub fn part<'a>(name: &'a str, file_name: &'a str, content_type: &'a str, bytes: &'a [u8]) -> Part<'a> {
    (name, file_name, content_type, bytes)
}

pub fn multipart_request(parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, file_name, content_type, bytes) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/v1/analyze/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("request builder should not fail")
}

pub async fn body_json(response: Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("response body must be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("response must be valid JSON")
}
