//! Google Gemini client for structured document analysis.
//!
//! Sends the instruction and the document as an inline attachment to
//! `models/{model}:generateContent`, asking for JSON that follows the
//! prompt's response schema. One request per analysis, no retries.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, instrument, warn};
use url::Url;

use crate::domain::RawAnalysis;
use crate::error::ExtractionError;
use crate::pipeline::request_builder::AnalysisPrompt;
use crate::services::extraction::{ExtractionOutcome, StructuredExtractor};

const API_KEY_HEADER: &str = "x-goog-api-key";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection settings for the model service, built once at startup.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: Url,
    pub temperature: f32,
    pub timeout: Duration,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    temperature: f32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    InlineData {
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    response_mime_type: &'static str,
    response_schema: &'a Value,
    temperature: f32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Error envelope returned by the API on non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    status: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        tracing::info!(
            base_url = %config.base_url,
            model = %config.model,
            "Gemini client initialized"
        );

        Ok(Self {
            client,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            temperature: config.temperature,
        })
    }

    fn model_url(&self) -> String {
        format!("{}/models/{}", self.base_url, self.model)
    }

    async fn generate(&self, prompt: &AnalysisPrompt) -> Result<GenerateResponse, ExtractionError> {
        let url = format!("{}:generateContent", self.model_url());

        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text {
                        text: &prompt.instruction,
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: prompt.attachment_mime_type(),
                            data: prompt.attachment.base64_data(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &prompt.output_schema,
                temperature: self.temperature,
            },
        };

        debug!(url = %url, "Model service request");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Model service request failed");
                ExtractionError::ServiceUnavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorEnvelope>()
                .await
                .ok()
                .map(|envelope| match envelope.error.status {
                    Some(code) => format!("{code}: {}", envelope.error.message),
                    None => envelope.error.message,
                })
                .unwrap_or_else(|| format!("HTTP {status}"));

            error!(status = %status, message = %message, "Model service error");
            return Err(ExtractionError::ServiceUnavailable(message));
        }

        response.json::<GenerateResponse>().await.map_err(|e| {
            error!(error = %e, "Failed to parse model service response");
            ExtractionError::ServiceUnavailable(format!("Invalid response envelope: {e}"))
        })
    }
}

#[async_trait]
impl StructuredExtractor for GeminiClient {
    #[instrument(
        skip(self, prompt),
        fields(
            model = %self.model,
            media_type = %prompt.attachment_mime_type(),
            size_bytes = prompt.attachment.len()
        )
    )]
    async fn invoke(&self, prompt: &AnalysisPrompt) -> ExtractionOutcome {
        let response = self.generate(prompt).await?;
        parse_response(response)
    }

    async fn health_check(&self) -> Result<(), ExtractionError> {
        self.client
            .get(self.model_url())
            .header(API_KEY_HEADER, &self.api_key)
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map(|_| ())
            .map_err(|e| ExtractionError::ServiceUnavailable(e.to_string()))
    }
}

fn parse_response(response: GenerateResponse) -> ExtractionOutcome {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        warn!(block_reason = reason, "Model blocked the prompt");
        return Err(ExtractionError::EmptyResponse);
    }

    let Some(candidate) = response.candidates.into_iter().next() else {
        return Err(ExtractionError::EmptyResponse);
    };

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        warn!(finish_reason = ?candidate.finish_reason, "Model returned no text");
        return Err(ExtractionError::EmptyResponse);
    }

    parse_structured_text(&text)
}

/// Interpret the model's text as the analysis object. Missing or null
/// fields are fine; wrong types are not.
fn parse_structured_text(text: &str) -> ExtractionOutcome {
    let value: Value = serde_json::from_str(strip_code_fence(text))
        .map_err(|e| ExtractionError::SchemaViolation(format!("response is not JSON: {e}")))?;

    match value {
        Value::Null => Err(ExtractionError::EmptyResponse),
        Value::Object(_) => serde_json::from_value::<RawAnalysis>(value)
            .map_err(|e| ExtractionError::SchemaViolation(e.to_string())),
        other => Err(ExtractionError::SchemaViolation(format!(
            "expected an object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Some models wrap JSON in a markdown fence even in JSON mode.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = match inner.get(..4) {
        Some(tag) if tag.eq_ignore_ascii_case("json") => &inner[4..],
        _ => inner,
    };
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with_text(text: &str) -> GenerateResponse {
        serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        }))
        .unwrap()
    }

    #[test]
    fn parses_partial_objects() {
        let raw = parse_response(response_with_text(
            r#"{"summary":"X","identifiedDocumentType":null,"pros":null,"cons":["a"]}"#,
        ))
        .unwrap();

        assert_eq!(raw.summary.as_deref(), Some("X"));
        assert!(raw.identified_document_type.is_none());
        assert!(raw.pros.is_none());
        assert_eq!(raw.cons, Some(vec!["a".to_string()]));
    }

    #[test]
    fn joins_text_split_across_parts() {
        let response: GenerateResponse = serde_json::from_value(serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": "{\"summary\":" }, { "text": "\"joined\"}" }] }
            }]
        }))
        .unwrap();

        let raw = parse_response(response).unwrap();
        assert_eq!(raw.summary.as_deref(), Some("joined"));
    }

    #[test]
    fn accepts_fenced_json() {
        let raw = parse_response(response_with_text("```json\n{\"pros\":[\"p\"]}\n```")).unwrap();
        assert_eq!(raw.pros, Some(vec!["p".to_string()]));
    }

    #[test]
    fn fence_tag_is_case_insensitive() {
        for fenced in [
            "```JSON\n{\"summary\":\"x\"}\n```",
            "```Json\n{\"summary\":\"x\"}\n```",
            "```\n{\"summary\":\"x\"}\n```",
        ] {
            let raw = parse_response(response_with_text(fenced)).unwrap();
            assert_eq!(raw.summary.as_deref(), Some("x"), "{fenced}");
        }
    }

    #[test]
    fn no_candidates_or_blank_text_is_empty_response() {
        assert_eq!(
            parse_response(GenerateResponse::default()).unwrap_err(),
            ExtractionError::EmptyResponse
        );
        assert_eq!(
            parse_response(response_with_text("   ")).unwrap_err(),
            ExtractionError::EmptyResponse
        );
        assert_eq!(
            parse_response(response_with_text("null")).unwrap_err(),
            ExtractionError::EmptyResponse
        );
    }

    #[test]
    fn blocked_prompt_is_empty_response() {
        let response: GenerateResponse = serde_json::from_value(serde_json::json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();
        assert_eq!(
            parse_response(response).unwrap_err(),
            ExtractionError::EmptyResponse
        );
    }

    #[test]
    fn wrong_shapes_are_schema_violations() {
        for text in [
            "I could not read this document.",
            "[\"summary\"]",
            r#"{"summary": 42}"#,
            r#"{"pros": "just one"}"#,
        ] {
            let err = parse_response(response_with_text(text)).unwrap_err();
            assert!(
                matches!(err, ExtractionError::SchemaViolation(_)),
                "{text} -> {err:?}"
            );
        }
    }

    #[test]
    fn request_body_uses_inline_attachment_and_schema() {
        let schema = serde_json::json!({ "type": "OBJECT" });
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text { text: "analyze" },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "application/pdf".into(),
                            data: "JVBERg==".into(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: &schema,
                temperature: 0.2,
            },
        };

        let json = serde_json::to_value(&body).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "analyze");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "application/pdf");
        assert_eq!(parts[1]["inlineData"]["data"], "JVBERg==");
        assert_eq!(
            json["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(json["generationConfig"]["responseSchema"]["type"], "OBJECT");
    }
}
