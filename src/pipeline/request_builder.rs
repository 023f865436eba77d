//! Compose the model invocation for a validated request.

use serde_json::{json, Value};

use crate::domain::analysis::DOCUMENT_CATEGORIES;
use crate::domain::{AnalysisRequest, DataUri};

/// Fields the model must return, in presentation order.
pub const OUTPUT_FIELDS: [&str; 4] = ["summary", "identifiedDocumentType", "pros", "cons"];

/// Everything the extraction client needs for one round trip.
#[derive(Debug, Clone)]
pub struct AnalysisPrompt {
    pub instruction: String,
    /// Sent as an inline attachment; the model reads the format itself.
    pub attachment: DataUri,
    pub output_schema: Value,
}

impl AnalysisPrompt {
    /// Media type declared to the model for the attachment.
    pub fn attachment_mime_type(&self) -> String {
        self.attachment.essence()
    }
}

pub fn build_prompt(request: &AnalysisRequest) -> AnalysisPrompt {
    AnalysisPrompt {
        instruction: instruction_text(),
        attachment: request.document().clone(),
        output_schema: output_schema(),
    }
}

fn instruction_text() -> String {
    let categories = DOCUMENT_CATEGORIES.join(", ");
    format!(
        "You are an expert in analyzing and summarizing documents, especially legal and terms & conditions documents.\n\
         \n\
         You will receive a document as an attachment. Your tasks are:\n\
         1. Identify the type of the document ({categories}). If none fits, use a short descriptive label. Store this in the 'identifiedDocumentType' field.\n\
         2. Summarize the key terms and conditions of the document concisely in the 'summary' field.\n\
         3. Identify potential benefits or user-friendly aspects ('pros'). Provide 2-3 points if applicable. If none are apparent, return an empty array for 'pros'.\n\
         4. Identify potential drawbacks, risks, or strict limitations ('cons'). Provide 2-3 points if applicable. If none are apparent, return an empty array for 'cons'.\n\
         5. Keep the tone and focus of the summary, pros, and cons appropriate for the identified document type."
    )
}

/// Response schema in the OpenAPI subset accepted by `generateContent`.
pub fn output_schema() -> Value {
    let categories = DOCUMENT_CATEGORIES.join(", ");
    json!({
        "type": "OBJECT",
        "properties": {
            "summary": {
                "type": "STRING",
                "description": "The summarized key terms and conditions."
            },
            "identifiedDocumentType": {
                "type": "STRING",
                "description": format!("The identified type of the document, e.g. {categories}.")
            },
            "pros": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Potential benefits or user-friendly aspects found in the document. 2-3 points if applicable, otherwise an empty array."
            },
            "cons": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "Potential drawbacks, risks, or strict limitations found in the document. 2-3 points if applicable, otherwise an empty array."
            }
        },
        "required": OUTPUT_FIELDS,
        "propertyOrdering": OUTPUT_FIELDS,
    })
}
