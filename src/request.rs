//! Request construction: ordered multimodal parts plus the fixed output schema.
//!
//! Part order is significant: instruction first, then the main text (if any),
//! then one part per supported file in upload order.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument, warn};

use crate::config::Prompts;
use crate::domain::{ComplexityLevel, SourceInput};
use crate::encoder::encode_files;
use crate::error::GenerationError;
use crate::util::fill_template;

/// Root key the model must wrap the bundle in.
pub const RESPONSE_ROOT_KEY: &str = "educationalResources";

/// One unit of a multimodal request, in the remote API's wire form.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestPart {
  Text {
    text: String,
  },
  InlineData {
    #[serde(rename = "inlineData")]
    inline_data: InlineData,
  },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
  pub mime_type: String,
  /// Base64 (standard alphabet, padded).
  pub data: String,
}

impl RequestPart {
  pub fn text(text: impl Into<String>) -> Self {
    RequestPart::Text { text: text.into() }
  }

  pub fn inline(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
    RequestPart::InlineData { inline_data: InlineData { mime_type: mime_type.into(), data: data.into() } }
  }

  /// Size of the payload carried by this part, for logging.
  pub fn payload_len(&self) -> usize {
    match self {
      RequestPart::Text { text } => text.len(),
      RequestPart::InlineData { inline_data } => inline_data.data.len(),
    }
  }
}

/// Everything the generation client needs for one call. Built fresh per call.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
  pub parts: Vec<RequestPart>,
  pub response_schema: Value,
  /// Names of files skipped as unsupported.
  pub skipped_files: Vec<String>,
}

/// The constant response schema, in the Gemini `responseSchema` dialect.
pub fn response_schema() -> Value {
  let string = json!({ "type": "STRING" });
  let string_array = json!({ "type": "ARRAY", "items": { "type": "STRING" } });

  json!({
    "type": "OBJECT",
    "properties": {
      RESPONSE_ROOT_KEY: {
        "type": "OBJECT",
        "properties": {
          "quiz": {
            "type": "OBJECT",
            "properties": {
              "title": string,
              "questions": {
                "type": "ARRAY",
                "items": {
                  "type": "OBJECT",
                  "properties": {
                    "question": string,
                    "options": string_array,
                    "correctAnswer": string,
                    "explanation": string
                  },
                  "required": ["question", "options", "correctAnswer", "explanation"]
                }
              }
            },
            "required": ["title", "questions"]
          },
          "caseStudy": {
            "type": "OBJECT",
            "properties": {
              "title": string,
              "scenario": string,
              "questions": string_array
            },
            "required": ["title", "scenario", "questions"]
          },
          "videoScript": {
            "type": "OBJECT",
            "properties": {
              "title": string,
              "scenes": {
                "type": "ARRAY",
                "items": {
                  "type": "OBJECT",
                  "properties": {
                    "sceneNumber": { "type": "INTEGER" },
                    "visuals": string,
                    "narration": string
                  },
                  "required": ["sceneNumber", "visuals", "narration"]
                }
              }
            },
            "required": ["title", "scenes"]
          },
          "infographic": {
            "type": "OBJECT",
            "properties": {
              "title": string,
              "keyPoints": {
                "type": "ARRAY",
                "items": {
                  "type": "OBJECT",
                  "properties": {
                    "point": string,
                    "visualSuggestion": string
                  },
                  "required": ["point", "visualSuggestion"]
                }
              }
            },
            "required": ["title", "keyPoints"]
          },
          "activity": {
            "type": "OBJECT",
            "properties": {
              "title": string,
              "description": string,
              "steps": string_array,
              "materials": string_array
            },
            "required": ["title", "description", "steps", "materials"]
          }
        },
        "required": ["quiz", "caseStudy", "videoScript", "infographic", "activity"]
      }
    },
    "required": [RESPONSE_ROOT_KEY]
  })
}

/// Build the ordered parts for one generation.
/// Fails with `EmptyInput` before touching any file when there is nothing to work from.
#[instrument(level = "info", skip_all, fields(%level, text_len = input.text.len(), files = input.files.len()))]
pub async fn build_request(
  prompts: &Prompts,
  input: SourceInput,
  level: ComplexityLevel,
) -> Result<GenerationRequest, GenerationError> {
  if !input.has_content() {
    return Err(GenerationError::EmptyInput);
  }

  let mut parts = Vec::with_capacity(2 + input.files.len());
  parts.push(RequestPart::text(fill_template(&prompts.instruction_template, &[("level", level.label())])));

  if !input.text.trim().is_empty() {
    parts.push(RequestPart::text(fill_template(&prompts.source_text_template, &[("content", input.text.as_str())])));
  }

  let encoded = encode_files(input.files, &prompts.text_file_template).await?;
  parts.extend(encoded.parts);

  if parts.len() == 1 {
    // Only skipped files: still accepted, the model gets the instruction alone.
    warn!(target: "generation", skipped = ?encoded.skipped, "No usable source part; every file was skipped");
  }

  let payload_bytes: usize = parts.iter().map(RequestPart::payload_len).sum();
  info!(target: "generation", parts = parts.len(), skipped = encoded.skipped.len(), payload_bytes, "Request built");

  Ok(GenerationRequest { parts, response_schema: response_schema(), skipped_files: encoded.skipped })
}
