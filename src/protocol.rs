//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::domain::{ComplexityLevel, EducationalResources, SourceInput, UploadedFile};
use crate::error::GenerationError;
use crate::logic::GeneratedBundle;
use crate::render::{to_markdown, MarkdownBundle};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    Generate {
        #[serde(default)]
        text: String,
        #[serde(default)]
        level: Option<String>,
        #[serde(default)]
        files: Vec<WsFileIn>,
        #[serde(default)]
        markdown: bool,
    },
}

/// A file sent inline over WebSocket.
#[derive(Debug, Deserialize)]
pub struct WsFileIn {
    pub name: String,
    #[serde(rename = "mimeType", default)]
    pub mime_type: String,
    /// Base64 content.
    pub data: String,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    /// Pending state: the request was accepted and the model is working.
    Generating,
    Resources {
        #[serde(flatten)]
        out: GenerateOut,
    },
    Error {
        message: String,
        kind: &'static str,
    },
}

impl From<GenerationError> for ServerWsMessage {
    fn from(e: GenerationError) -> Self {
        ServerWsMessage::Error { message: e.user_message(), kind: e.kind() }
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub generation_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct LevelOut {
    pub key: ComplexityLevel,
    pub label: &'static str,
}

pub fn levels_out() -> Vec<LevelOut> {
    ComplexityLevel::ALL
        .into_iter()
        .map(|key| LevelOut { key, label: key.label() })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateQuery {
    #[serde(default)]
    pub format: Option<String>,
}

impl GenerateQuery {
    pub fn wants_markdown(&self) -> bool {
        self.format.as_deref().map(|f| f.eq_ignore_ascii_case("markdown")).unwrap_or(false)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateOut {
    pub id: String,
    pub level: ComplexityLevel,
    pub resources: EducationalResources,
    pub skipped_files: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<MarkdownBundle>,
}

/// Convert a finished generation into the public DTO.
pub fn to_out(bundle: GeneratedBundle, with_markdown: bool) -> GenerateOut {
    let markdown = with_markdown.then(|| to_markdown(&bundle.resources));
    GenerateOut {
        id: bundle.id,
        level: bundle.level,
        resources: bundle.resources,
        skipped_files: bundle.skipped_files,
        markdown,
    }
}

/// Missing or blank means the default tier.
pub fn parse_level(raw: Option<&str>) -> Result<ComplexityLevel, GenerationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(ComplexityLevel::default()),
        Some(s) => s.parse().map_err(GenerationError::BadRequest),
    }
}

/// Decode WebSocket files into a `SourceInput`. Duplicate names are dropped.
pub fn ws_source_input(text: String, files: Vec<WsFileIn>) -> Result<SourceInput, GenerationError> {
    let mut input = SourceInput::new(text);
    for f in files {
        let bytes = STANDARD.decode(f.data.trim()).map_err(|e| GenerationError::Read {
            file: f.name.clone(),
            reason: format!("invalid base64: {e}"),
        })?;
        input.add_file(UploadedFile::new(f.name, f.mime_type, bytes));
    }
    Ok(input)
}
