//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs basic request/result info.

use std::sync::Arc;

use axum::{
  extract::{Multipart, Query, State},
  response::IntoResponse,
  Json,
};
use tracing::{debug, info, instrument, warn};

use crate::domain::{SourceInput, UploadedFile};
use crate::error::GenerationError;
use crate::logic::generate;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, generation_enabled: state.model.is_some() })
}

#[instrument(level = "info")]
pub async fn http_levels() -> impl IntoResponse {
  Json(levels_out())
}

/// `multipart/form-data` with optional `text` and `level` fields and any number
/// of file fields (every part carrying a file name counts as a file, except
/// the empty placeholder a blank file input produces).
#[instrument(level = "info", skip(state, multipart), fields(markdown = q.wants_markdown()))]
pub async fn http_post_generate(
  State(state): State<Arc<AppState>>,
  Query(q): Query<GenerateQuery>,
  multipart: Multipart,
) -> Result<Json<GenerateOut>, GenerationError> {
  let (input, level_raw) = read_form(multipart).await?;
  let level = parse_level(level_raw.as_deref())?;
  if !input.has_content() {
    return Err(GenerationError::EmptyInput);
  }
  let model = state.model()?;

  let bundle = generate(model, &state.prompts, input, level).await?;
  info!(target: "generation", id = %bundle.id, %level, parts = bundle.parts_sent, "HTTP generate served");
  Ok(Json(to_out(bundle, q.wants_markdown())))
}

async fn read_form(mut multipart: Multipart) -> Result<(SourceInput, Option<String>), GenerationError> {
  let mut input = SourceInput::default();
  let mut level = None;

  while let Some(field) = multipart
    .next_field()
    .await
    .map_err(|e| GenerationError::BadRequest(format!("invalid multipart body: {e}")))?
  {
    if let Some(file_name) = field.file_name().map(str::to_string) {
      let field_name = field.name().map(str::to_string);
      let mime_type = field.content_type().unwrap_or_default().to_string();
      let bytes = field.bytes().await.map_err(|e| GenerationError::Read {
        file: file_name.clone(),
        reason: e.to_string(),
      })?;
      if file_name.is_empty() && bytes.is_empty() {
        // Browsers send this for a file input left blank.
        debug!(target: "generation", field = ?field_name, "Ignoring empty file placeholder");
        continue;
      }
      debug!(target: "generation", file = %file_name, %mime_type, size = bytes.len(), "Upload received");
      if !input.add_file(UploadedFile::new(file_name.clone(), mime_type, bytes.to_vec())) {
        warn!(target: "generation", file = %file_name, "Duplicate file name; keeping the first upload");
      }
      continue;
    }

    let name = field.name().unwrap_or_default().to_string();
    let value = field
      .text()
      .await
      .map_err(|e| GenerationError::BadRequest(format!("unreadable field {name}: {e}")))?;
    match name.as_str() {
      "text" => input.text = value,
      "level" => level = Some(value),
      other => debug!(target: "generation", field = %other, "Ignoring unknown form field"),
    }
  }

  Ok((input, level))
}
