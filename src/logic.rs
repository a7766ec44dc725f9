//! Core generation flow shared by the HTTP and WebSocket handlers:
//! build the request, make exactly one model call, parse the answer.
//! No retries and no state kept between calls.

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::Prompts;
use crate::domain::{ComplexityLevel, EducationalResources, SourceInput};
use crate::error::GenerationError;
use crate::gemini::ResourceModel;
use crate::request::build_request;
use crate::response::parse_resources;
use crate::util::trunc_for_log;

/// A successful generation.
#[derive(Clone, Debug)]
pub struct GeneratedBundle {
  pub id: String,
  pub level: ComplexityLevel,
  pub resources: EducationalResources,
  pub parts_sent: usize,
  pub skipped_files: Vec<String>,
}

#[instrument(level = "info", skip_all, fields(%level, model = %model.name()))]
pub async fn generate(
  model: &dyn ResourceModel,
  prompts: &Prompts,
  input: SourceInput,
  level: ComplexityLevel,
) -> Result<GeneratedBundle, GenerationError> {
  let id = Uuid::new_v4().to_string();
  let request = build_request(prompts, input, level).await?;
  if !request.skipped_files.is_empty() {
    warn!(target: "generation", %id, skipped = ?request.skipped_files, "Some files were skipped");
  }

  let raw = model.generate_json(&request).await.map_err(|e| {
    error!(target: "generation", %id, error = %e, "Model call failed");
    e
  })?;

  let resources = parse_resources(&raw).map_err(|e| {
    error!(target: "generation", %id, error = %e, preview = %trunc_for_log(&raw, 200), "Model response rejected");
    e
  })?;

  info!(
    target: "generation",
    %id,
    quiz_questions = resources.quiz.questions.len(),
    scenes = resources.video_script.scenes.len(),
    "Resources generated"
  );

  Ok(GeneratedBundle {
    id,
    level,
    resources,
    parts_sent: request.parts.len(),
    skipped_files: request.skipped_files,
  })
}
