//! Parsing and validating the model's JSON answer into `EducationalResources`.
//!
//! The schema sent with the request is only a hint to the model, so the answer is
//! checked here: wrapper key present, every field present with the right type,
//! no blank titles, no empty lists. Anything else is a `ResponseFormat` error and
//! no partial bundle escapes.

use serde_json::Value;

use crate::domain::EducationalResources;
use crate::error::GenerationError;
use crate::request::RESPONSE_ROOT_KEY;

pub fn parse_resources(raw: &str) -> Result<EducationalResources, GenerationError> {
  let value: Value = serde_json::from_str(raw.trim())
    .map_err(|e| GenerationError::ResponseFormat(format!("response is not valid JSON: {e}")))?;

  let inner = value
    .get(RESPONSE_ROOT_KEY)
    .cloned()
    .ok_or_else(|| GenerationError::ResponseFormat(format!("missing top-level key \"{RESPONSE_ROOT_KEY}\"")))?;

  let resources: EducationalResources = serde_json::from_value(inner)
    .map_err(|e| GenerationError::ResponseFormat(format!("resources do not match the schema: {e}")))?;

  validate(&resources)?;
  Ok(resources)
}

fn validate(r: &EducationalResources) -> Result<(), GenerationError> {
  let titles = [
    ("quiz", &r.quiz.title),
    ("caseStudy", &r.case_study.title),
    ("videoScript", &r.video_script.title),
    ("infographic", &r.infographic.title),
    ("activity", &r.activity.title),
  ];
  for (doc, title) in titles {
    if title.trim().is_empty() {
      return Err(GenerationError::ResponseFormat(format!("{doc}.title is blank")));
    }
  }

  let lists = [
    ("quiz.questions", r.quiz.questions.len()),
    ("caseStudy.questions", r.case_study.questions.len()),
    ("videoScript.scenes", r.video_script.scenes.len()),
    ("infographic.keyPoints", r.infographic.key_points.len()),
    ("activity.steps", r.activity.steps.len()),
    ("activity.materials", r.activity.materials.len()),
  ];
  for (field, len) in lists {
    if len == 0 {
      return Err(GenerationError::ResponseFormat(format!("{field} is empty")));
    }
  }

  if let Some((i, _)) = r.quiz.questions.iter().enumerate().find(|(_, q)| q.options.is_empty()) {
    return Err(GenerationError::ResponseFormat(format!("quiz.questions[{i}].options is empty")));
  }
  Ok(())
}
