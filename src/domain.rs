//! Domain models: complexity levels, source input (text + uploaded files),
//! and the five generated teaching resources.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Bloom taxonomy tier used to calibrate every generated resource.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplexityLevel {
  Remember,
  #[default]
  Understand,
  Apply,
  Analyze,
  Evaluate,
  Create,
}

impl ComplexityLevel {
  pub const ALL: [ComplexityLevel; 6] = [
    ComplexityLevel::Remember,
    ComplexityLevel::Understand,
    ComplexityLevel::Apply,
    ComplexityLevel::Analyze,
    ComplexityLevel::Evaluate,
    ComplexityLevel::Create,
  ];

  /// Wire key, as serialized.
  pub fn key(self) -> &'static str {
    match self {
      ComplexityLevel::Remember => "remember",
      ComplexityLevel::Understand => "understand",
      ComplexityLevel::Apply => "apply",
      ComplexityLevel::Analyze => "analyze",
      ComplexityLevel::Evaluate => "evaluate",
      ComplexityLevel::Create => "create",
    }
  }

  /// Label injected into the instruction prompt and shown in the level picker.
  pub fn label(self) -> &'static str {
    match self {
      ComplexityLevel::Remember => "Se Souvenir (Remember)",
      ComplexityLevel::Understand => "Comprendre (Understand)",
      ComplexityLevel::Apply => "Appliquer (Apply)",
      ComplexityLevel::Analyze => "Analyser (Analyze)",
      ComplexityLevel::Evaluate => "Évaluer (Evaluate)",
      ComplexityLevel::Create => "Créer (Create)",
    }
  }
}

impl fmt::Display for ComplexityLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.key())
  }
}

impl FromStr for ComplexityLevel {
  type Err = String;

  /// Accepts the wire key ("analyze") or the full label ("Analyser (Analyze)"),
  /// case-insensitively.
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let needle = s.trim().to_lowercase();
    ComplexityLevel::ALL
      .into_iter()
      .find(|lvl| lvl.key() == needle || lvl.label().to_lowercase() == needle)
      .ok_or_else(|| format!("unknown complexity level: {:?}", s.trim()))
  }
}

/// One uploaded file, fully buffered.
#[derive(Clone, Debug)]
pub struct UploadedFile {
  pub name: String,
  pub mime_type: String,
  pub bytes: Vec<u8>,
}

impl UploadedFile {
  pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
    Self { name: name.into(), mime_type: mime_type.into(), bytes: bytes.into() }
  }
}

/// User-provided material: free text plus files in upload order.
#[derive(Clone, Debug, Default)]
pub struct SourceInput {
  pub text: String,
  pub files: Vec<UploadedFile>,
}

impl SourceInput {
  pub fn new(text: impl Into<String>) -> Self {
    Self { text: text.into(), files: Vec::new() }
  }

  /// At least one of: non-blank text, one file (even one that will be skipped).
  pub fn has_content(&self) -> bool {
    !self.text.trim().is_empty() || !self.files.is_empty()
  }

  /// Append a file unless one with the same name is already present.
  pub fn add_file(&mut self, file: UploadedFile) -> bool {
    if self.files.iter().any(|f| f.name == file.name) {
      return false;
    }
    self.files.push(file);
    true
  }
}

// --- Generated resources (response shape, camelCase on the wire) ---

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
  pub question: String,
  pub options: Vec<String>,
  pub correct_answer: String,
  pub explanation: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quiz {
  pub title: String,
  pub questions: Vec<QuizQuestion>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CaseStudy {
  pub title: String,
  pub scenario: String,
  pub questions: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoScene {
  pub scene_number: u32,
  pub visuals: String,
  pub narration: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoScript {
  pub title: String,
  pub scenes: Vec<VideoScene>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfographicPoint {
  pub point: String,
  pub visual_suggestion: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Infographic {
  pub title: String,
  pub key_points: Vec<InfographicPoint>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Activity {
  pub title: String,
  pub description: String,
  pub steps: Vec<String>,
  pub materials: Vec<String>,
}

/// The full bundle. Either all five parse or generation fails.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationalResources {
  pub quiz: Quiz,
  pub case_study: CaseStudy,
  pub video_script: VideoScript,
  pub infographic: Infographic,
  pub activity: Activity,
}
