//! Error taxonomy for the generation pipeline and its HTTP mapping.

use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde::Serialize;
use thiserror::Error;

/// Message shown to users in front of the underlying cause.
pub const USER_ERROR_PREFIX: &str =
  "Une erreur est survenue lors de la génération des ressources. Détail: ";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
  #[error("Le contenu source ou les fichiers ne peuvent pas être tous les deux vides.")]
  EmptyInput,

  #[error("Failed to read file {file}: {reason}")]
  Read { file: String, reason: String },

  #[error("Model call failed: {0}")]
  Remote(String),

  #[error("Unexpected model response format: {0}")]
  ResponseFormat(String),

  #[error("Generation backend is not configured (set GEMINI_API_KEY)")]
  NotConfigured,

  #[error("Bad request: {0}")]
  BadRequest(String),
}

impl GenerationError {
  /// Stable snake_case code, exposed next to the message.
  pub fn kind(&self) -> &'static str {
    match self {
      GenerationError::EmptyInput => "empty_input",
      GenerationError::Read { .. } => "read_error",
      GenerationError::Remote(_) => "generation_error",
      GenerationError::ResponseFormat(_) => "response_format_error",
      GenerationError::NotConfigured => "not_configured",
      GenerationError::BadRequest(_) => "bad_request",
    }
  }

  pub fn status_code(&self) -> StatusCode {
    match self {
      GenerationError::EmptyInput
      | GenerationError::Read { .. }
      | GenerationError::BadRequest(_) => StatusCode::BAD_REQUEST,
      GenerationError::Remote(_) | GenerationError::ResponseFormat(_) => StatusCode::BAD_GATEWAY,
      GenerationError::NotConfigured => StatusCode::SERVICE_UNAVAILABLE,
    }
  }

  /// The single generic message the UI displays, with the cause appended.
  pub fn user_message(&self) -> String {
    format!("{}{}", USER_ERROR_PREFIX, self)
  }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
  pub error: String,
  pub kind: &'static str,
}

impl IntoResponse for GenerationError {
  fn into_response(self) -> Response {
    let body = ErrorBody { error: self.user_message(), kind: self.kind() };
    (self.status_code(), Json(body)).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn input_errors_map_to_bad_request() {
    assert_eq!(GenerationError::EmptyInput.status_code(), StatusCode::BAD_REQUEST);
    let read = GenerationError::Read { file: "a.pdf".into(), reason: "empty".into() };
    assert_eq!(read.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(read.kind(), "read_error");
  }

  #[test]
  fn upstream_errors_map_to_bad_gateway() {
    assert_eq!(GenerationError::Remote("timeout".into()).status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(
      GenerationError::ResponseFormat("not json".into()).status_code(),
      StatusCode::BAD_GATEWAY
    );
    assert_eq!(GenerationError::NotConfigured.status_code(), StatusCode::SERVICE_UNAVAILABLE);
  }

  #[test]
  fn user_message_appends_cause() {
    let msg = GenerationError::Remote("HTTP 500".into()).user_message();
    assert!(msg.starts_with(USER_ERROR_PREFIX));
    assert!(msg.ends_with("Model call failed: HTTP 500"));
  }
}
