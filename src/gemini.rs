//! Minimal Gemini client for our use-case.
//!
//! One `generateContent` call per generation, with a JSON response constrained by
//! the request's schema. Calls are instrumented and log model name, latency, token
//! usage and payload sizes (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short to avoid PII leaks.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::error::GenerationError;
use crate::request::{GenerationRequest, RequestPart};
use crate::util::trunc_for_log;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// The remote model seam: one request in, the raw JSON text out.
#[async_trait]
pub trait ResourceModel: Send + Sync {
  fn name(&self) -> &str;

  async fn generate_json(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

#[derive(Clone)]
pub struct Gemini {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl Gemini {
  pub fn new(
    api_key: impl Into<String>,
    base_url: &str,
    model: impl Into<String>,
    timeout: Duration,
  ) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      api_key: api_key.into(),
      base_url: base_url.trim_end_matches('/').to_string(),
      model: model.into(),
    })
  }

  /// Construct the client if we find GEMINI_API_KEY (or API_KEY); otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = pick_api_key(std::env::var("GEMINI_API_KEY").ok(), std::env::var("API_KEY").ok())?;
    let base_url = std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
    let timeout = std::env::var("GEMINI_TIMEOUT_SECS")
      .ok()
      .and_then(|v| v.parse::<u64>().ok())
      .unwrap_or(DEFAULT_TIMEOUT_SECS);

    match Self::new(api_key, &base_url, model, Duration::from_secs(timeout)) {
      Ok(g) => Some(g),
      Err(e) => {
        error!(target: "pedagen_backend", error = %e, "Failed to build HTTP client for Gemini");
        None
      }
    }
  }

  fn endpoint(&self) -> String {
    format!("{}/models/{}:generateContent", self.base_url, self.model)
  }
}

#[async_trait]
impl ResourceModel for Gemini {
  fn name(&self) -> &str {
    &self.model
  }

  #[instrument(level = "info", skip(self, request), fields(model = %self.model, parts = request.parts.len()))]
  async fn generate_json(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
    let body = GenerateContentRequest {
      contents: vec![Content { role: "user", parts: &request.parts }],
      generation_config: GenerationConfig {
        response_mime_type: "application/json",
        response_schema: &request.response_schema,
      },
    };

    let start = Instant::now();
    let res = self
      .client
      .post(self.endpoint())
      .header("x-goog-api-key", &self.api_key)
      .header(reqwest::header::USER_AGENT, "pedagen-backend/0.1")
      .json(&body)
      .send()
      .await
      .map_err(|e| {
        error!(target: "generation", elapsed = ?start.elapsed(), error = %e, "Gemini request failed");
        GenerationError::Remote(e.to_string())
      })?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let msg = extract_gemini_error(&body).unwrap_or_else(|| trunc_for_log(&body, 300));
      error!(target: "generation", elapsed = ?start.elapsed(), %status, "Gemini returned an error status");
      return Err(GenerationError::Remote(format!("Gemini HTTP {}: {}", status, msg)));
    }

    let body: GenerateContentResponse = res
      .json()
      .await
      .map_err(|e| GenerationError::ResponseFormat(format!("unreadable response envelope: {e}")))?;

    let elapsed = start.elapsed();
    if let Some(usage) = &body.usage_metadata {
      info!(
        target: "generation",
        ?elapsed,
        prompt_tokens = ?usage.prompt_token_count,
        candidates_tokens = ?usage.candidates_token_count,
        total_tokens = ?usage.total_token_count,
        "Gemini usage"
      );
    }

    let text = candidate_text(&body)?;
    info!(target: "generation", ?elapsed, response_len = text.len(), "Model response received");
    Ok(text)
  }
}

/// First non-blank key, trimmed. A key set to whitespace counts as unset.
fn pick_api_key(primary: Option<String>, fallback: Option<String>) -> Option<String> {
  [primary, fallback]
    .into_iter()
    .flatten()
    .map(|k| k.trim().to_string())
    .find(|k| !k.is_empty())
}

/// Concatenate the text parts of the first candidate.
fn candidate_text(body: &GenerateContentResponse) -> Result<String, GenerationError> {
  let candidate = body.candidates.first().ok_or_else(|| {
    let reason = body
      .prompt_feedback
      .as_ref()
      .and_then(|f| f.block_reason.clone())
      .unwrap_or_else(|| "no candidates returned".into());
    GenerationError::ResponseFormat(format!("empty model output ({reason})"))
  })?;

  let text: String = candidate
    .content
    .as_ref()
    .map(|c| c.parts.iter().filter_map(|p| p.text.as_deref()).collect())
    .unwrap_or_default();

  if text.trim().is_empty() {
    let reason = candidate.finish_reason.clone().unwrap_or_else(|| "unknown".into());
    return Err(GenerationError::ResponseFormat(format!("empty model output (finish reason: {reason})")));
  }
  Ok(text)
}

// --- generateContent DTOs ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
  contents: Vec<Content<'a>>,
  generation_config: GenerationConfig<'a>,
}
#[derive(Serialize)]
struct Content<'a> { role: &'static str, parts: &'a [RequestPart] }
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> { response_mime_type: &'static str, response_schema: &'a Value }

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
  #[serde(default)] candidates: Vec<Candidate>,
  #[serde(default)] usage_metadata: Option<UsageMetadata>,
  #[serde(default)] prompt_feedback: Option<PromptFeedback>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
  #[serde(default)] content: Option<CandidateContent>,
  #[serde(default)] finish_reason: Option<String>,
}
#[derive(Deserialize)]
struct CandidateContent { #[serde(default)] parts: Vec<CandidatePart> }
#[derive(Deserialize)]
struct CandidatePart { #[serde(default)] text: Option<String> }
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
  #[serde(default)] prompt_token_count: Option<u32>,
  #[serde(default)] candidates_token_count: Option<u32>,
  #[serde(default)] total_token_count: Option<u32>,
}
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback { #[serde(default)] block_reason: Option<String> }

/// Try to extract a clean error message from a Gemini error body.
fn extract_gemini_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn response(v: Value) -> GenerateContentResponse {
    serde_json::from_value(v).unwrap()
  }

  #[test]
  fn request_body_has_gemini_shape() {
    let parts = vec![RequestPart::text("do it"), RequestPart::inline("application/pdf", "JVBE")];
    let schema = json!({ "type": "OBJECT" });
    let body = GenerateContentRequest {
      contents: vec![Content { role: "user", parts: &parts }],
      generation_config: GenerationConfig { response_mime_type: "application/json", response_schema: &schema },
    };
    let v = serde_json::to_value(&body).unwrap();
    assert_eq!(v["contents"][0]["role"], "user");
    assert_eq!(v["contents"][0]["parts"][1]["inlineData"]["mimeType"], "application/pdf");
    assert_eq!(v["generationConfig"]["responseMimeType"], "application/json");
    assert_eq!(v["generationConfig"]["responseSchema"]["type"], "OBJECT");
  }

  #[test]
  fn candidate_text_joins_parts() {
    let body = response(json!({
      "candidates": [{ "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] }, "finishReason": "STOP" }],
      "usageMetadata": { "promptTokenCount": 10, "candidatesTokenCount": 4, "totalTokenCount": 14 }
    }));
    assert_eq!(candidate_text(&body).unwrap(), "{\"a\":1}");
  }

  #[test]
  fn blocked_prompt_is_a_format_error() {
    let body = response(json!({ "promptFeedback": { "blockReason": "SAFETY" } }));
    let err = candidate_text(&body).unwrap_err();
    assert!(matches!(err, GenerationError::ResponseFormat(ref m) if m.contains("SAFETY")));
  }

  #[test]
  fn empty_candidate_reports_finish_reason() {
    let body = response(json!({ "candidates": [{ "finishReason": "MAX_TOKENS" }] }));
    let err = candidate_text(&body).unwrap_err();
    assert!(err.to_string().contains("MAX_TOKENS"));
  }

  #[test]
  fn service_error_message_is_extracted() {
    let body = r#"{"error":{"code":400,"message":"API key not valid.","status":"INVALID_ARGUMENT"}}"#;
    assert_eq!(extract_gemini_error(body).as_deref(), Some("API key not valid."));
    assert_eq!(extract_gemini_error("<html>"), None);
  }

  #[test]
  fn blank_api_key_counts_as_missing() {
    assert_eq!(pick_api_key(Some("  ".into()), None), None);
    assert_eq!(pick_api_key(Some("".into()), Some("\t".into())), None);
    assert_eq!(pick_api_key(Some(" ".into()), Some("fallback".into())), Some("fallback".into()));
    assert_eq!(pick_api_key(Some(" key-1 ".into()), Some("key-2".into())), Some("key-1".into()));
    assert_eq!(pick_api_key(None, None), None);
  }

  fn tiny_request() -> GenerationRequest {
    GenerationRequest {
      parts: vec![RequestPart::text("instruction")],
      response_schema: json!({ "type": "OBJECT" }),
      skipped_files: vec![],
    }
  }

  /// Serve `app` on an ephemeral port and return its base URL.
  async fn serve_stub(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
  }

  fn client(base_url: &str) -> Gemini {
    Gemini::new("test-key", base_url, "gemini-test", Duration::from_secs(5)).unwrap()
  }

  #[tokio::test]
  async fn successful_call_returns_candidate_text() {
    use axum::{http::HeaderMap, routing::post, Json};

    let app = axum::Router::new().route(
      "/models/:call",
      post(|headers: HeaderMap, Json(body): Json<Value>| async move {
        assert_eq!(headers.get("x-goog-api-key").unwrap(), "test-key");
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        Json(json!({
          "candidates": [{ "content": { "parts": [{ "text": "{\"ok\":true}" }] }, "finishReason": "STOP" }]
        }))
      }),
    );
    let base = serve_stub(app).await;
    let text = client(&base).generate_json(&tiny_request()).await.unwrap();
    assert_eq!(text, "{\"ok\":true}");
  }

  #[tokio::test]
  async fn error_status_becomes_remote_with_api_message() {
    use axum::{http::StatusCode, routing::post, Json};

    let app = axum::Router::new().route(
      "/models/:call",
      post(|| async {
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "error": { "code": 500, "message": "backend exploded", "status": "INTERNAL" } })),
        )
      }),
    );
    let base = serve_stub(app).await;
    let err = client(&base).generate_json(&tiny_request()).await.unwrap_err();
    let GenerationError::Remote(msg) = &err else { panic!("expected remote error") };
    assert!(msg.contains("500"));
    assert!(msg.contains("backend exploded"));
  }

  #[tokio::test]
  async fn unreachable_host_becomes_remote() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = client(&format!("http://{addr}")).generate_json(&tiny_request()).await.unwrap_err();
    assert_eq!(err.kind(), "generation_error");
  }
}
