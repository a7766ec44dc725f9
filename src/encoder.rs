//! Uploaded file → request part.
//!
//! - `text/plain` becomes an inline text part wrapped in start/end markers naming the file.
//! - Allow-listed documents and any `image/*` become base64 inline data with their MIME type.
//! - Everything else is skipped with a warning.
//!
//! A batch is encoded concurrently (one blocking task per file) and reassembled in
//! upload order. The first read failure aborts the whole batch.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::domain::UploadedFile;
use crate::error::GenerationError;
use crate::request::RequestPart;
use crate::util::{fill_template, mime_essence};

pub const TEXT_PLAIN: &str = "text/plain";

/// Binary types sent inline as-is (in addition to any `image/*`).
pub const SUPPORTED_INLINE_MIME_TYPES: [&str; 12] = [
  "image/png",
  "image/jpeg",
  "application/pdf",
  "application/msword",
  "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
  "application/vnd.ms-excel",
  "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
  "application/vnd.ms-powerpoint",
  "application/vnd.openxmlformats-officedocument.presentationml.presentation",
  "application/vnd.oasis.opendocument.text",
  "application/vnd.oasis.opendocument.spreadsheet",
  "application/vnd.oasis.opendocument.presentation",
];

/// How a given MIME type is handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
  Text,
  Inline,
  Unsupported,
}

pub fn classify(mime_type: &str) -> FileKind {
  let essence = mime_essence(mime_type);
  if essence == TEXT_PLAIN {
    FileKind::Text
  } else if SUPPORTED_INLINE_MIME_TYPES.contains(&essence.as_str()) || essence.starts_with("image/") {
    FileKind::Inline
  } else {
    FileKind::Unsupported
  }
}

/// Encode one file. `Ok(None)` means the type is unsupported and the file is skipped.
pub fn encode_file(file: &UploadedFile, text_file_template: &str) -> Result<Option<RequestPart>, GenerationError> {
  match classify(&file.mime_type) {
    FileKind::Text => {
      let content = String::from_utf8_lossy(&file.bytes);
      let text = fill_template(text_file_template, &[("name", file.name.as_str()), ("content", &*content)]);
      Ok(Some(RequestPart::text(text)))
    }
    FileKind::Inline => {
      if file.bytes.is_empty() {
        return Err(GenerationError::Read {
          file: file.name.clone(),
          reason: "file is empty".into(),
        });
      }
      // Forward the type as uploaded, not its essence.
      Ok(Some(RequestPart::inline(file.mime_type.trim(), STANDARD.encode(&file.bytes))))
    }
    FileKind::Unsupported => {
      warn!(target: "generation", file = %file.name, mime = %file.mime_type, "Unsupported file type; skipping file");
      Ok(None)
    }
  }
}

/// Result of encoding a batch: parts in upload order plus the names of skipped files.
#[derive(Debug, Default)]
pub struct EncodedFiles {
  pub parts: Vec<RequestPart>,
  pub skipped: Vec<String>,
}

#[instrument(level = "debug", skip_all, fields(files = files.len()))]
pub async fn encode_files(files: Vec<UploadedFile>, text_file_template: &str) -> Result<EncodedFiles, GenerationError> {
  let count = files.len();
  let mut set = JoinSet::new();
  for (idx, file) in files.into_iter().enumerate() {
    let tpl = text_file_template.to_string();
    set.spawn_blocking(move || {
      let encoded = encode_file(&file, &tpl);
      (idx, file.name, encoded)
    });
  }

  let mut slots: Vec<Option<(String, Option<RequestPart>)>> = vec![None; count];
  while let Some(joined) = set.join_next().await {
    let (idx, name, encoded) = joined.map_err(|e| GenerationError::Read {
      file: "<unknown>".into(),
      reason: format!("encoding task failed: {e}"),
    })?;
    // Dropping the set on early return aborts the remaining tasks.
    let part = encoded?;
    slots[idx] = Some((name, part));
  }

  let mut out = EncodedFiles::default();
  for (name, part) in slots.into_iter().flatten() {
    match part {
      Some(p) => out.parts.push(p),
      None => out.skipped.push(name),
    }
  }
  debug!(target: "generation", parts = out.parts.len(), skipped = out.skipped.len(), "Files encoded");
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Prompts;

  fn tpl() -> String {
    Prompts::default().text_file_template
  }

  #[test]
  fn classify_follows_allow_list() {
    assert_eq!(classify("text/plain"), FileKind::Text);
    assert_eq!(classify("text/plain; charset=utf-8"), FileKind::Text);
    assert_eq!(classify("application/pdf"), FileKind::Inline);
    assert_eq!(classify("application/vnd.oasis.opendocument.presentation"), FileKind::Inline);
    assert_eq!(classify("image/webp"), FileKind::Inline);
    assert_eq!(classify("application/zip"), FileKind::Unsupported);
    assert_eq!(classify("text/markdown"), FileKind::Unsupported);
    assert_eq!(classify(""), FileKind::Unsupported);
  }

  #[test]
  fn text_file_is_wrapped_with_name_and_content() {
    let file = UploadedFile::new("notes.txt", "text/plain", b"abc\nline two".to_vec());
    let part = encode_file(&file, &tpl()).unwrap().unwrap();
    let RequestPart::Text { text } = part else { panic!("expected text part") };
    assert!(text.contains("notes.txt"));
    assert!(text.contains("abc\nline two"));
    assert!(text.contains("--- Contenu du fichier notes.txt ---"));
    assert!(text.contains("--- Fin du fichier notes.txt ---"));
  }

  #[test]
  fn empty_text_file_is_still_emitted() {
    let file = UploadedFile::new("blank.txt", "text/plain", Vec::new());
    assert!(encode_file(&file, &tpl()).unwrap().is_some());
  }

  #[test]
  fn binary_payload_decodes_to_original_bytes() {
    let bytes: Vec<u8> = (0u8..=255).chain([0, 0, 7]).collect();
    let file = UploadedFile::new("slides.pptx", SUPPORTED_INLINE_MIME_TYPES[8], bytes.clone());
    let part = encode_file(&file, &tpl()).unwrap().unwrap();
    let RequestPart::InlineData { inline_data } = part else { panic!("expected inline part") };
    assert_eq!(inline_data.mime_type, SUPPORTED_INLINE_MIME_TYPES[8]);
    assert_eq!(STANDARD.decode(inline_data.data).unwrap(), bytes);
  }

  #[test]
  fn empty_binary_file_is_a_read_error() {
    let file = UploadedFile::new("scan.png", "image/png", Vec::new());
    let err = encode_file(&file, &tpl()).unwrap_err();
    assert!(matches!(err, GenerationError::Read { ref file, .. } if file == "scan.png"));
  }

  #[test]
  fn unsupported_file_is_skipped_without_error() {
    let file = UploadedFile::new("bundle.zip", "application/zip", vec![1, 2, 3]);
    assert!(encode_file(&file, &tpl()).unwrap().is_none());
  }

  #[tokio::test]
  async fn batch_preserves_upload_order_and_reports_skips() {
    let files = vec![
      UploadedFile::new("a.txt", "text/plain", b"first".to_vec()),
      UploadedFile::new("b.zip", "application/zip", vec![9]),
      UploadedFile::new("c.png", "image/png", vec![1, 2, 3]),
      UploadedFile::new("d.txt", "text/plain", b"last".to_vec()),
    ];
    let out = encode_files(files, &tpl()).await.unwrap();
    assert_eq!(out.skipped, vec!["b.zip".to_string()]);
    assert_eq!(out.parts.len(), 3);
    assert!(matches!(&out.parts[0], RequestPart::Text { text } if text.contains("first")));
    assert!(matches!(&out.parts[1], RequestPart::InlineData { inline_data } if inline_data.mime_type == "image/png"));
    assert!(matches!(&out.parts[2], RequestPart::Text { text } if text.contains("last")));
  }

  #[tokio::test]
  async fn batch_aborts_on_first_read_error() {
    let files = vec![
      UploadedFile::new("ok.txt", "text/plain", b"fine".to_vec()),
      UploadedFile::new("broken.pdf", "application/pdf", Vec::new()),
    ];
    let err = encode_files(files, &tpl()).await.unwrap_err();
    assert_eq!(err.kind(), "read_error");
  }
}
