//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces occurrences of `{key}` in the template with provided values.
/// Values are inserted verbatim; placeholders inside values are not expanded.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = String::with_capacity(tpl.len());
  let mut rest = tpl;
  'outer: while let Some(start) = rest.find('{') {
    out.push_str(&rest[..start]);
    let tail = &rest[start..];
    for (k, v) in pairs {
      let needle = format!("{{{}}}", k);
      if tail.starts_with(&needle) {
        out.push_str(v);
        rest = &tail[needle.len()..];
        continue 'outer;
      }
    }
    out.push('{');
    rest = &tail[1..];
  }
  out.push_str(rest);
  out
}

/// Essence of a MIME type: parameters dropped, trimmed, lowercased.
pub fn mime_essence(mime: &str) -> String {
  mime.split(';').next().unwrap_or_default().trim().to_ascii_lowercase()
}

/// Log-safe truncation for large strings.
/// Avoids spamming logs with huge request/response payloads.
pub fn trunc_for_log(s: &str, max: usize) -> String {
  if s.len() <= max {
    return s.to_string();
  }
  let mut cut = max;
  while !s.is_char_boundary(cut) {
    cut -= 1;
  }
  format!("{}… ({} bytes total)", &s[..cut], s.len())
}
