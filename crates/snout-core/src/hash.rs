//! Content fingerprinting for change detection.

/// Normalized note content: title, blank line, body, trimmed.
pub fn note_content(title: &str, body: &str) -> String {
    format!("{title}\n\n{body}").trim().to_string()
}

/// Digest of normalized note content.
///
/// Used purely as a change-detection fingerprint, not for security.
pub fn content_hash(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}
