//! Per-note integrity check.
//!
//! Decides whether a note's stored artifacts are trustworthy without
//! reprocessing. Derived fresh every sync pass, never persisted.

/// Inputs for one note's integrity decision
#[derive(Debug, Clone)]
pub struct IntegrityCheck<'a> {
    /// Fingerprint of the note's current content
    pub content_hash: &'a str,
    /// Fingerprint stored at last processing, if the note is known
    pub existing_hash: Option<&'a str>,
    /// Number of stored embeddings for the note
    pub embeddings_count: i64,
    /// Whether the note currently has any content
    pub has_content: bool,
}

/// True when the note's derived artifacts must be rebuilt: unknown note,
/// changed content, or non-empty content with no stored embeddings (the
/// self-healing case after a partial prior failure).
pub fn needs_resync(check: &IntegrityCheck<'_>) -> bool {
    let Some(existing_hash) = check.existing_hash else {
        return true;
    };
    if check.content_hash != existing_hash {
        return true;
    }
    check.embeddings_count == 0 && check.has_content
}

// ============================================================================
// TESTS
// ============================================================================
