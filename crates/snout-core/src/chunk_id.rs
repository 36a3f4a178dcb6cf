//! Chunk Identity
//!
//! A chunk is addressed by the composite key `(note_id, chunk_index)`. Ranked
//! lists and CLI output use the string encoding `note_id:chunk_index`; note ids
//! may themselves contain `:`, so decoding splits on the *last* separator.

use serde::{Deserialize, Serialize};

/// Separator between note id and chunk index in the encoded form
const SEPARATOR: char = ':';

/// Composite identity of one chunk of one note
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkRef {
    /// Source-stable note identifier
    pub note_id: String,
    /// Zero-based window index within the note
    pub chunk_index: u32,
}

impl ChunkRef {
    /// Create a chunk reference
    pub fn new(note_id: impl Into<String>, chunk_index: u32) -> Self {
        Self {
            note_id: note_id.into(),
            chunk_index,
        }
    }

    /// Encode as the external `note_id:chunk_index` identifier
    pub fn encode(&self) -> String {
        format!("{}{}{}", self.note_id, SEPARATOR, self.chunk_index)
    }

    /// Decode an external identifier.
    ///
    /// Returns `None` for malformed input: no separator, separator as the
    /// first or last character, or a trailing segment that is not a
    /// non-negative integer. Callers skip such identifiers instead of failing.
    pub fn decode(id: &str) -> Option<Self> {
        let sep = id.rfind(SEPARATOR)?;
        if sep == 0 || sep == id.len() - 1 {
            return None;
        }
        let chunk_index = id[sep + 1..].parse::<u32>().ok()?;
        Some(Self {
            note_id: id[..sep].to_string(),
            chunk_index,
        })
    }
}

impl std::fmt::Display for ChunkRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", self.note_id, SEPARATOR, self.chunk_index)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_round_trips() {
        let chunk = ChunkRef::new("note-1", 2);
        assert_eq!(chunk.encode(), "note-1:2");
        assert_eq!(ChunkRef::decode("note-1:2"), Some(chunk));
    }

    #[test]
    fn decode_splits_on_last_separator() {
        // Note ids may contain the separator themselves
        let decoded = ChunkRef::decode("a:b:3").unwrap();
        assert_eq!(decoded.note_id, "a:b");
        assert_eq!(decoded.chunk_index, 3);
    }

    #[test]
    fn decode_rejects_malformed() {
        assert_eq!(ChunkRef::decode("note-1"), None);
        assert_eq!(ChunkRef::decode("note-1:"), None);
        assert_eq!(ChunkRef::decode(":2"), None);
        assert_eq!(ChunkRef::decode("note-1:-1"), None);
        assert_eq!(ChunkRef::decode("note-1:2.5"), None);
    }

    #[test]
    fn decode_rejects_non_numeric_index() {
        assert_eq!(ChunkRef::decode("note-1:x"), None);
        assert_eq!(ChunkRef::decode("note-1:1x"), None);
    }
}
