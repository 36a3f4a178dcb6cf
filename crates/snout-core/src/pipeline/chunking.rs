//! Token-window chunking.
//!
//! Notes are split into overlapping windows of embedder tokens. Windowing is
//! deterministic left-to-right, so chunk indices are stable for unchanged
//! content and contiguous from 0 for each note.

use crate::models::Token;

/// Result of windowing a token sequence
#[derive(Debug, Clone)]
pub struct ChunkedTokens<T> {
    /// Token windows, in order
    pub chunks: Vec<Vec<T>>,
    /// Start index of each window in the input sequence
    pub starts: Vec<usize>,
    /// Length of the input sequence
    pub total_tokens: usize,
    /// True when the window count hit `max_chunks` and windowing stopped early.
    /// Callers surface this as a warning, not an error.
    pub truncated: bool,
}

/// One chunk of note content, recovered as a byte-span slice
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteChunk {
    /// Zero-based window index
    pub index: u32,
    /// Chunk text
    pub text: String,
}

/// Result of chunking note content
#[derive(Debug, Clone)]
pub struct ChunkedContent {
    /// Text chunks, in window order
    pub chunks: Vec<NoteChunk>,
    /// Length of the tokenized content
    pub total_tokens: usize,
    /// True when windowing stopped at the chunk cap
    pub truncated: bool,
}

/// Split a token sequence into overlapping windows.
///
/// An empty or short sequence yields exactly one window spanning everything.
/// Otherwise windows of `chunk_size` advance by `chunk_size - overlap`, the
/// final window clipped to the sequence end. Parameters are clamped to valid
/// ranges before use.
pub fn chunk_tokens<T: Clone>(
    tokens: &[T],
    chunk_size: usize,
    overlap: usize,
    max_chunks: usize,
) -> ChunkedTokens<T> {
    let total_tokens = tokens.len();
    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size - 1);
    let max_chunks = max_chunks.max(1);
    let step = (chunk_size - overlap).max(1);

    if total_tokens <= chunk_size {
        return ChunkedTokens {
            chunks: vec![tokens.to_vec()],
            starts: vec![0],
            total_tokens,
            truncated: false,
        };
    }

    let mut chunks = Vec::new();
    let mut starts = Vec::new();
    let mut truncated = false;
    let mut index = 0;

    while index < total_tokens {
        if chunks.len() >= max_chunks {
            truncated = true;
            break;
        }

        let end = (index + chunk_size).min(total_tokens);
        chunks.push(tokens[index..end].to_vec());
        starts.push(index);
        if index + chunk_size >= total_tokens {
            break;
        }
        index += step;
    }

    ChunkedTokens {
        chunks,
        starts,
        total_tokens,
        truncated,
    }
}

/// Chunk note content by windowing its tokens and mapping each window back to
/// the byte span it covers in the original text.
pub fn chunk_note_content(
    content: &str,
    tokens: &[Token],
    chunk_size: usize,
    overlap: usize,
    max_chunks: usize,
) -> ChunkedContent {
    let windowed = chunk_tokens(tokens, chunk_size, overlap, max_chunks);

    let chunks = windowed
        .chunks
        .iter()
        .enumerate()
        .map(|(index, window)| {
            let text = match (window.first(), window.last()) {
                (Some(first), Some(last)) => span_slice(content, first.start, last.end),
                _ => String::new(),
            };
            NoteChunk {
                index: index as u32,
                text,
            }
        })
        .collect();

    ChunkedContent {
        chunks,
        total_tokens: windowed.total_tokens,
        truncated: windowed.truncated,
    }
}

/// Slice a byte span out of `content`, backing spans off to char boundaries
/// rather than panicking on tokenizer offset quirks.
fn span_slice(content: &str, start: usize, end: usize) -> String {
    let mut start = start.min(content.len());
    let mut end = end.min(content.len());
    while start > 0 && !content.is_char_boundary(start) {
        start -= 1;
    }
    while end > start && !content.is_char_boundary(end) {
        end -= 1;
    }
    content[start..end].to_string()
}

// ============================================================================
// TESTS
// ============================================================================
