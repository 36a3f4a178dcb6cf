//! Cross-encoder reranking of fused candidates.

use crate::chunk_id::ChunkRef;
use crate::hash::note_content;
use crate::models::{ModelError, RerankScorer};

/// A candidate chunk entering the rerank stage
#[derive(Debug, Clone)]
pub struct RerankCandidate {
    /// Chunk identity
    pub chunk: ChunkRef,
    /// Note title
    pub title: String,
    /// Chunk body text
    pub body: String,
    /// Score carried from the previous stage, replaced by the reranker
    pub score: f32,
}

/// Score all candidates against the query in one batch and re-sort them
/// best-first.
///
/// Each candidate is presented to the cross-encoder as its title and trimmed
/// body joined by a blank line. A candidate the batch response dropped keeps
/// score 0 instead of erroring.
pub fn rerank_candidates(
    reranker: &dyn RerankScorer,
    query: &str,
    mut candidates: Vec<RerankCandidate>,
) -> Result<Vec<RerankCandidate>, ModelError> {
    if candidates.is_empty() {
        return Ok(candidates);
    }

    let documents: Vec<String> = candidates
        .iter()
        .map(|c| note_content(&c.title, &c.body))
        .collect();
    let scores = reranker.score_all(query, &documents)?;

    for (index, candidate) in candidates.iter_mut().enumerate() {
        candidate.score = scores.get(index).copied().unwrap_or(0.0);
    }
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(candidates)
}

// ============================================================================
// TESTS
// ============================================================================
