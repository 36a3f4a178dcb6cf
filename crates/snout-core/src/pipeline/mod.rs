//! Retrieval pipeline.
//!
//! Query path: keyword search and vector search each produce a chunk-level
//! ranking; Reciprocal Rank Fusion merges them; the fused head is hydrated
//! and re-scored by the cross-encoder; the selector bounds the final count.

pub mod chunking;
pub mod fusion;
pub mod keyword;
pub mod rerank;
pub mod select;
pub mod vector;

pub use chunking::{ChunkedContent, ChunkedTokens, NoteChunk, chunk_note_content, chunk_tokens};
pub use fusion::rrf_fuse;
pub use keyword::{keyword_search, normalize_score, sanitize_match_query};
pub use rerank::{RerankCandidate, rerank_candidates};
pub use select::select_top_n;
pub use vector::{TopK, normalize_unit, vector_from_bytes, vector_search, vector_to_bytes};

use crate::chunk_id::ChunkRef;
use crate::models::{Embedder, ModelError, RerankScorer};
use crate::storage::{IndexStore, StorageError};

/// Minimum number of candidates fetched from each retrieval signal
const MIN_SOURCE_LIMIT: usize = 100;

/// One entry of a ranked list: an encoded chunk id and its stage score
#[derive(Debug, Clone, PartialEq)]
pub struct RankedItem {
    /// Encoded chunk identifier
    pub id: String,
    /// Stage-specific score, best-first ordering is what downstream consumes
    pub score: f32,
}

/// Query pipeline parameters
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// RRF smoothing constant
    pub rrf_k: f32,
    /// Number of fused candidates fed to the reranker
    pub rerank_top_k: usize,
    /// Final result count
    pub top_n: i64,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            rrf_k: crate::config::DEFAULT_RRF_K,
            rerank_top_k: crate::config::DEFAULT_RERANK_TOP_K,
            top_n: crate::config::DEFAULT_TOP_N,
        }
    }
}

/// A final ranked result
#[derive(Debug, Clone, serde::Serialize)]
pub struct QueryHit {
    /// Chunk identity
    #[serde(flatten)]
    pub chunk: ChunkRef,
    /// Note title
    pub title: String,
    /// Chunk body text
    pub body: String,
    /// Reranker relevance score
    pub score: f32,
}

impl QueryHit {
    /// Encoded external identifier of this hit's chunk
    pub fn id(&self) -> String {
        self.chunk.encode()
    }
}

/// Query pipeline error type
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Model failure
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Run the full retrieval pipeline for one query.
pub fn run_query(
    store: &IndexStore,
    embedder: &dyn Embedder,
    reranker: &dyn RerankScorer,
    query: &str,
    options: &QueryOptions,
) -> Result<Vec<QueryHit>, QueryError> {
    let source_limit = (options.rerank_top_k * 2).max(MIN_SOURCE_LIMIT);

    let keyword_results = keyword_search(store, query, source_limit)?;
    tracing::debug!(count = keyword_results.len(), limit = source_limit, "keyword");

    let query_vector = embedder.embed(query)?;
    let vector_results = vector_search(store, &query_vector, source_limit)?;
    tracing::debug!(count = vector_results.len(), limit = source_limit, "vector");

    let fused = rrf_fuse(&[keyword_results, vector_results], options.rrf_k);
    tracing::debug!(count = fused.len(), rrf_k = options.rrf_k, "fusion");

    let window: Vec<RankedItem> = fused.into_iter().take(options.rerank_top_k).collect();
    let candidates = hydrate_candidates(store, &window)?;
    tracing::debug!(count = candidates.len(), "candidates");

    let reranked = rerank_candidates(reranker, query, candidates)?;
    tracing::debug!(count = reranked.len(), "rerank");

    let hits = reranked
        .into_iter()
        .map(|c| QueryHit {
            chunk: c.chunk,
            title: c.title,
            body: c.body,
            score: c.score,
        })
        .collect();
    Ok(select_top_n(hits, options.top_n))
}

/// Resolve fused ranked items into rerank candidates.
///
/// Malformed chunk identifiers and identifiers with no stored document are
/// skipped with a warning, never fatal.
fn hydrate_candidates(
    store: &IndexStore,
    window: &[RankedItem],
) -> Result<Vec<RerankCandidate>, StorageError> {
    let mut candidates = Vec::with_capacity(window.len());
    for item in window {
        let Some(chunk) = ChunkRef::decode(&item.id) else {
            tracing::warn!(id = %item.id, "skipping malformed chunk id");
            continue;
        };
        let Some(document) = store.chunk_document(&chunk)? else {
            tracing::warn!(id = %item.id, "skipping chunk with no stored document");
            continue;
        };
        candidates.push(RerankCandidate {
            chunk,
            title: document.title,
            body: document.body,
            score: item.score,
        });
    }
    Ok(candidates)
}
