//! Brute-force vector scoring.
//!
//! Embeddings are unit-normalized when generated, so relevance is the dot
//! product between the unit query vector and each stored chunk vector
//! (cosine similarity). The corpus is scanned in full; at thousands of chunks
//! this is fast enough that no approximate nearest-neighbor structure is
//! justified. The K best candidates are kept in a bounded min-heap rather
//! than sorting the whole corpus.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::storage::{IndexStore, StorageError};

use super::RankedItem;

/// Normalize a vector to unit L2 length.
///
/// A degenerate zero vector is returned unchanged: the norm is floored at 1
/// so there is never a division by zero.
pub fn normalize_unit(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut vector {
            *x /= norm;
        }
    }
    vector
}

/// Encode a vector as a little-endian f32 blob for storage
pub fn vector_to_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Decode a stored little-endian f32 blob; `None` when the length is not a
/// multiple of four bytes
pub fn vector_from_bytes(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    )
}

// ============================================================================
// BOUNDED TOP-K
// ============================================================================

#[derive(PartialEq, Eq)]
struct Scored {
    score: OrderedScore,
    id: String,
}

#[derive(PartialEq)]
struct OrderedScore(f32);

impl Eq for OrderedScore {}

impl Ord for OrderedScore {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for OrderedScore {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.score
            .cmp(&other.score)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Incremental bounded best-K collector
pub struct TopK {
    k: usize,
    heap: BinaryHeap<Reverse<Scored>>,
}

impl TopK {
    /// Create a collector keeping at most `k` items
    pub fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k.saturating_add(1)),
        }
    }

    /// Offer a scored item: inserted while under capacity, otherwise it
    /// replaces the current minimum only when strictly better.
    pub fn push(&mut self, id: String, score: f32) {
        if self.k == 0 {
            return;
        }
        if self.heap.len() < self.k {
            self.heap.push(Reverse(Scored {
                score: OrderedScore(score),
                id,
            }));
            return;
        }
        let beats_min = self
            .heap
            .peek()
            .is_some_and(|Reverse(min)| score > min.score.0);
        if beats_min {
            self.heap.pop();
            self.heap.push(Reverse(Scored {
                score: OrderedScore(score),
                id,
            }));
        }
    }

    /// Drain into a best-first ranking
    pub fn into_ranked(self) -> Vec<RankedItem> {
        let mut items: Vec<Scored> = self.heap.into_iter().map(|Reverse(s)| s).collect();
        items.sort_by(|a, b| b.cmp(a));
        items
            .into_iter()
            .map(|s| RankedItem {
                id: s.id,
                score: s.score.0,
            })
            .collect()
    }
}

// ============================================================================
// SEARCH
// ============================================================================

/// Score every stored chunk embedding against a unit query vector and return
/// the best `limit` chunks, best-first.
///
/// Rows whose stored dimensionality disagrees with the query's are skipped;
/// schema drift across model changes must not crash retrieval.
pub fn vector_search(
    store: &IndexStore,
    query_vector: &[f32],
    limit: usize,
) -> Result<Vec<RankedItem>, StorageError> {
    let mut top = TopK::new(limit);
    let mut skipped = 0usize;

    for row in store.embedding_rows()? {
        if row.vector.len() != query_vector.len() {
            skipped += 1;
            continue;
        }
        let dot: f32 = row
            .vector
            .iter()
            .zip(query_vector)
            .map(|(a, b)| a * b)
            .sum();
        top.push(row.chunk.encode(), dot);
    }

    if skipped > 0 {
        tracing::warn!(skipped, "skipped embeddings with mismatched dimensions");
    }
    Ok(top.into_ranked())
}

// ============================================================================
// TESTS
// ============================================================================
