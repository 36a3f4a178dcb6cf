//! Reciprocal Rank Fusion.
//!
//! Merges ranked lists by summing `1 / (k + rank)` per 1-based rank per list.
//! Only positions matter, never raw scores, so lexical and vector score scales
//! need no calibration against each other; items ranking well across multiple
//! signals beat items ranking extremely well in only one.

use std::collections::HashMap;

use super::RankedItem;

/// Fuse ranked lists (each ordered best-first) into one descending ordering.
///
/// Ids absent from a list contribute nothing from it. Ties break on id for a
/// deterministic ordering.
pub fn rrf_fuse(lists: &[Vec<RankedItem>], k: f32) -> Vec<RankedItem> {
    let mut scores: HashMap<String, f32> = HashMap::new();

    for list in lists {
        for (index, item) in list.iter().enumerate() {
            let rank = (index + 1) as f32;
            *scores.entry(item.id.clone()).or_default() += 1.0 / (k + rank);
        }
    }

    let mut fused: Vec<RankedItem> = scores
        .into_iter()
        .map(|(id, score)| RankedItem { id, score })
        .collect();
    fused.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.id.cmp(&b.id))
    });
    fused
}

// ============================================================================
// TESTS
// ============================================================================
