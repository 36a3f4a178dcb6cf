//! Keyword search adapter over the FTS5 engine.
//!
//! FTS5's `bm25()` returns a raw statistic where lower is better and values
//! may be negative. The adapter normalizes that into a positive, roughly
//! signal-comparable scalar without asserting a probabilistic meaning.

use crate::storage::{IndexStore, StorageError};

use super::RankedItem;

/// Normalize a raw engine relevance statistic.
///
/// NaN maps to 0, negative raw scores to their magnitude, non-negative ones
/// to `1 / (1 + raw)`.
pub fn normalize_score(raw: f64) -> f64 {
    if raw.is_nan() {
        return 0.0;
    }
    if raw < 0.0 {
        return -raw;
    }
    1.0 / (1.0 + raw)
}

/// Turn free user text into an FTS5 MATCH expression that cannot trip the
/// engine's query syntax: bare terms, quoted, joined with OR.
pub fn sanitize_match_query(query: &str) -> String {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(|term| format!("\"{term}\""))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Run keyword search, returning normalized chunk-level rankings best-first.
pub fn keyword_search(
    store: &IndexStore,
    query: &str,
    limit: usize,
) -> Result<Vec<RankedItem>, StorageError> {
    let match_query = sanitize_match_query(query);
    if match_query.is_empty() {
        return Ok(vec![]);
    }

    let rows = store.fts_match(&match_query, limit)?;
    Ok(rows
        .into_iter()
        .map(|(chunk, raw)| RankedItem {
            id: chunk.encode(),
            score: normalize_score(raw) as f32,
        })
        .collect())
}

// ============================================================================
// TESTS
// ============================================================================
