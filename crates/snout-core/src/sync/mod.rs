//! Incremental sync.
//!
//! The planner orders source notes under `(updated_at, id)`, selects the
//! union of notes past the checkpoint and notes failing the integrity check,
//! and processes each selected note as one atomic unit: chunking, embedding,
//! storage replacement, and checkpoint advancement commit together. The
//! checkpoint is a scan-pruning optimization; the integrity check remains
//! authoritative for correctness.

mod checkpoint;
mod integrity;

pub use checkpoint::{SyncCheckpoint, advance_checkpoint, compare_notes, is_after_checkpoint};
pub use integrity::{IntegrityCheck, needs_resync};

use std::collections::HashMap;

use crate::hash::content_hash;
use crate::models::{Embedder, ModelError};
use crate::pipeline::chunking::{NoteChunk, chunk_note_content};
use crate::source::Note;
use crate::storage::{IndexStore, StorageError};

/// Hard cap on chunk windows per note; chunking past this truncates with a
/// warning rather than erroring
pub const MAX_EMBEDDING_CHUNKS: usize = 1000;

/// Sync error type (fatal for the invocation; per-note failures are counted
/// in the report instead)
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Storage failure
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Model failure
    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Sync parameters
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Chunk window size in tokens, capped by the embedder context
    pub chunk_size: usize,
    /// Overlap between adjacent windows, in tokens
    pub chunk_overlap: usize,
    /// Maximum windows per note
    pub max_chunks: usize,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            chunk_size: crate::config::DEFAULT_CHUNK_SIZE,
            chunk_overlap: crate::config::DEFAULT_CHUNK_OVERLAP,
            max_chunks: MAX_EMBEDDING_CHUNKS,
        }
    }
}

/// Live counters reported after each processed note
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncProgress {
    /// Notes handled so far
    pub processed: usize,
    /// Selected notes in total
    pub total: usize,
    /// Notes whose content was reprocessed
    pub updated: usize,
    /// Notes that only advanced the watermark
    pub skipped: usize,
    /// Notes whose processing failed
    pub failed: usize,
}

/// Final sync outcome
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncReport {
    /// Notes handled
    pub processed: usize,
    /// Notes whose content was reprocessed
    pub updated: usize,
    /// Notes that only advanced the watermark
    pub skipped: usize,
    /// Notes whose processing failed and are left for the next run
    pub failed: usize,
    /// Notes whose chunking hit the per-note cap
    pub truncated: usize,
}

/// One note's planning outcome
#[derive(Debug, Clone)]
pub struct PlanEntry {
    /// The note, in processing order
    pub note: Note,
    /// Fingerprint of the note's current content
    pub content_hash: String,
    /// Whether the note has any content
    pub has_content: bool,
    /// Integrity verdict: derived artifacts must be rebuilt
    pub needs_processing: bool,
    /// Watermark verdict: the note lies past the checkpoint
    pub after_checkpoint: bool,
}

impl PlanEntry {
    /// Whether the sync selects this note at all (union of both predicates)
    pub fn selected(&self) -> bool {
        self.after_checkpoint || self.needs_processing
    }
}

/// Order the source notes and derive each one's plan entry.
pub fn build_plan(
    mut notes: Vec<Note>,
    checkpoint: Option<&SyncCheckpoint>,
    existing_hashes: &HashMap<String, String>,
    embedding_counts: &HashMap<String, i64>,
) -> Vec<PlanEntry> {
    notes.sort_by(compare_notes);
    notes
        .into_iter()
        .map(|note| {
            let content = note.content();
            let hash = content_hash(&content);
            let has_content = !content.is_empty();
            let needs_processing = needs_resync(&IntegrityCheck {
                content_hash: &hash,
                existing_hash: existing_hashes.get(&note.id).map(String::as_str),
                embeddings_count: *embedding_counts.get(&note.id).unwrap_or(&0),
                has_content,
            });
            let after_checkpoint = is_after_checkpoint(&note, checkpoint);
            PlanEntry {
                note,
                content_hash: hash,
                has_content,
                needs_processing,
                after_checkpoint,
            }
        })
        .collect()
}

/// Sync the given source notes into the index.
///
/// Per-note chunking, embedding, or storage failures are logged and counted;
/// the failed note's checkpoint is not advanced by it and its stale artifacts
/// make the integrity check reselect it next run. Only invocation-level
/// failures (reading the plan inputs, advancing the watermark for a skipped
/// note) abort the sync.
pub fn run_sync(
    store: &mut IndexStore,
    notes: Vec<Note>,
    embedder: &dyn Embedder,
    options: &SyncOptions,
    progress: &mut dyn FnMut(&SyncProgress),
) -> Result<SyncReport, SyncError> {
    let checkpoint = store.load_checkpoint()?;
    let existing_hashes = store.note_hashes()?;
    let embedding_counts = store.embedding_counts()?;

    let plan = build_plan(
        notes,
        checkpoint.as_ref(),
        &existing_hashes,
        &embedding_counts,
    );
    let candidates: Vec<PlanEntry> = plan.into_iter().filter(PlanEntry::selected).collect();
    let total = candidates.len();
    tracing::debug!(total, "sync plan built");

    // The model context caps the window size
    let chunk_size = options.chunk_size.clamp(1, embedder.context_size().max(1));
    let chunk_overlap = options.chunk_overlap.min(chunk_size.saturating_sub(1));

    let mut current = checkpoint;
    let mut report = SyncReport::default();

    for entry in candidates {
        let next = advance_checkpoint(current.as_ref(), &entry.note);

        if entry.needs_processing {
            match process_note(
                store,
                embedder,
                &entry,
                chunk_size,
                chunk_overlap,
                options.max_chunks,
                &next,
                &mut report,
            ) {
                Ok(()) => {
                    report.updated += 1;
                    current = Some(next);
                }
                Err(err) => {
                    tracing::warn!(
                        note_id = %entry.note.id,
                        error = %err,
                        "note processing failed; it stays eligible for the next run"
                    );
                    report.failed += 1;
                }
            }
        } else {
            if current.as_ref() != Some(&next) {
                store.write_checkpoint(&next)?;
            }
            report.skipped += 1;
            current = Some(next);
        }

        report.processed += 1;
        progress(&SyncProgress {
            processed: report.processed,
            total,
            updated: report.updated,
            skipped: report.skipped,
            failed: report.failed,
        });
    }

    Ok(report)
}

/// Chunk, embed, and commit one note atomically.
#[allow(clippy::too_many_arguments)]
fn process_note(
    store: &mut IndexStore,
    embedder: &dyn Embedder,
    entry: &PlanEntry,
    chunk_size: usize,
    chunk_overlap: usize,
    max_chunks: usize,
    next_checkpoint: &SyncCheckpoint,
    report: &mut SyncReport,
) -> Result<(), SyncError> {
    let mut chunks: Vec<NoteChunk> = Vec::new();
    let mut embeddings: Vec<Vec<f32>> = Vec::new();

    if entry.has_content {
        let content = entry.note.content();
        let tokens = embedder.tokenize(&content)?;
        let chunked = chunk_note_content(&content, &tokens, chunk_size, chunk_overlap, max_chunks);
        if chunked.truncated {
            tracing::warn!(
                note_id = %entry.note.id,
                total_tokens = chunked.total_tokens,
                chunks = chunked.chunks.len(),
                "chunking truncated"
            );
            report.truncated += 1;
        }

        for chunk in chunked.chunks {
            embeddings.push(embedder.embed(&chunk.text)?);
            chunks.push(chunk);
        }
    }

    store.apply_note(
        &entry.note,
        &entry.content_hash,
        &chunks,
        &embeddings,
        next_checkpoint,
    )?;
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
