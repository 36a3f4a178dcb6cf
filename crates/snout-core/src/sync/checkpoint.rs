//! Sync checkpoint.
//!
//! The checkpoint is a `(timestamp, id)` watermark over the total order
//! `(updated_at ascending, id ascending)`. The id tie-break is load-bearing:
//! it gives the watermark a deterministic "next" pointer even when several
//! notes share a timestamp.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::source::Note;

/// The `(timestamp, id)` watermark of the most recently inspected note
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCheckpoint {
    /// Modification time of the watermark note, epoch milliseconds
    pub last_sync_at: i64,
    /// Id of the watermark note
    pub last_sync_id: String,
}

/// Total order for sync processing: `updated_at` ascending, id ascending
pub fn compare_notes(a: &Note, b: &Note) -> Ordering {
    a.updated_at
        .cmp(&b.updated_at)
        .then_with(|| a.id.cmp(&b.id))
}

/// Whether a note lies strictly past the resumption frontier.
///
/// With no checkpoint every note qualifies. A note exactly at the checkpoint
/// timestamp qualifies only when its id sorts after the recorded id.
pub fn is_after_checkpoint(note: &Note, checkpoint: Option<&SyncCheckpoint>) -> bool {
    let Some(checkpoint) = checkpoint else {
        return true;
    };
    match note.updated_at.cmp(&checkpoint.last_sync_at) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => note.id > checkpoint.last_sync_id,
    }
}

/// Advance the watermark to `note` when it sorts after the current one;
/// checkpoints never move backward.
pub fn advance_checkpoint(current: Option<&SyncCheckpoint>, note: &Note) -> SyncCheckpoint {
    match current {
        None => SyncCheckpoint {
            last_sync_at: note.updated_at,
            last_sync_id: note.id.clone(),
        },
        Some(current) if is_after_checkpoint(note, Some(current)) => SyncCheckpoint {
            last_sync_at: note.updated_at,
            last_sync_id: note.id.clone(),
        },
        Some(current) => current.clone(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn make_note(id: &str, updated_at: i64) -> Note {
        Note {
            id: id.to_string(),
            title: String::new(),
            body: String::new(),
            updated_at,
        }
    }

    #[test]
    fn notes_sort_by_updated_at_then_id() {
        let mut notes = vec![make_note("b", 2), make_note("a", 2), make_note("c", 1)];
        notes.sort_by(compare_notes);
        let ids: Vec<&str> = notes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn frontier_is_strict() {
        let checkpoint = SyncCheckpoint {
            last_sync_at: 100,
            last_sync_id: "b".to_string(),
        };
        let cp = Some(&checkpoint);

        assert!(!is_after_checkpoint(&make_note("a", 99), cp));
        assert!(!is_after_checkpoint(&make_note("b", 100), cp));
        assert!(is_after_checkpoint(&make_note("c", 100), cp));
        assert!(is_after_checkpoint(&make_note("a", 101), cp));
    }

    #[test]
    fn no_checkpoint_passes_everything() {
        assert!(is_after_checkpoint(&make_note("a", 0), None));
    }

    #[test]
    fn checkpoint_only_moves_forward() {
        let checkpoint = SyncCheckpoint {
            last_sync_at: 100,
            last_sync_id: "b".to_string(),
        };
        let cp = Some(&checkpoint);

        assert_eq!(advance_checkpoint(cp, &make_note("a", 99)), checkpoint);
        assert_eq!(advance_checkpoint(cp, &make_note("a", 100)), checkpoint);
        assert_eq!(
            advance_checkpoint(cp, &make_note("c", 100)),
            SyncCheckpoint {
                last_sync_at: 100,
                last_sync_id: "c".to_string(),
            }
        );
        assert_eq!(
            advance_checkpoint(cp, &make_note("a", 101)),
            SyncCheckpoint {
                last_sync_at: 101,
                last_sync_id: "a".to_string(),
            }
        );
    }

    #[test]
    fn first_note_seeds_the_checkpoint() {
        let seeded = advance_checkpoint(None, &make_note("a", 42));
        assert_eq!(seeded.last_sync_at, 42);
        assert_eq!(seeded.last_sync_id, "a");
    }
}
