//! End-to-end incremental sync: checkpoint advancement, resumption, retry.

use snout_core::models::{Embedder, ModelError, Token};
use snout_core::source::bear::read_notes;
use snout_core::sync::{SyncOptions, run_sync};
use snout_core::IndexStore;

use snout_e2e_tests::{FixtureNote, MockEmbedder, bear_fixture};

const BASE_TS: f64 = 700_000_000.0;

fn sync_file_store(store: &mut IndexStore, notes: &[FixtureNote<'_>]) -> snout_core::SyncReport {
    let dir = tempfile::tempdir().unwrap();
    let bear_path = bear_fixture(&dir, notes);
    let source_notes = read_notes(&bear_path, None).unwrap();
    run_sync(
        store,
        source_notes,
        &MockEmbedder,
        &SyncOptions::default(),
        &mut |_| {},
    )
    .unwrap()
}

#[test]
fn second_sync_processes_only_new_and_edited_notes() {
    let mut store = IndexStore::open_in_memory().unwrap();

    let report = sync_file_store(
        &mut store,
        &[
            FixtureNote::new("n1", "One", "raft consensus", BASE_TS),
            FixtureNote::new("n2", "Two", "compost heap", BASE_TS + 10.0),
        ],
    );
    assert_eq!(report.updated, 2);

    // One new note arrives; the old two are untouched
    let report = sync_file_store(
        &mut store,
        &[
            FixtureNote::new("n1", "One", "raft consensus", BASE_TS),
            FixtureNote::new("n2", "Two", "compost heap", BASE_TS + 10.0),
            FixtureNote::new("n3", "Three", "risotto recipe", BASE_TS + 20.0),
        ],
    );
    assert_eq!(report.processed, 1);
    assert_eq!(report.updated, 1);
    assert_eq!(report.skipped, 0);
}

#[test]
fn checkpoint_survives_store_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("snout.db");

    {
        let mut store = IndexStore::open(&db_path).unwrap();
        sync_file_store(
            &mut store,
            &[FixtureNote::new("n1", "One", "raft consensus", BASE_TS)],
        );
    }

    let mut store = IndexStore::open(&db_path).unwrap();
    let checkpoint = store.load_checkpoint().unwrap().unwrap();
    assert_eq!(checkpoint.last_sync_id, "n1");

    let report = sync_file_store(
        &mut store,
        &[FixtureNote::new("n1", "One", "raft consensus", BASE_TS)],
    );
    assert_eq!(report.processed, 0);
}

/// Fails embedding for any text containing a poison marker
struct PoisonEmbedder;

impl Embedder for PoisonEmbedder {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, ModelError> {
        MockEmbedder.tokenize(text)
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        if text.contains("poison") {
            return Err(ModelError::Inference("poisoned input".to_string()));
        }
        MockEmbedder.embed(text)
    }

    fn context_size(&self) -> usize {
        MockEmbedder.context_size()
    }
}

#[test]
fn failed_note_does_not_abort_the_sync_and_is_retried() {
    let mut store = IndexStore::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let bear_path = bear_fixture(
        &dir,
        &[
            FixtureNote::new("n1", "Bad", "poison body", BASE_TS),
            FixtureNote::new("n2", "Good", "raft consensus", BASE_TS + 10.0),
        ],
    );
    let source_notes = read_notes(&bear_path, None).unwrap();

    let report = run_sync(
        &mut store,
        source_notes.clone(),
        &PoisonEmbedder,
        &SyncOptions::default(),
        &mut |_| {},
    )
    .unwrap();
    assert_eq!(report.failed, 1);
    assert_eq!(report.updated, 1);
    // The good note committed; the bad one left no partial state
    assert!(store.note_hashes().unwrap().contains_key("n2"));
    assert!(!store.note_hashes().unwrap().contains_key("n1"));

    // A healthy embedder picks the failed note up on the next run
    let report = run_sync(
        &mut store,
        source_notes,
        &MockEmbedder,
        &SyncOptions::default(),
        &mut |_| {},
    )
    .unwrap();
    assert_eq!(report.updated, 1);
    assert!(store.note_hashes().unwrap().contains_key("n1"));
}

#[test]
fn progress_callback_sees_every_processed_note() {
    let mut store = IndexStore::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let bear_path = bear_fixture(
        &dir,
        &[
            FixtureNote::new("n1", "One", "raft", BASE_TS),
            FixtureNote::new("n2", "Two", "paxos", BASE_TS + 10.0),
        ],
    );
    let source_notes = read_notes(&bear_path, None).unwrap();

    let mut seen = Vec::new();
    run_sync(
        &mut store,
        source_notes,
        &MockEmbedder,
        &SyncOptions::default(),
        &mut |p| seen.push((p.processed, p.total)),
    )
    .unwrap();

    assert_eq!(seen, vec![(1, 2), (2, 2)]);
}
