//! End-to-end retrieval: Bear fixture -> sync -> hybrid query.

use snout_core::pipeline::{QueryOptions, run_query};
use snout_core::source::bear::read_notes;
use snout_core::sync::{SyncOptions, run_sync};
use snout_core::{IndexStore, QueryHit};

use snout_e2e_tests::{FixtureNote, MockEmbedder, MockReranker, bear_fixture};

/// Core Data seconds, safely inside the sniffing range
const BASE_TS: f64 = 700_000_000.0;

fn synced_store(notes: &[FixtureNote<'_>]) -> IndexStore {
    let dir = tempfile::tempdir().unwrap();
    let bear_path = bear_fixture(&dir, notes);
    let source_notes = read_notes(&bear_path, None).unwrap();

    let mut store = IndexStore::open_in_memory().unwrap();
    let report = run_sync(
        &mut store,
        source_notes,
        &MockEmbedder,
        &SyncOptions::default(),
        &mut |_| {},
    )
    .unwrap();
    assert_eq!(report.failed, 0);
    store
}

fn query(store: &IndexStore, text: &str) -> Vec<QueryHit> {
    run_query(
        store,
        &MockEmbedder,
        &MockReranker,
        text,
        &QueryOptions::default(),
    )
    .unwrap()
}

#[test]
fn pipeline_surfaces_the_relevant_chunk() {
    let store = synced_store(&[
        FixtureNote::new(
            "note-consensus",
            "Distributed systems",
            "raft and paxos consensus algorithms compared",
            BASE_TS,
        ),
        FixtureNote::new(
            "note-recipe",
            "Dinner ideas",
            "a slow risotto recipe with saffron",
            BASE_TS + 10.0,
        ),
        FixtureNote::new(
            "note-garden",
            "Garden log",
            "compost turned, beds mulched",
            BASE_TS + 20.0,
        ),
    ]);

    let hits = query(&store, "paxos consensus");
    assert!(!hits.is_empty());
    assert_eq!(hits[0].chunk.note_id, "note-consensus");
    assert_eq!(hits[0].chunk.chunk_index, 0);
    assert!(hits[0].body.contains("paxos"));
}

#[test]
fn fusion_ranks_single_signal_hits_above_no_signal_items() {
    // "synthesizers" embeds like "synthesizer" (substring) but is a different
    // FTS term: a vector-only hit. "ambient" is outside the embedding
    // vocabulary: a lexical-only hit. The risotto note matches neither signal.
    let store = synced_store(&[
        FixtureNote::new(
            "note-vector-hit",
            "Studio",
            "my synthesizers need new patch cables",
            BASE_TS,
        ),
        FixtureNote::new(
            "note-lexical-hit",
            "Listening",
            "ambient records for late nights",
            BASE_TS + 10.0,
        ),
        FixtureNote::new(
            "note-unrelated",
            "Dinner ideas",
            "a slow risotto recipe with saffron",
            BASE_TS + 20.0,
        ),
    ]);

    let hits = query(&store, "synthesizer ambient");
    let order: Vec<&str> = hits.iter().map(|h| h.chunk.note_id.as_str()).collect();

    let vector_pos = order.iter().position(|id| *id == "note-vector-hit");
    let lexical_pos = order.iter().position(|id| *id == "note-lexical-hit");
    let unrelated_pos = order.iter().position(|id| *id == "note-unrelated");

    assert!(vector_pos.is_some());
    assert!(lexical_pos.is_some());
    if let Some(unrelated) = unrelated_pos {
        assert!(vector_pos.unwrap() < unrelated);
        assert!(lexical_pos.unwrap() < unrelated);
    }
}

#[test]
fn near_identical_chunks_from_different_notes_both_surface() {
    let store = synced_store(&[
        FixtureNote::new(
            "note-a",
            "Consensus I",
            "raft consensus notes",
            BASE_TS,
        ),
        FixtureNote::new(
            "note-b",
            "Consensus II",
            "raft consensus notes again",
            BASE_TS + 10.0,
        ),
        FixtureNote::new(
            "note-c",
            "Garden log",
            "compost turned today",
            BASE_TS + 20.0,
        ),
    ]);

    let hits = query(&store, "raft consensus");
    assert!(hits.len() >= 2);
    let top2: Vec<&str> = hits[..2].iter().map(|h| h.chunk.note_id.as_str()).collect();
    assert!(top2.contains(&"note-a"));
    assert!(top2.contains(&"note-b"));
}

#[test]
fn trashed_notes_are_never_indexed() {
    let mut trashed = FixtureNote::new(
        "note-trashed",
        "Secret",
        "raft consensus in the bin",
        BASE_TS + 30.0,
    );
    trashed.trashed = true;

    let store = synced_store(&[
        FixtureNote::new("note-kept", "Kept", "raft consensus notes", BASE_TS),
        trashed,
    ]);

    let hits = query(&store, "raft consensus");
    assert!(hits.iter().all(|h| h.chunk.note_id != "note-trashed"));
    assert!(!store.note_hashes().unwrap().contains_key("note-trashed"));
}

#[test]
fn top_n_bounds_the_result_count() {
    let store = synced_store(&[
        FixtureNote::new("n1", "One", "raft consensus alpha", BASE_TS),
        FixtureNote::new("n2", "Two", "raft consensus beta", BASE_TS + 1.0),
        FixtureNote::new("n3", "Three", "raft consensus gamma", BASE_TS + 2.0),
    ]);

    let hits = run_query(
        &store,
        &MockEmbedder,
        &MockReranker,
        "raft",
        &QueryOptions {
            top_n: 2,
            ..QueryOptions::default()
        },
    )
    .unwrap();
    assert_eq!(hits.len(), 2);
}
