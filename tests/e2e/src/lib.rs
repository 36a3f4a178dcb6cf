//! Test harness for end-to-end pipeline tests: deterministic model mocks and
//! a Bear database fixture builder. No ONNX models are involved; the mocks
//! satisfy the same capability traits the real models do.

use std::path::PathBuf;

use snout_core::models::{Embedder, ModelError, RerankScorer, Token};
use snout_core::pipeline::normalize_unit;

/// Topic vocabulary spanned by the mock embedding space; one dimension per word
pub const VOCABULARY: &[&str] = &[
    "consensus", "raft", "paxos", "risotto", "recipe", "garden", "compost", "synthesizer",
];

/// Deterministic embedder: whitespace tokens, bag-of-vocabulary vectors.
///
/// Texts sharing vocabulary words get near-identical unit vectors, unrelated
/// texts get (near-)orthogonal ones, which is all the retrieval assertions
/// need.
pub struct MockEmbedder;

impl Embedder for MockEmbedder {
    fn tokenize(&self, text: &str) -> Result<Vec<Token>, ModelError> {
        let mut tokens = Vec::new();
        let mut start = None;
        for (i, c) in text.char_indices() {
            if c.is_whitespace() {
                if let Some(s) = start.take() {
                    tokens.push(Token {
                        id: tokens.len() as u32,
                        start: s,
                        end: i,
                    });
                }
            } else if start.is_none() {
                start = Some(i);
            }
        }
        if let Some(s) = start {
            tokens.push(Token {
                id: tokens.len() as u32,
                start: s,
                end: text.len(),
            });
        }
        Ok(tokens)
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = VOCABULARY
            .iter()
            .map(|word| lower.matches(word).count() as f32)
            .collect();
        // A trailing dimension keeps vocabulary-free texts off the zero vector
        vector.push(0.01);
        Ok(normalize_unit(vector))
    }

    fn context_size(&self) -> usize {
        512
    }
}

/// Deterministic reranker: fraction of query words appearing in the document.
pub struct MockReranker;

impl RerankScorer for MockReranker {
    fn score_all(&self, query: &str, documents: &[String]) -> Result<Vec<f32>, ModelError> {
        let query_lower = query.to_lowercase();
        let terms: Vec<&str> = query_lower.split_whitespace().collect();
        Ok(documents
            .iter()
            .map(|doc| {
                if terms.is_empty() {
                    return 0.0;
                }
                let doc_lower = doc.to_lowercase();
                let present = terms.iter().filter(|t| doc_lower.contains(**t)).count();
                present as f32 / terms.len() as f32
            })
            .collect())
    }
}

/// A note row for the Bear fixture, timestamps in Core Data seconds
pub struct FixtureNote<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub body: &'a str,
    pub modified: f64,
    pub trashed: bool,
}

impl<'a> FixtureNote<'a> {
    pub fn new(id: &'a str, title: &'a str, body: &'a str, modified: f64) -> Self {
        Self {
            id,
            title,
            body,
            modified,
            trashed: false,
        }
    }
}

/// Build a Bear-shaped SQLite database containing the given notes
pub fn bear_fixture(dir: &tempfile::TempDir, notes: &[FixtureNote<'_>]) -> PathBuf {
    let path = dir.path().join("bear.sqlite");
    let conn = rusqlite::Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS ZSFNOTE (
            Z_PK INTEGER PRIMARY KEY,
            ZUNIQUEIDENTIFIER TEXT,
            ZTITLE TEXT,
            ZTEXT TEXT,
            ZMODIFICATIONDATE REAL,
            ZTRASHED INTEGER
        );
        DELETE FROM ZSFNOTE;",
    )
    .unwrap();

    for note in notes {
        conn.execute(
            "INSERT INTO ZSFNOTE (ZUNIQUEIDENTIFIER, ZTITLE, ZTEXT, ZMODIFICATIONDATE, ZTRASHED)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                note.id,
                note.title,
                note.body,
                note.modified,
                note.trashed as i64
            ],
        )
        .unwrap();
    }
    path
}
