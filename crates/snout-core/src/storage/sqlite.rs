//! SQLite index store.
//!
//! One database holds the note rows, the chunk-level FTS5 lexical index, the
//! chunk embeddings, and the sync checkpoint. The whole pipeline runs as a
//! single exclusive process instance against one database, so a single
//! connection suffices; per-note writes are one transaction each.

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};

use crate::chunk_id::ChunkRef;
use crate::pipeline::chunking::NoteChunk;
use crate::pipeline::{vector_from_bytes, vector_to_bytes};
use crate::source::Note;
use crate::sync::SyncCheckpoint;

use super::migrations::MIGRATIONS;

/// Sync state key for the checkpoint timestamp
const LAST_SYNC_AT_KEY: &str = "lastSyncAt";
/// Sync state key for the checkpoint note id
const LAST_SYNC_ID_KEY: &str = "lastSyncId";

/// Storage error type
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Initialization error
    #[error("initialization error: {0}")]
    Init(String),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// One stored chunk embedding
#[derive(Debug, Clone)]
pub struct EmbeddingRow {
    /// Chunk identity
    pub chunk: ChunkRef,
    /// Decoded vector
    pub vector: Vec<f32>,
    /// Stored dimensionality
    pub dim: usize,
}

/// Stored text of one chunk, hydrated for reranking
#[derive(Debug, Clone)]
pub struct ChunkDocument {
    /// Note title
    pub title: String,
    /// Chunk body text
    pub body: String,
}

/// The snout index database
pub struct IndexStore {
    conn: Connection,
}

impl IndexStore {
    /// Open (creating and migrating as needed) the index database at `path`
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open an in-memory index, for tests
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(mut conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        migrate_legacy_embeddings(&mut conn)?;
        apply_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    // ------------------------------------------------------------------
    // Query-path accessors
    // ------------------------------------------------------------------

    /// Run an FTS5 MATCH, returning raw `bm25()` scores with the engine's
    /// best-first ordering (lower raw score is better)
    pub fn fts_match(&self, match_query: &str, limit: usize) -> Result<Vec<(ChunkRef, f64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT note_id, chunk_index, bm25(chunks_lexical) AS score
             FROM chunks_lexical
             WHERE chunks_lexical MATCH ?1
             ORDER BY score
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![match_query, limit as i64], |row| {
            Ok((
                ChunkRef::new(row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u32),
                row.get::<_, f64>(2)?,
            ))
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// All stored chunk embeddings. Rows whose blob does not decode are
    /// skipped with a warning.
    pub fn embedding_rows(&self) -> Result<Vec<EmbeddingRow>> {
        let mut stmt = self
            .conn
            .prepare("SELECT note_id, chunk_index, vector, dim FROM embeddings")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, Vec<u8>>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut embeddings = Vec::new();
        for row in rows {
            let (note_id, chunk_index, blob, dim) = row?;
            match vector_from_bytes(&blob) {
                Some(vector) => embeddings.push(EmbeddingRow {
                    chunk: ChunkRef::new(note_id, chunk_index as u32),
                    vector,
                    dim: dim as usize,
                }),
                None => {
                    tracing::warn!(%note_id, chunk_index, "skipping undecodable embedding blob");
                }
            }
        }
        Ok(embeddings)
    }

    /// Fetch one chunk's stored text
    pub fn chunk_document(&self, chunk: &ChunkRef) -> Result<Option<ChunkDocument>> {
        let doc = self
            .conn
            .query_row(
                "SELECT title, body FROM chunks_lexical WHERE note_id = ?1 AND chunk_index = ?2",
                params![chunk.note_id, chunk.chunk_index],
                |row| {
                    Ok(ChunkDocument {
                        title: row.get(0)?,
                        body: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(doc)
    }

    // ------------------------------------------------------------------
    // Sync-path accessors
    // ------------------------------------------------------------------

    /// Content hash of every stored note, keyed by note id
    pub fn note_hashes(&self) -> Result<HashMap<String, String>> {
        let mut stmt = self.conn.prepare("SELECT id, content_hash FROM notes")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<std::result::Result<HashMap<_, _>, _>>()?)
    }

    /// Stored embedding count per note id
    pub fn embedding_counts(&self) -> Result<HashMap<String, i64>> {
        let mut stmt = self
            .conn
            .prepare("SELECT note_id, COUNT(*) FROM embeddings GROUP BY note_id")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        Ok(rows.collect::<std::result::Result<HashMap<_, _>, _>>()?)
    }

    /// Read the persisted checkpoint, if any
    pub fn load_checkpoint(&self) -> Result<Option<SyncCheckpoint>> {
        let Some(raw_at) = self.sync_state_value(LAST_SYNC_AT_KEY)? else {
            return Ok(None);
        };
        let Ok(last_sync_at) = raw_at.parse::<i64>() else {
            tracing::warn!(value = %raw_at, "ignoring unparsable checkpoint timestamp");
            return Ok(None);
        };
        let last_sync_id = self.sync_state_value(LAST_SYNC_ID_KEY)?.unwrap_or_default();
        Ok(Some(SyncCheckpoint {
            last_sync_at,
            last_sync_id,
        }))
    }

    /// Persist the checkpoint on its own, outside any note commit
    pub fn write_checkpoint(&mut self, checkpoint: &SyncCheckpoint) -> Result<()> {
        let tx = self.conn.transaction()?;
        upsert_checkpoint(&tx, checkpoint)?;
        tx.commit()?;
        Ok(())
    }

    /// Commit one note's unit of work atomically: note row, full replacement
    /// of its lexical chunk rows and embedding set, and checkpoint
    /// advancement. Partial writes for a note are never observable.
    pub fn apply_note(
        &mut self,
        note: &Note,
        content_hash: &str,
        chunks: &[NoteChunk],
        embeddings: &[Vec<f32>],
        checkpoint: &SyncCheckpoint,
    ) -> Result<()> {
        debug_assert_eq!(chunks.len(), embeddings.len());

        let tx = self.conn.transaction()?;

        tx.execute(
            "INSERT INTO notes (id, title, body, updated_at, content_hash)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                 title = excluded.title,
                 body = excluded.body,
                 updated_at = excluded.updated_at,
                 content_hash = excluded.content_hash",
            params![note.id, note.title, note.body, note.updated_at, content_hash],
        )?;

        tx.execute(
            "DELETE FROM chunks_lexical WHERE note_id = ?1",
            params![note.id],
        )?;
        tx.execute("DELETE FROM embeddings WHERE note_id = ?1", params![note.id])?;

        for (chunk, vector) in chunks.iter().zip(embeddings) {
            tx.execute(
                "INSERT INTO chunks_lexical (note_id, chunk_index, title, body)
                 VALUES (?1, ?2, ?3, ?4)",
                params![note.id, chunk.index, note.title, chunk.text],
            )?;
            tx.execute(
                "INSERT INTO embeddings (note_id, chunk_index, vector, dim)
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    note.id,
                    chunk.index,
                    vector_to_bytes(vector),
                    vector.len() as i64
                ],
            )?;
        }

        upsert_checkpoint(&tx, checkpoint)?;
        tx.commit()?;
        Ok(())
    }

    fn sync_state_value(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM sync_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

fn upsert_checkpoint(conn: &Connection, checkpoint: &SyncCheckpoint) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO sync_state (key, value) VALUES (?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )?;
    stmt.execute(params![
        LAST_SYNC_AT_KEY,
        checkpoint.last_sync_at.to_string()
    ])?;
    stmt.execute(params![LAST_SYNC_ID_KEY, checkpoint.last_sync_id])?;
    Ok(())
}

// ============================================================================
// MIGRATIONS
// ============================================================================

fn apply_migrations(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        );",
    )?;
    let current: u32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        let tx = conn.transaction()?;
        tx.execute_batch(migration.up)?;
        tx.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
            params![migration.version, Utc::now().to_rfc3339()],
        )?;
        tx.commit()?;
        tracing::info!(
            version = migration.version,
            description = migration.description,
            "applied migration"
        );
    }
    Ok(())
}

/// An earlier schema stored a single embedding per note with no chunk index.
/// Rebuild such a table with `chunk_index = 0` for every existing row rather
/// than discarding them.
fn migrate_legacy_embeddings(conn: &mut Connection) -> Result<()> {
    let mut columns = Vec::new();
    {
        let mut stmt = conn.prepare("PRAGMA table_info(embeddings)")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(1))?;
        for row in rows {
            columns.push(row?);
        }
    }
    if columns.is_empty() || columns.iter().any(|c| c == "chunk_index") {
        return Ok(());
    }

    let tx = conn.transaction()?;
    tx.execute_batch(
        "CREATE TABLE embeddings_v2 (
            note_id TEXT NOT NULL,
            chunk_index INTEGER NOT NULL,
            vector BLOB NOT NULL,
            dim INTEGER NOT NULL,
            PRIMARY KEY (note_id, chunk_index)
        );

        INSERT INTO embeddings_v2 (note_id, chunk_index, vector, dim)
        SELECT note_id, 0, vector, dim FROM embeddings;

        DROP TABLE embeddings;
        ALTER TABLE embeddings_v2 RENAME TO embeddings;",
    )?;
    tx.commit()?;
    tracing::info!("migrated legacy per-note embeddings to chunk_index = 0");
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
