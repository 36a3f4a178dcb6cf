//! Database migrations.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "Initial schema: notes, chunk-level FTS5 index, embeddings, sync state",
    up: MIGRATION_V1_UP,
}];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: initial schema
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS notes (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    body TEXT NOT NULL,
    updated_at INTEGER NOT NULL,
    content_hash TEXT NOT NULL
);

-- Chunk-granularity lexical index; bm25() over title + body
CREATE VIRTUAL TABLE IF NOT EXISTS chunks_lexical USING fts5(
    note_id UNINDEXED,
    chunk_index UNINDEXED,
    title,
    body
);

-- One row per chunk; vectors stored as little-endian f32 blobs
CREATE TABLE IF NOT EXISTS embeddings (
    note_id TEXT NOT NULL,
    chunk_index INTEGER NOT NULL,
    vector BLOB NOT NULL,
    dim INTEGER NOT NULL,
    PRIMARY KEY (note_id, chunk_index)
);

CREATE TABLE IF NOT EXISTS sync_state (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;
