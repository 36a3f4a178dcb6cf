//! Storage module.
//!
//! SQLite-backed index: note rows, chunk-level FTS5 lexical index, chunk
//! embeddings, and the sync checkpoint, with versioned migrations.

mod migrations;
mod sqlite;

pub use migrations::MIGRATIONS;
pub use sqlite::{ChunkDocument, EmbeddingRow, IndexStore, Result, StorageError};
