//! Note sources.
//!
//! A source reads an external, read-only note store and returns normalized
//! note records: source-stable id, title, body, and an updated-at timestamp
//! in epoch milliseconds. The Bear adapter is the shipped implementation;
//! any reader producing the same records is interchangeable.

pub mod bear;

use serde::{Deserialize, Serialize};

/// A normalized note record from the external source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    /// Source-stable identifier
    pub id: String,
    /// Note title
    pub title: String,
    /// Note body text
    pub body: String,
    /// Last modification time, epoch milliseconds
    pub updated_at: i64,
}

impl Note {
    /// Normalized content used for fingerprinting and embedding
    pub fn content(&self) -> String {
        crate::hash::note_content(&self.title, &self.body)
    }

    /// Modification time as a chrono timestamp, when representable
    pub fn updated_at_datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.updated_at)
    }
}

/// Source error types
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// The source database file does not exist
    #[error("note source not found: {0}")]
    NotFound(std::path::PathBuf),
    /// The source database exists but its schema is not one we understand
    #[error("unsupported note source schema: {0}")]
    UnsupportedSchema(String),
    /// Underlying database failure
    #[error("note source database error: {0}")]
    Database(#[from] rusqlite::Error),
}
