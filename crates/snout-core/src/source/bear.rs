//! Bear note source.
//!
//! Bear stores notes in a Core Data SQLite database; the `ZSFNOTE` table is
//! the note entity. The database is opened strictly read-only. Modification
//! dates have shipped in two units across Bear versions: Core Data seconds
//! (since 2001-01-01 UTC) and epoch milliseconds; the reader sniffs a sample
//! value and normalizes everything to epoch milliseconds.

use std::collections::HashSet;
use std::path::Path;

use rusqlite::{Connection, OpenFlags, OptionalExtension};

use super::{Note, SourceError};

/// 2001-01-01T00:00:00Z as epoch milliseconds, the Core Data reference date
const CORE_DATA_EPOCH_MS: i64 = 978_307_200_000;

/// Values in this range are taken to be Core Data seconds rather than epoch
/// milliseconds
fn is_likely_core_data_seconds(value: f64) -> bool {
    value > 1e7 && value < 1e10
}

/// Normalize a raw `ZMODIFICATIONDATE` value to epoch milliseconds
fn normalize_timestamp(value: Option<f64>) -> i64 {
    let Some(value) = value else {
        return 0;
    };
    if !value.is_finite() {
        return 0;
    }
    if value > 1e12 {
        return value as i64;
    }
    if is_likely_core_data_seconds(value) {
        return CORE_DATA_EPOCH_MS + (value * 1000.0) as i64;
    }
    value as i64
}

/// Convert an epoch-milliseconds lower bound into the source's own unit
fn to_source_timestamp(since_ms: i64, uses_core_data_seconds: bool) -> f64 {
    if !uses_core_data_seconds {
        return since_ms as f64;
    }
    (((since_ms - CORE_DATA_EPOCH_MS) as f64) / 1000.0).max(0.0)
}

/// Read notes from a Bear database, newest state of each note, trashed notes
/// excluded. `since` filters on modification time, epoch milliseconds.
pub fn read_notes(db_path: &Path, since: Option<i64>) -> Result<Vec<Note>, SourceError> {
    if !db_path.exists() {
        return Err(SourceError::NotFound(db_path.to_path_buf()));
    }

    let conn = Connection::open_with_flags(
        db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;

    let has_note_table: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'ZSFNOTE'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    if has_note_table.is_none() {
        return Err(SourceError::UnsupportedSchema(
            "table ZSFNOTE not found".to_string(),
        ));
    }

    let columns = table_columns(&conn, "ZSFNOTE")?;
    let has_trash = columns.contains("ZTRASHED");
    let has_modified = columns.contains("ZMODIFICATIONDATE");

    let uses_core_data_seconds = has_modified && sample_is_core_data_seconds(&conn)?;

    let mut clauses: Vec<&str> = Vec::new();
    let mut params: Vec<f64> = Vec::new();
    if has_trash {
        clauses.push("ZTRASHED = 0");
    }
    if has_modified {
        if let Some(since_ms) = since {
            clauses.push("ZMODIFICATIONDATE >= ?");
            params.push(to_source_timestamp(since_ms, uses_core_data_seconds));
        }
    }

    let where_clause = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };
    let sql = format!(
        "SELECT ZUNIQUEIDENTIFIER, ZTITLE, ZTEXT, ZMODIFICATIONDATE FROM ZSFNOTE {where_clause}"
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
        Ok(Note {
            id: row.get::<_, Option<String>>(0)?.unwrap_or_default(),
            title: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            body: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            updated_at: normalize_timestamp(row.get::<_, Option<f64>>(3)?),
        })
    })?;

    let mut notes = Vec::new();
    for row in rows {
        let note = row?;
        if !note.id.is_empty() {
            notes.push(note);
        }
    }
    Ok(notes)
}

fn table_columns(conn: &Connection, table: &str) -> Result<HashSet<String>, SourceError> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<HashSet<_>, _>>()?;
    Ok(names)
}

fn sample_is_core_data_seconds(conn: &Connection) -> Result<bool, SourceError> {
    let sample: Option<f64> = conn
        .query_row(
            "SELECT ZMODIFICATIONDATE FROM ZSFNOTE WHERE ZMODIFICATIONDATE IS NOT NULL LIMIT 1",
            [],
            |row| row.get(0),
        )
        .optional()?;
    Ok(sample.is_some_and(is_likely_core_data_seconds))
}

// ============================================================================
// TESTS
// ============================================================================
