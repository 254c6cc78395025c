//! `SQLite` schema definitions for platevote.
//!
//! This module contains the SQL statements for creating and dropping the
//! ledger tables.

use rusqlite::Connection;

use crate::error::Result;

/// Schema version written to `PRAGMA user_version`.
///
/// Images carrying any other version are rejected on restore; there are no
/// migrations.
pub const SCHEMA_VERSION: i32 = 1;

/// SQL statement to create the plates table.
pub const CREATE_PLATES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS plates (
    plate_text TEXT PRIMARY KEY,
    score INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT
)
";

/// SQL statement to create the votes table.
pub const CREATE_VOTES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS votes (
    id TEXT PRIMARY KEY,
    plate_text TEXT NOT NULL,
    value INTEGER NOT NULL CHECK (value IN (-1, 1)),
    created_at TEXT NOT NULL
)
";

/// SQL statement to create an index on `plate_text` for per-plate lookups.
pub const CREATE_VOTES_PLATE_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_votes_plate ON votes(plate_text)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_PLATES_TABLE,
    CREATE_VOTES_TABLE,
    CREATE_VOTES_PLATE_INDEX,
];

/// Drop statements used by reset. Dropping `votes` also drops its index.
pub const DROP_STATEMENTS: &[&str] = &["DROP TABLE IF EXISTS votes", "DROP TABLE IF EXISTS plates"];

/// Tables every valid image must contain.
pub const REQUIRED_TABLES: &[&str] = &["plates", "votes"];

/// Create all tables and indexes and stamp the schema version.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub fn create(conn: &Connection) -> Result<()> {
    for statement in SCHEMA_STATEMENTS {
        conn.execute(statement, [])?;
    }
    conn.execute_batch(&format!("PRAGMA user_version = {SCHEMA_VERSION}"))?;
    Ok(())
}

/// Drop both tables.
///
/// # Errors
///
/// Returns an error if any statement fails.
pub fn drop_all(conn: &Connection) -> Result<()> {
    for statement in DROP_STATEMENTS {
        conn.execute(statement, [])?;
    }
    Ok(())
}

/// Read the schema version stamped on the database.
///
/// # Errors
///
/// Returns an error if the pragma cannot be read.
pub fn version(conn: &Connection) -> Result<i32> {
    let version = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version)
}

/// Count how many of [`REQUIRED_TABLES`] exist.
///
/// # Errors
///
/// Returns an error if `sqlite_master` cannot be queried.
pub fn present_tables(conn: &Connection) -> Result<usize> {
    let mut stmt =
        conn.prepare("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1")?;
    let mut present = 0;
    for table in REQUIRED_TABLES {
        let count: i64 = stmt.query_row([table], |row| row.get(0))?;
        if count > 0 {
            present += 1;
        }
    }
    Ok(present)
}
