// Database layer - SQLite storage for evaluation scores and run state.
//
// We use rusqlite with the "bundled" feature so there's no system SQLite
// dependency. The database file lives wherever EVERGREEN_DB_PATH points
// (defaults to <data>/processed/evergreen.db).

pub mod models;
pub mod queries;
pub mod schema;

use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;

/// Open (or create) the database and run migrations.
///
/// This is the main entry point: called by `evergreen init` and by any
/// command that writes scores.
pub fn initialize(db_path: &Path) -> Result<Connection> {
    // Create parent directories if needed
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create directory for database: {}", db_path.display())
            })?;
        }
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;

    schema::create_tables(&conn)?;

    Ok(conn)
}

/// Open an existing database (fails if it doesn't exist yet).
pub fn open(db_path: &Path) -> Result<Connection> {
    if !db_path.exists() {
        anyhow::bail!(
            "Database not found at {}. Run `evergreen init` first.",
            db_path.display()
        );
    }

    let conn = Connection::open(db_path)
        .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

    conn.pragma_update(None, "journal_mode", "WAL")?;

    Ok(conn)
}
