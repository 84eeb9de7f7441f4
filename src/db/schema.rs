// Database schema: table creation and migrations.
//
// A `schema_version` table records which migrations have run; each
// migration is a batch of SQL statements.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// This is idempotent: safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        -- Tracks schema version for future migrations
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- One row per evaluated method/dataset pair
        CREATE TABLE IF NOT EXISTS scores (
            name TEXT PRIMARY KEY,             -- method:dataset
            method TEXT NOT NULL,
            dataset TEXT NOT NULL,             -- canonical feature-set expression
            auc REAL NOT NULL,                 -- pooled out-of-fold ROC-AUC
            fold_mean REAL NOT NULL,
            fold_std REAL NOT NULL,
            n_folds INTEGER NOT NULL,
            n_features INTEGER NOT NULL,
            oof_predictions TEXT NOT NULL,     -- JSON array, training rows
            test_predictions TEXT NOT NULL,    -- JSON array, test rows
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Run state: last sweep timestamps and similar markers
        CREATE TABLE IF NOT EXISTS run_state (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_scores_auc ON scores(auc);
        ",
    )
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (1)",
        [],
    )
    .context("Failed to record schema version")?;

    Ok(())
}

/// Count the number of user-created tables in the database.
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
