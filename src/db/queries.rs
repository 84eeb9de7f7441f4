// Database queries - CRUD operations for all tables.
//
// Every database interaction goes through this module. This keeps SQL
// contained in one place and gives the rest of the app clean Rust interfaces.

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::models::ScoreRecord;

// --- Run state ---

/// Get a run state value by key (e.g., "last_sweep_at").
pub fn get_run_state(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut stmt = conn.prepare("SELECT value FROM run_state WHERE key = ?1")?;
    let result = stmt.query_row(params![key], |row| row.get(0)).optional()?;
    Ok(result)
}

/// Set a run state value (upsert).
pub fn set_run_state(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO run_state (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
        params![key, value],
    )?;
    Ok(())
}

// --- Scores ---

/// Insert or replace a score. Re-evaluating a pair overwrites the old row.
pub fn upsert_score(conn: &Connection, score: &ScoreRecord) -> Result<()> {
    let oof_json = serde_json::to_string(&score.oof_predictions)?;
    let test_json = serde_json::to_string(&score.test_predictions)?;

    conn.execute(
        "INSERT INTO scores
            (name, method, dataset, auc, fold_mean, fold_std, n_folds, n_features,
             oof_predictions, test_predictions, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, datetime('now'))
         ON CONFLICT(name) DO UPDATE SET
            method = ?2,
            dataset = ?3,
            auc = ?4,
            fold_mean = ?5,
            fold_std = ?6,
            n_folds = ?7,
            n_features = ?8,
            oof_predictions = ?9,
            test_predictions = ?10,
            created_at = datetime('now')",
        params![
            score.name,
            score.method,
            score.dataset,
            score.auc,
            score.fold_mean,
            score.fold_std,
            score.n_folds,
            score.n_features,
            oof_json,
            test_json,
        ],
    )?;
    Ok(())
}

/// Whether a score with this name has already been stored.
pub fn score_exists(conn: &Connection, name: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM scores WHERE name = ?1",
        params![name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Load one score, predictions included.
pub fn get_score(conn: &Connection, name: &str) -> Result<Option<ScoreRecord>> {
    let mut stmt = conn.prepare(
        "SELECT name, method, dataset, auc, fold_mean, fold_std, n_folds, n_features,
                oof_predictions, test_predictions, created_at
         FROM scores WHERE name = ?1",
    )?;
    let raw = stmt
        .query_row(params![name], read_row_with_predictions)
        .optional()?;

    raw.map(|(record, oof_json, test_json)| attach_predictions(record, &oof_json, &test_json))
        .transpose()
}

/// Scores ordered best first. Predictions are left empty to keep this cheap.
pub fn get_ranked_scores(conn: &Connection, limit: Option<u32>) -> Result<Vec<ScoreRecord>> {
    let mut stmt = conn.prepare(
        "SELECT name, method, dataset, auc, fold_mean, fold_std, n_folds, n_features, created_at
         FROM scores
         ORDER BY auc DESC, name ASC
         LIMIT ?1",
    )?;

    // SQLite treats a negative LIMIT as "no limit"
    let limit = limit.map(i64::from).unwrap_or(-1);

    let rows = stmt.query_map(params![limit], |row| {
        Ok(ScoreRecord {
            name: row.get(0)?,
            method: row.get(1)?,
            dataset: row.get(2)?,
            auc: row.get(3)?,
            fold_mean: row.get(4)?,
            fold_std: row.get(5)?,
            n_folds: row.get(6)?,
            n_features: row.get(7)?,
            oof_predictions: Vec::new(),
            test_predictions: Vec::new(),
            created_at: row.get(8)?,
        })
    })?;

    let mut scores = Vec::new();
    for row in rows {
        scores.push(row?);
    }
    Ok(scores)
}

/// Number of stored scores.
pub fn score_count(conn: &Connection) -> Result<i64> {
    let count = conn.query_row("SELECT COUNT(*) FROM scores", [], |row| row.get(0))?;
    Ok(count)
}

fn read_row_with_predictions(row: &Row<'_>) -> rusqlite::Result<(ScoreRecord, String, String)> {
    let record = ScoreRecord {
        name: row.get(0)?,
        method: row.get(1)?,
        dataset: row.get(2)?,
        auc: row.get(3)?,
        fold_mean: row.get(4)?,
        fold_std: row.get(5)?,
        n_folds: row.get(6)?,
        n_features: row.get(7)?,
        oof_predictions: Vec::new(),
        test_predictions: Vec::new(),
        created_at: row.get(10)?,
    };
    Ok((record, row.get(8)?, row.get(9)?))
}

fn attach_predictions(
    mut record: ScoreRecord,
    oof_json: &str,
    test_json: &str,
) -> Result<ScoreRecord> {
    record.oof_predictions = serde_json::from_str(oof_json)
        .with_context(|| format!("Corrupt out-of-fold predictions for {}", record.name))?;
    record.test_predictions = serde_json::from_str(test_json)
        .with_context(|| format!("Corrupt test predictions for {}", record.name))?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema;

    fn memory_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        schema::create_tables(&conn).unwrap();
        conn
    }

    fn record(name: &str, auc: f64) -> ScoreRecord {
        ScoreRecord {
            name: name.to_string(),
            method: "tfidf".to_string(),
            dataset: "title".to_string(),
            auc,
            fold_mean: auc,
            fold_std: 0.01,
            n_folds: 10,
            n_features: 42,
            oof_predictions: vec![0.1, 0.9],
            test_predictions: vec![0.5],
            created_at: String::new(),
        }
    }

    #[test]
    fn upsert_then_get_roundtrips_predictions() {
        let conn = memory_db();
        upsert_score(&conn, &record("tfidf:title", 0.8)).unwrap();

        let loaded = get_score(&conn, "tfidf:title").unwrap().unwrap();
        assert_eq!(loaded.oof_predictions, vec![0.1, 0.9]);
        assert_eq!(loaded.test_predictions, vec![0.5]);
        assert!(!loaded.created_at.is_empty());
        assert!(score_exists(&conn, "tfidf:title").unwrap());
        assert!(!score_exists(&conn, "raw:title").unwrap());
    }

    #[test]
    fn upsert_overwrites_existing_name() {
        let conn = memory_db();
        upsert_score(&conn, &record("tfidf:title", 0.8)).unwrap();
        upsert_score(&conn, &record("tfidf:title", 0.85)).unwrap();

        assert_eq!(score_count(&conn).unwrap(), 1);
        let loaded = get_score(&conn, "tfidf:title").unwrap().unwrap();
        assert!((loaded.auc - 0.85).abs() < 1e-12);
    }

    #[test]
    fn ranked_scores_are_best_first_and_limited() {
        let conn = memory_db();
        upsert_score(&conn, &record("a", 0.7)).unwrap();
        upsert_score(&conn, &record("b", 0.9)).unwrap();
        upsert_score(&conn, &record("c", 0.8)).unwrap();

        let all = get_ranked_scores(&conn, None).unwrap();
        let names: Vec<_> = all.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["b", "c", "a"]);

        let top = get_ranked_scores(&conn, Some(1)).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "b");
    }

    #[test]
    fn missing_score_is_none() {
        let conn = memory_db();
        assert!(get_score(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn run_state_upserts() {
        let conn = memory_db();
        assert!(get_run_state(&conn, "last_sweep_at").unwrap().is_none());
        set_run_state(&conn, "last_sweep_at", "one").unwrap();
        set_run_state(&conn, "last_sweep_at", "two").unwrap();
        assert_eq!(
            get_run_state(&conn, "last_sweep_at").unwrap().as_deref(),
            Some("two")
        );
    }
}
