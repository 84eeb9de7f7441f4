// File exports: the CSV score report and Kaggle-style submissions.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::db::models::ScoreRecord;

#[derive(Serialize)]
struct ReportRow<'a> {
    rank: usize,
    name: &'a str,
    method: &'a str,
    dataset: &'a str,
    auc: f64,
    fold_mean: f64,
    fold_std: f64,
    n_folds: u32,
    n_features: u32,
    created_at: &'a str,
}

#[derive(Serialize)]
struct SubmissionRow {
    urlid: u64,
    label: f64,
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Write the ranked scores as CSV, best first.
pub fn write_score_report(path: &Path, scores: &[ScoreRecord]) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create report at {}", path.display()))?;

    for (i, score) in scores.iter().enumerate() {
        writer.serialize(ReportRow {
            rank: i + 1,
            name: &score.name,
            method: &score.method,
            dataset: &score.dataset,
            auc: score.auc,
            fold_mean: score.fold_mean,
            fold_std: score.fold_std,
            n_folds: score.n_folds,
            n_features: score.n_features,
            created_at: &score.created_at,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Write `urlid,label` rows, one per test page.
pub fn write_submission(path: &Path, urlids: &[u64], predictions: &[f64]) -> Result<()> {
    if urlids.len() != predictions.len() {
        anyhow::bail!(
            "{} test pages but {} predictions",
            urlids.len(),
            predictions.len()
        );
    }

    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create submission at {}", path.display()))?;

    for (&urlid, &label) in urlids.iter().zip(predictions) {
        writer.serialize(SubmissionRow { urlid, label })?;
    }
    writer.flush()?;
    Ok(())
}
