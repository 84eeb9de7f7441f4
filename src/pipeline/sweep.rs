// Full sweep: evaluate every dataset expression with every method.
//
// Results are persisted as soon as each pair finishes, and pairs already in
// the store are skipped, so an interrupted sweep resumes where it stopped.
// LDA only runs on the expressions listed in LDA_DATASETS since fitting
// topics on the larger text mixes is slow and rarely competitive.

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::db::queries;
use crate::evaluate::CvParams;
use crate::extract::ExtractedPage;
use crate::featureset::catalog::LDA_DATASETS;
use crate::featureset::FeatureSet;

use super::method::Method;
use super::{evaluate_one, save_outcome, score_name};

/// Run-state key holding the timestamp of the last finished sweep.
pub const LAST_SWEEP_KEY: &str = "last_sweep_at";

/// What a sweep did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepSummary {
    pub evaluated: usize,
    /// Already stored from an earlier run
    pub skipped: usize,
    /// LDA pairs outside LDA_DATASETS
    pub ineligible: usize,
    pub failed: usize,
}

/// Whether `method` should run on `featureset`.
pub fn is_eligible(method: Method, featureset: &FeatureSet) -> bool {
    if !method.is_topic_model() {
        return true;
    }
    let canonical = featureset.to_string();
    LDA_DATASETS
        .iter()
        .filter_map(|expr| FeatureSet::parse(expr).ok())
        .any(|lda_set| lda_set.to_string() == canonical)
}

/// Evaluate every dataset × method pair not yet in the store.
pub fn run(
    conn: &Connection,
    pages: &[ExtractedPage],
    labels: &[f64],
    datasets: &[FeatureSet],
    methods: &[Method],
    params: &CvParams,
) -> Result<SweepSummary> {
    let mut summary = SweepSummary::default();

    // Work out the pending pairs up front so the bar length is honest
    let mut pending = Vec::new();
    for featureset in datasets {
        for &method in methods {
            if !is_eligible(method, featureset) {
                summary.ineligible += 1;
                continue;
            }
            let name = score_name(method, featureset);
            if queries::score_exists(conn, &name)? {
                summary.skipped += 1;
                continue;
            }
            pending.push((method, featureset));
        }
    }

    info!(
        pending = pending.len(),
        skipped = summary.skipped,
        ineligible = summary.ineligible,
        "Starting sweep"
    );

    if pending.is_empty() {
        return Ok(summary);
    }

    let pb = ProgressBar::new(pending.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  Sweep [{bar:30}] {pos}/{len} ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    for (method, featureset) in pending {
        let name = score_name(method, featureset);
        pb.set_message(name.clone());

        match evaluate_one(pages, labels, featureset, method, params) {
            Ok((features, outcome)) => {
                save_outcome(conn, method, featureset, &features, &outcome)?;
                info!(
                    name = %name,
                    auc = format!("{:.4}", outcome.auc),
                    fold_std = format!("{:.4}", outcome.fold_std),
                    "Scored"
                );
                summary.evaluated += 1;
            }
            Err(e) => {
                warn!(name = %name, error = %e, "Evaluation failed, skipping");
                summary.failed += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    queries::set_run_state(conn, LAST_SWEEP_KEY, &chrono::Utc::now().to_rfc3339())?;

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lda_only_runs_on_listed_datasets() {
        let listed = FeatureSet::parse(LDA_DATASETS[0]).unwrap();
        let unlisted = FeatureSet::parse("h3 * 7 + img").unwrap();

        assert!(is_eligible(Method::Lda(100), &listed));
        assert!(!is_eligible(Method::Lda(100), &unlisted));
        assert!(is_eligible(Method::TfIdf, &unlisted));
    }

    #[test]
    fn eligibility_ignores_spacing() {
        let respaced = LDA_DATASETS[0].replace(' ', "");
        let listed = FeatureSet::parse(&respaced).unwrap();
        assert!(is_eligible(Method::Lda(20), &listed));
    }
}
