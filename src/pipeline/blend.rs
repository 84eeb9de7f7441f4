// Stacking: combine stored scores into one submission.
//
// Each stored score contributes one column: its out-of-fold predictions for
// the training rows and its final-model predictions for the test rows. A
// logistic regression over those columns is cross-validated for an honest
// blended AUC, and its final fit predicts the test rows.

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::info;

use crate::db::models::ScoreRecord;
use crate::db::queries;
use crate::evaluate::metrics::min_max_normalize;
use crate::evaluate::{cross_validate, CvParams};
use crate::model::FeatureMatrix;

/// Result of blending.
#[derive(Debug, Clone)]
pub struct BlendOutcome {
    /// Cross-validated AUC of the meta-model
    pub auc: f64,
    /// Test predictions rescaled to [0, 1]
    pub predictions: Vec<f64>,
}

/// Load the named scores, predictions included.
pub fn load_components(conn: &Connection, names: &[String]) -> Result<Vec<ScoreRecord>> {
    if names.is_empty() {
        anyhow::bail!("Nothing to blend: no score names given");
    }
    names
        .iter()
        .map(|name| {
            queries::get_score(conn, name)?
                .with_context(|| format!("No stored score named {name:?}. Run `evergreen report` to list them."))
        })
        .collect()
}

/// Fit a meta-model over the components' predictions.
pub fn blend(components: &[ScoreRecord], labels: &[f64], params: &CvParams) -> Result<BlendOutcome> {
    let first = components.first().context("Nothing to blend")?;
    let n_test = first.test_predictions.len();

    for component in components {
        if component.oof_predictions.len() != labels.len() {
            anyhow::bail!(
                "{} has {} out-of-fold predictions but there are {} training labels",
                component.name,
                component.oof_predictions.len(),
                labels.len()
            );
        }
        if component.test_predictions.len() != n_test {
            anyhow::bail!(
                "{} has {} test predictions, expected {}",
                component.name,
                component.test_predictions.len(),
                n_test
            );
        }
    }

    // One column per component, training rows then test rows
    let columns: Vec<Vec<f64>> = components
        .iter()
        .map(|c| {
            c.oof_predictions
                .iter()
                .chain(c.test_predictions.iter())
                .copied()
                .collect()
        })
        .collect();
    let features = FeatureMatrix::from_columns(&columns);

    let outcome = cross_validate(&features, labels, params)?;
    info!(
        components = components.len(),
        auc = format!("{:.4}", outcome.auc),
        "Blended"
    );

    Ok(BlendOutcome {
        auc: outcome.auc,
        predictions: min_max_normalize(&outcome.test_predictions),
    })
}
