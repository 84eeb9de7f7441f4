// Cross-validated evaluation of one feature matrix.
//
// The matrix holds training rows first and test rows after them. Training
// rows are scored out-of-fold; a final model fit on every training row then
// predicts the test rows.

pub mod folds;
pub mod metrics;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::model::logistic::LogisticRegression;
use crate::model::FeatureMatrix;
use folds::{k_fold, stratified_k_fold, Split};
use metrics::{mean_std, roc_auc};

/// How folds are drawn and how the classifier is configured.
#[derive(Debug, Clone)]
pub struct CvParams {
    pub folds: usize,
    /// Shuffle plain k-fold with this seed; contiguous folds when `None`
    pub shuffle_seed: Option<u64>,
    /// Use class-balanced folds (always shuffled, with `seed`)
    pub stratified: bool,
    pub seed: u64,
    /// Inverse regularization strength of the logistic regression
    pub c: f64,
}

impl Default for CvParams {
    fn default() -> Self {
        Self {
            folds: crate::config::DEFAULT_FOLDS,
            shuffle_seed: None,
            stratified: false,
            seed: crate::config::DEFAULT_SEED,
            c: 1.0,
        }
    }
}

impl CvParams {
    fn splits(&self, labels: &[f64]) -> Vec<Split> {
        if self.stratified {
            stratified_k_fold(labels, self.folds, self.seed)
        } else {
            k_fold(labels.len(), self.folds, self.shuffle_seed)
        }
    }
}

/// Result of cross-validating one feature matrix.
#[derive(Debug, Clone)]
pub struct CvOutcome {
    /// Out-of-fold probability for every training row
    pub oof: Vec<f64>,
    /// AUC of each fold that had both classes
    pub fold_aucs: Vec<f64>,
    pub fold_mean: f64,
    pub fold_std: f64,
    /// AUC of the pooled out-of-fold predictions
    pub auc: f64,
    /// Predictions for the test rows from a model fit on all training rows
    pub test_predictions: Vec<f64>,
}

/// Cross-validate a logistic regression on the training block of `features`.
pub fn cross_validate(features: &FeatureMatrix, labels: &[f64], params: &CvParams) -> Result<CvOutcome> {
    let n_train = labels.len();
    if features.nrows() < n_train {
        anyhow::bail!(
            "Feature matrix has {} rows but there are {} training labels",
            features.nrows(),
            n_train
        );
    }
    if n_train < params.folds {
        anyhow::bail!("{n_train} training rows cannot be split into {} folds", params.folds);
    }

    let train_block = features.head(n_train);
    let mut oof = vec![0.0; n_train];
    let mut fold_aucs = Vec::with_capacity(params.folds);

    for (fold, split) in params.splits(labels).iter().enumerate() {
        let x_train = train_block.select_rows(&split.train);
        let y_train: Vec<f64> = split.train.iter().map(|&i| labels[i]).collect();
        let x_test = train_block.select_rows(&split.test);

        let mut model = LogisticRegression::new(params.c);
        model
            .fit(&x_train, &y_train)
            .with_context(|| format!("Fitting fold {fold}"))?;
        let predictions = model.predict_proba(&x_test)?;

        for (&row, &p) in split.test.iter().zip(&predictions) {
            oof[row] = p;
        }

        let y_test: Vec<f64> = split.test.iter().map(|&i| labels[i]).collect();
        match roc_auc(&y_test, &predictions) {
            Some(auc) => {
                debug!(fold, auc, iterations = model.iterations, converged = model.converged, "Fold scored");
                fold_aucs.push(auc);
            }
            None => warn!(fold, "Fold has a single class, AUC skipped"),
        }
    }

    let auc = roc_auc(labels, &oof)
        .context("Training labels contain a single class, AUC is undefined")?;
    let (fold_mean, fold_std) = mean_std(&fold_aucs);

    let mut final_model = LogisticRegression::new(params.c);
    final_model
        .fit(&train_block, labels)
        .context("Fitting the final model on all training rows")?;
    let test_predictions = final_model.predict_proba(&features.tail_from(n_train))?;

    Ok(CvOutcome {
        oof,
        fold_aucs,
        fold_mean,
        fold_std,
        auc,
        test_predictions,
    })
}
