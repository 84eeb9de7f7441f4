// Evaluation pipeline: feature matrices, single evaluations, the full sweep
// and blending.
//
// A score is identified by `"{method}:{dataset}"` where the dataset is the
// canonical form of its feature-set expression.

pub mod blend;
pub mod method;
pub mod sweep;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::db::models::ScoreRecord;
use crate::db::queries;
use crate::evaluate::{cross_validate, CvOutcome, CvParams};
use crate::extract::ExtractedPage;
use crate::featureset::FeatureSet;
use crate::model::FeatureMatrix;
use crate::reduce::lda::{Lda, LdaConfig};
use crate::reduce::svd::{truncated_svd, DEFAULT_POWER_ITERATIONS};
use crate::text::build_features;
use method::Method;

/// Key under which a method/dataset result is stored.
pub fn score_name(method: Method, featureset: &FeatureSet) -> String {
    format!("{method}:{featureset}")
}

/// Split a score name back into its method and dataset parts.
pub fn parse_score_name(name: &str) -> Result<(Method, FeatureSet)> {
    let (method, dataset) = name
        .split_once(':')
        .with_context(|| format!("Score name {name:?} is not of the form method:dataset"))?;
    let method: Method = method.parse()?;
    let featureset = FeatureSet::parse(dataset)
        .with_context(|| format!("Invalid dataset expression in {name:?}"))?;
    Ok((method, featureset))
}

/// Build the classifier input for every page (train rows, then test rows).
pub fn build_matrix(
    pages: &[ExtractedPage],
    featureset: &FeatureSet,
    method: Method,
    seed: u64,
) -> Result<FeatureMatrix> {
    let text = build_features(pages, featureset, &method.text_options())?;

    let matrix = match method {
        Method::Raw | Method::TfIdf | Method::NoStem => FeatureMatrix::Sparse(text.matrix),
        Method::Svd(k) => {
            let svd = truncated_svd(&text.matrix, k, DEFAULT_POWER_ITERATIONS, seed)?;
            let captured: f64 = svd.explained_ratio().iter().take(5).sum();
            info!(
                components = svd.singular_values.len(),
                top5_share = format!("{captured:.3}"),
                "Reduced with truncated SVD"
            );
            FeatureMatrix::Dense(svd.embedding)
        }
        Method::Lda(k) => {
            let lda = Lda::fit(&text.matrix, LdaConfig::new(k).seed(seed))?;
            for topic in 0..k.min(3) {
                let words: Vec<&str> = lda
                    .top_words(topic, 8)
                    .into_iter()
                    .map(|w| text.vocabulary.terms()[w].as_str())
                    .collect();
                debug!(topic, words = %words.join(" "), "Topic sample");
            }
            FeatureMatrix::Dense(lda.into_doc_topic())
        }
    };

    Ok(matrix)
}

/// Build features for one method/dataset pair and cross-validate them.
pub fn evaluate_one(
    pages: &[ExtractedPage],
    labels: &[f64],
    featureset: &FeatureSet,
    method: Method,
    params: &CvParams,
) -> Result<(FeatureMatrix, CvOutcome)> {
    let features = build_matrix(pages, featureset, method, params.seed)?;
    let outcome = cross_validate(&features, labels, params)?;
    Ok((features, outcome))
}

/// Persist an evaluation under its score name.
pub fn save_outcome(
    conn: &Connection,
    method: Method,
    featureset: &FeatureSet,
    features: &FeatureMatrix,
    outcome: &CvOutcome,
) -> Result<ScoreRecord> {
    let record = ScoreRecord {
        name: score_name(method, featureset),
        method: method.to_string(),
        dataset: featureset.to_string(),
        auc: outcome.auc,
        fold_mean: outcome.fold_mean,
        fold_std: outcome.fold_std,
        n_folds: outcome.fold_aucs.len() as u32,
        n_features: features.ncols() as u32,
        oof_predictions: outcome.oof.clone(),
        test_predictions: outcome.test_predictions.clone(),
        created_at: String::new(),
    };
    queries::upsert_score(conn, &record)?;
    Ok(record)
}
