// Text features: from extracted pages to a document-term matrix.
//
// Each referenced field is tokenized on its own, the feature-set expression
// combines the per-field counts into one bag of words per page, and the
// combined bags are vectorized (raw counts or TF-IDF).

pub mod tokenizer;
pub mod vectorizer;

use std::collections::BTreeMap;

use anyhow::Result;
use rayon::prelude::*;
use sprs::CsMat;
use tracing::debug;

use crate::extract::ExtractedPage;
use crate::featureset::{FeatureSet, TermCounts};
use tokenizer::Tokenizer;
use vectorizer::{count_matrix, tf_idf, TfIdfOptions, Vocabulary};

/// How combined counts become matrix entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Weighting {
    /// Combined (weighted) counts as-is
    Counts,
    /// Smoothed TF-IDF with L2-normalized rows
    TfIdf,
}

/// Text preprocessing for one feature matrix.
#[derive(Debug, Clone, Copy)]
pub struct TextOptions {
    pub stem: bool,
    /// Longest word n-gram counted as a term
    pub ngram_max: usize,
    pub weighting: Weighting,
    pub min_df: usize,
    pub max_features: Option<usize>,
    pub sublinear_tf: bool,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            stem: true,
            ngram_max: 1,
            weighting: Weighting::TfIdf,
            min_df: 1,
            max_features: None,
            sublinear_tf: false,
        }
    }
}

/// A document-term matrix and the vocabulary naming its columns.
pub struct TextFeatures {
    pub matrix: CsMat<f64>,
    pub vocabulary: Vocabulary,
}

/// Per-page combined term counts for a feature set.
pub fn combined_counts(
    pages: &[ExtractedPage],
    featureset: &FeatureSet,
    options: &TextOptions,
) -> Vec<TermCounts> {
    let tokenizer = Tokenizer::new(options.stem).ngrams(options.ngram_max);
    let fields = featureset.fields();

    pages
        .par_iter()
        .map(|page| {
            let per_field: BTreeMap<String, TermCounts> = fields
                .iter()
                .map(|field| (field.clone(), tokenizer.count(&page.field_text(field))))
                .collect();
            featureset.combine(&per_field)
        })
        .collect()
}

/// Build the document-term matrix for a feature set over all pages.
pub fn build_features(
    pages: &[ExtractedPage],
    featureset: &FeatureSet,
    options: &TextOptions,
) -> Result<TextFeatures> {
    let docs = combined_counts(pages, featureset, options);
    let vocabulary = Vocabulary::fit(&docs, options.min_df, options.max_features);

    if vocabulary.is_empty() {
        anyhow::bail!("Feature set `{featureset}` produced no terms across {} pages", pages.len());
    }

    let counts = count_matrix(&docs, &vocabulary);
    let matrix = match options.weighting {
        Weighting::Counts => counts,
        Weighting::TfIdf => tf_idf(
            &counts,
            TfIdfOptions {
                sublinear_tf: options.sublinear_tf,
                normalize: true,
            },
        ),
    };

    debug!(
        featureset = %featureset,
        docs = matrix.rows(),
        terms = vocabulary.len(),
        nnz = matrix.nnz(),
        "Built document-term matrix"
    );

    Ok(TextFeatures { matrix, vocabulary })
}
