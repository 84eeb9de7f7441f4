// Vocabulary fitting and sparse document-term matrices.
//
// Matrices are CSR (`sprs::CsMat`), one row per document, one column per
// vocabulary term. Rows are built directly from per-document term maps.

use std::collections::HashMap;

use sprs::CsMat;

use crate::featureset::TermCounts;

/// Term → column mapping with document frequencies.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    index: HashMap<String, usize>,
    terms: Vec<String>,
    doc_freq: Vec<usize>,
}

impl Vocabulary {
    /// Build the vocabulary from per-document term maps.
    ///
    /// Terms in fewer than `min_df` documents are dropped. With
    /// `max_features`, only the most frequent terms (by document frequency)
    /// are kept. Columns are in alphabetical order so the same corpus always
    /// yields the same matrix.
    pub fn fit(docs: &[TermCounts], min_df: usize, max_features: Option<usize>) -> Self {
        let mut df: HashMap<&str, usize> = HashMap::new();
        for doc in docs {
            for (term, &weight) in doc {
                if weight > 0.0 {
                    *df.entry(term.as_str()).or_insert(0) += 1;
                }
            }
        }

        let mut kept: Vec<(&str, usize)> = df.into_iter().filter(|&(_, n)| n >= min_df).collect();

        if let Some(max) = max_features {
            // Highest document frequency first, ties broken alphabetically
            kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
            kept.truncate(max);
        }
        kept.sort_by(|a, b| a.0.cmp(b.0));

        let mut vocab = Self::default();
        for (i, (term, n)) in kept.into_iter().enumerate() {
            vocab.index.insert(term.to_string(), i);
            vocab.terms.push(term.to_string());
            vocab.doc_freq.push(n);
        }
        vocab
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn get(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn doc_freq(&self) -> &[usize] {
        &self.doc_freq
    }
}

/// Assemble a CSR matrix from per-row `(column, value)` lists.
///
/// Columns within a row may come in any order; zeros are skipped.
pub fn csr_from_rows(ncols: usize, rows: Vec<Vec<(usize, f64)>>) -> CsMat<f64> {
    let mut indptr = Vec::with_capacity(rows.len() + 1);
    let mut indices = Vec::new();
    let mut data = Vec::new();
    indptr.push(0);

    let nrows = rows.len();
    for mut row in rows {
        row.sort_by_key(|&(col, _)| col);
        for (col, value) in row {
            debug_assert!(col < ncols);
            if value != 0.0 {
                indices.push(col);
                data.push(value);
            }
        }
        indptr.push(indices.len());
    }

    CsMat::new((nrows, ncols), indptr, indices, data)
}

/// Document-term matrix of (possibly weighted) counts. Terms outside the
/// vocabulary are ignored.
pub fn count_matrix(docs: &[TermCounts], vocab: &Vocabulary) -> CsMat<f64> {
    let rows = docs
        .iter()
        .map(|doc| {
            doc.iter()
                .filter_map(|(term, &count)| vocab.get(term).map(|col| (col, count)))
                .collect()
        })
        .collect();
    csr_from_rows(vocab.len(), rows)
}

/// TF-IDF weighting options.
#[derive(Debug, Clone, Copy)]
pub struct TfIdfOptions {
    /// Replace tf with 1 + ln(tf) for tf >= 1
    pub sublinear_tf: bool,
    /// L2-normalize each row
    pub normalize: bool,
}

impl Default for TfIdfOptions {
    fn default() -> Self {
        Self {
            sublinear_tf: false,
            normalize: true,
        }
    }
}

/// Smoothed inverse document frequency: ln((1 + n) / (1 + df)) + 1.
pub fn smooth_idf(n_docs: usize, df: usize) -> f64 {
    ((1.0 + n_docs as f64) / (1.0 + df as f64)).ln() + 1.0
}

/// Reweight a count matrix by TF-IDF. Document frequencies come from the
/// matrix itself.
pub fn tf_idf(counts: &CsMat<f64>, options: TfIdfOptions) -> CsMat<f64> {
    let n_docs = counts.rows();
    let mut df = vec![0usize; counts.cols()];
    for row in counts.outer_iterator() {
        for (col, &value) in row.iter() {
            if value > 0.0 {
                df[col] += 1;
            }
        }
    }
    let idf: Vec<f64> = df.iter().map(|&d| smooth_idf(n_docs, d)).collect();

    let rows = counts
        .outer_iterator()
        .map(|row| {
            let mut weighted: Vec<(usize, f64)> = row
                .iter()
                .map(|(col, &tf)| {
                    // Weighted counts below 1 stay linear so the log never
                    // turns a present term negative.
                    let tf = if options.sublinear_tf && tf >= 1.0 {
                        1.0 + tf.ln()
                    } else {
                        tf
                    };
                    (col, tf * idf[col])
                })
                .collect();

            if options.normalize {
                let norm = weighted.iter().map(|(_, v)| v * v).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, v) in &mut weighted {
                        *v /= norm;
                    }
                }
            }
            weighted
        })
        .collect();

    csr_from_rows(counts.cols(), rows)
}
