// Latent Dirichlet Allocation by collapsed Gibbs sampling.
//
// Fits topics on a document-term count matrix and returns each document's
// topic proportions, which then stand in for the term features.

use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sprs::CsMat;
use tracing::debug;

use super::ReduceError;

/// LDA hyperparameters.
#[derive(Debug, Clone)]
pub struct LdaConfig {
    pub n_topics: usize,
    /// Document-topic prior; `None` means `1 / n_topics`
    pub alpha: Option<f64>,
    /// Topic-word prior
    pub beta: f64,
    pub n_iterations: usize,
    /// Documents longer than this are scaled down to it (proportionally,
    /// keeping every present term at least once). Feature-set weights can
    /// multiply counts by 10, which would otherwise dominate sampling time.
    pub max_doc_tokens: usize,
    pub seed: u64,
}

impl Default for LdaConfig {
    fn default() -> Self {
        Self {
            n_topics: 100,
            alpha: None,
            beta: 0.01,
            n_iterations: 50,
            max_doc_tokens: 2000,
            seed: crate::config::DEFAULT_SEED,
        }
    }
}

impl LdaConfig {
    pub fn new(n_topics: usize) -> Self {
        Self {
            n_topics,
            ..Default::default()
        }
    }

    pub fn n_iterations(mut self, n: usize) -> Self {
        self.n_iterations = n;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// A fitted topic model.
#[derive(Debug)]
pub struct Lda {
    /// Topic-word counts: n_topics x n_words
    topic_word: Array2<f64>,
    /// Document-topic proportions: n_docs x n_topics
    doc_topic: Array2<f64>,
}

impl Lda {
    /// Fit on a count matrix. Fractional counts are rounded.
    pub fn fit(counts: &CsMat<f64>, config: LdaConfig) -> Result<Self, ReduceError> {
        let (n_docs, n_words) = (counts.rows(), counts.cols());
        if n_docs == 0 || n_words == 0 {
            return Err(ReduceError::EmptyMatrix {
                rows: n_docs,
                cols: n_words,
            });
        }
        if config.n_topics == 0 {
            return Err(ReduceError::InvalidComponents);
        }
        let k = config.n_topics;
        let alpha = config.alpha.unwrap_or(1.0 / k as f64);
        if alpha <= 0.0 {
            return Err(ReduceError::InvalidParameter("alpha must be positive".into()));
        }
        if config.beta <= 0.0 {
            return Err(ReduceError::InvalidParameter("beta must be positive".into()));
        }
        let beta = config.beta;
        let beta_sum = beta * n_words as f64;

        let mut rng = StdRng::seed_from_u64(config.seed);

        // Token list per document: one word index per occurrence
        let docs: Vec<Vec<usize>> = counts
            .outer_iterator()
            .map(|row| {
                let entries: Vec<(usize, f64)> = row.iter().map(|(w, &c)| (w, c)).collect();
                expand_tokens(&entries, config.max_doc_tokens)
            })
            .collect();

        let mut topic_word = Array2::<f64>::zeros((k, n_words));
        let mut doc_topic_counts = Array2::<f64>::zeros((n_docs, k));
        let mut topic_totals = Array1::<f64>::zeros(k);

        let mut assignments: Vec<Vec<usize>> = docs
            .iter()
            .enumerate()
            .map(|(d, tokens)| {
                tokens
                    .iter()
                    .map(|&w| {
                        let z = rng.gen_range(0..k);
                        topic_word[[z, w]] += 1.0;
                        doc_topic_counts[[d, z]] += 1.0;
                        topic_totals[z] += 1.0;
                        z
                    })
                    .collect()
            })
            .collect();

        let mut probs = vec![0.0; k];
        for iter in 0..config.n_iterations {
            for (d, tokens) in docs.iter().enumerate() {
                for (pos, &w) in tokens.iter().enumerate() {
                    let old = assignments[d][pos];
                    topic_word[[old, w]] -= 1.0;
                    doc_topic_counts[[d, old]] -= 1.0;
                    topic_totals[old] -= 1.0;

                    // P(z | rest) ∝ (n_dz + alpha) * (n_zw + beta) / (n_z + V * beta)
                    let mut total = 0.0;
                    for (z, p) in probs.iter_mut().enumerate() {
                        *p = (doc_topic_counts[[d, z]] + alpha) * (topic_word[[z, w]] + beta)
                            / (topic_totals[z] + beta_sum);
                        total += *p;
                    }

                    let mut threshold = rng.gen::<f64>() * total;
                    let mut new = k - 1;
                    for (z, &p) in probs.iter().enumerate() {
                        threshold -= p;
                        if threshold <= 0.0 {
                            new = z;
                            break;
                        }
                    }

                    topic_word[[new, w]] += 1.0;
                    doc_topic_counts[[d, new]] += 1.0;
                    topic_totals[new] += 1.0;
                    assignments[d][pos] = new;
                }
            }
            debug!(iteration = iter + 1, "LDA sweep done");
        }

        // Smoothed proportions; empty documents get the uniform prior
        let mut doc_topic = Array2::<f64>::zeros((n_docs, k));
        for d in 0..n_docs {
            let len = docs[d].len() as f64;
            for z in 0..k {
                doc_topic[[d, z]] = (doc_topic_counts[[d, z]] + alpha) / (len + k as f64 * alpha);
            }
        }

        Ok(Self {
            topic_word,
            doc_topic,
        })
    }

    /// Topic proportions per document; rows sum to 1.
    pub fn doc_topic(&self) -> &Array2<f64> {
        &self.doc_topic
    }

    pub fn into_doc_topic(self) -> Array2<f64> {
        self.doc_topic
    }

    /// Indices of the `n` heaviest words of a topic.
    pub fn top_words(&self, topic: usize, n: usize) -> Vec<usize> {
        let row = self.topic_word.row(topic);
        let mut idx: Vec<usize> = (0..row.len()).collect();
        idx.sort_by(|&a, &b| row[b].total_cmp(&row[a]));
        idx.truncate(n);
        idx
    }
}

/// Round weighted counts to token occurrences, scaling long documents down
/// to `max_tokens`.
fn expand_tokens(entries: &[(usize, f64)], max_tokens: usize) -> Vec<usize> {
    let total: f64 = entries.iter().map(|&(_, c)| c.max(0.0)).sum();
    let scale = if max_tokens > 0 && total > max_tokens as f64 {
        max_tokens as f64 / total
    } else {
        1.0
    };

    let mut tokens = Vec::new();
    for &(word, count) in entries {
        if count <= 0.0 {
            continue;
        }
        let n = ((count * scale).round() as usize).max(1);
        tokens.extend(std::iter::repeat(word).take(n));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::vectorizer::csr_from_rows;

    fn two_topic_corpus() -> CsMat<f64> {
        // Words 0-1 only co-occur with each other, as do words 2-3
        let mut rows = Vec::new();
        for _ in 0..10 {
            rows.push(vec![(0, 5.0), (1, 5.0)]);
            rows.push(vec![(2, 5.0), (3, 5.0)]);
        }
        csr_from_rows(4, rows)
    }

    #[test]
    fn proportions_sum_to_one() {
        let lda = Lda::fit(&two_topic_corpus(), LdaConfig::new(2).n_iterations(20).seed(3)).unwrap();
        for row in lda.doc_topic().rows() {
            assert!((row.sum() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn separates_disjoint_vocabularies() {
        let lda = Lda::fit(&two_topic_corpus(), LdaConfig::new(2).n_iterations(50).seed(11)).unwrap();
        let theta = lda.doc_topic();
        // Documents 0 and 1 use disjoint words, so they should favour
        // different topics
        let dominant = |d: usize| if theta[[d, 0]] > theta[[d, 1]] { 0 } else { 1 };
        assert_ne!(dominant(0), dominant(1));
        assert_eq!(dominant(0), dominant(2));
    }

    #[test]
    fn long_documents_are_scaled_down() {
        let tokens = expand_tokens(&[(0, 300.0), (1, 100.0), (2, 0.2)], 40);
        assert_eq!(tokens.iter().filter(|&&w| w == 0).count(), 30);
        assert_eq!(tokens.iter().filter(|&&w| w == 1).count(), 10);
        // Rare terms keep one occurrence
        assert_eq!(tokens.iter().filter(|&&w| w == 2).count(), 1);
    }

    #[test]
    fn rejects_empty_matrix() {
        let empty = csr_from_rows(0, vec![]);
        assert!(matches!(
            Lda::fit(&empty, LdaConfig::new(2)),
            Err(ReduceError::EmptyMatrix { .. })
        ));
    }
}
