// Preprocessing methods: how a feature set becomes classifier input.

use std::fmt;
use std::str::FromStr;

use crate::text::{TextOptions, Weighting};

/// Topics used by a bare `lda`.
pub const DEFAULT_LDA_TOPICS: usize = 100;

/// One way of turning a feature-set expression into a feature matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Stemmed term counts
    Raw,
    /// Stemmed TF-IDF
    TfIdf,
    /// Unstemmed TF-IDF
    NoStem,
    /// Stemmed TF-IDF reduced to `k` SVD components
    Svd(usize),
    /// Unstemmed counts replaced by `k` LDA topic proportions
    Lda(usize),
}

impl Method {
    /// The methods a full sweep runs, in order.
    pub fn sweep_defaults() -> Vec<Method> {
        vec![
            Method::Raw,
            Method::TfIdf,
            Method::NoStem,
            Method::Svd(50),
            Method::Svd(100),
            Method::Lda(DEFAULT_LDA_TOPICS),
        ]
    }

    /// Text preprocessing feeding this method.
    ///
    /// The TF-IDF family counts unigrams and bigrams, drops terms seen in a
    /// single document and damps repeated terms with a sublinear tf.
    pub fn text_options(&self) -> TextOptions {
        let base = TextOptions::default();
        let tfidf = TextOptions {
            ngram_max: 2,
            min_df: 2,
            sublinear_tf: true,
            ..base
        };
        match self {
            Method::Raw => TextOptions {
                weighting: Weighting::Counts,
                ..base
            },
            Method::TfIdf | Method::Svd(_) => tfidf,
            Method::NoStem => TextOptions {
                stem: false,
                ..tfidf
            },
            Method::Lda(_) => TextOptions {
                stem: false,
                weighting: Weighting::Counts,
                ..base
            },
        }
    }

    pub fn is_topic_model(&self) -> bool {
        matches!(self, Method::Lda(_))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Raw => write!(f, "raw"),
            Method::TfIdf => write!(f, "tfidf"),
            Method::NoStem => write!(f, "nostem"),
            Method::Svd(k) => write!(f, "svd{k}"),
            Method::Lda(k) if *k == DEFAULT_LDA_TOPICS => write!(f, "lda"),
            Method::Lda(k) => write!(f, "lda{k}"),
        }
    }
}

impl FromStr for Method {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        let components = |digits: &str| -> anyhow::Result<usize> {
            match digits.parse::<usize>() {
                Ok(k) if k > 0 => Ok(k),
                _ => anyhow::bail!("Invalid component count in method {s:?}"),
            }
        };

        match s.as_str() {
            "raw" => Ok(Method::Raw),
            "tfidf" => Ok(Method::TfIdf),
            "nostem" => Ok(Method::NoStem),
            "lda" => Ok(Method::Lda(DEFAULT_LDA_TOPICS)),
            other => {
                if let Some(digits) = other.strip_prefix("svd") {
                    Ok(Method::Svd(components(digits)?))
                } else if let Some(digits) = other.strip_prefix("lda") {
                    Ok(Method::Lda(components(digits)?))
                } else {
                    anyhow::bail!(
                        "Unknown method {s:?} (expected raw, tfidf, nostem, svd<k> or lda[<k>])"
                    )
                }
            }
        }
    }
}
