// Dimensionality reduction over document-term matrices.
//
// - [`svd::truncated_svd`]: latent semantic embedding of a TF-IDF matrix
// - [`lda::Lda`]: topic proportions from a count matrix

pub mod lda;
pub mod svd;

use thiserror::Error;

/// Errors from fitting a reduction.
#[derive(Error, Debug, PartialEq)]
pub enum ReduceError {
    #[error("Matrix is empty ({rows} x {cols})")]
    EmptyMatrix { rows: usize, cols: usize },

    #[error("Number of components must be positive")]
    InvalidComponents,

    #[error("Invalid hyperparameter: {0}")]
    InvalidParameter(String),
}
