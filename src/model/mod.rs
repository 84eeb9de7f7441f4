// Classifier inputs and the logistic-regression model.

pub mod logistic;

use ndarray::{Array2, ArrayView1, ArrayViewMut1, Axis};
use sprs::CsMat;
use thiserror::Error;

use crate::text::vectorizer::csr_from_rows;

/// Errors that can occur while fitting or applying a model.
#[derive(Error, Debug, PartialEq)]
pub enum ModelError {
    #[error("Training set is empty")]
    EmptyTrainingSet,

    #[error("Training labels contain a single class; need both 0 and 1")]
    SingleClass,

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Model has not been fitted yet")]
    NotFitted,
}

/// Feature rows for the classifier: sparse term weights or dense
/// SVD / topic embeddings.
#[derive(Debug, Clone)]
pub enum FeatureMatrix {
    Sparse(CsMat<f64>),
    Dense(Array2<f64>),
}

impl FeatureMatrix {
    pub fn nrows(&self) -> usize {
        match self {
            Self::Sparse(m) => m.rows(),
            Self::Dense(m) => m.nrows(),
        }
    }

    pub fn ncols(&self) -> usize {
        match self {
            Self::Sparse(m) => m.cols(),
            Self::Dense(m) => m.ncols(),
        }
    }

    /// New matrix made of the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        match self {
            Self::Sparse(m) => {
                let picked = rows
                    .iter()
                    .map(|&r| {
                        m.outer_view(r)
                            .map(|row| row.iter().map(|(c, &v)| (c, v)).collect())
                            .unwrap_or_default()
                    })
                    .collect();
                Self::Sparse(csr_from_rows(m.cols(), picked))
            }
            Self::Dense(m) => Self::Dense(m.select(Axis(0), rows)),
        }
    }

    /// First `n` rows (the training block when rows are train-then-test).
    pub fn head(&self, n: usize) -> Self {
        let rows: Vec<usize> = (0..n.min(self.nrows())).collect();
        self.select_rows(&rows)
    }

    /// Rows from `start` to the end.
    pub fn tail_from(&self, start: usize) -> Self {
        let rows: Vec<usize> = (start.min(self.nrows())..self.nrows()).collect();
        self.select_rows(&rows)
    }

    /// Dot product of row `i` with `w`.
    pub fn row_dot(&self, i: usize, w: ArrayView1<f64>) -> f64 {
        match self {
            Self::Sparse(m) => m
                .outer_view(i)
                .map(|row| row.iter().map(|(c, &v)| v * w[c]).sum())
                .unwrap_or(0.0),
            Self::Dense(m) => m.row(i).dot(&w),
        }
    }

    /// `acc += scale * row_i`
    pub fn add_scaled_row(&self, i: usize, scale: f64, mut acc: ArrayViewMut1<f64>) {
        match self {
            Self::Sparse(m) => {
                if let Some(row) = m.outer_view(i) {
                    for (c, &v) in row.iter() {
                        acc[c] += scale * v;
                    }
                }
            }
            Self::Dense(m) => acc.scaled_add(scale, &m.row(i)),
        }
    }

    /// Stack column vectors into a dense matrix (used for blending).
    pub fn from_columns(columns: &[Vec<f64>]) -> Self {
        let nrows = columns.first().map_or(0, Vec::len);
        Self::Dense(Array2::from_shape_fn((nrows, columns.len()), |(i, j)| {
            columns[j][i]
        }))
    }
}
