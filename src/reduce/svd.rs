// Randomized truncated SVD of a sparse matrix.
//
// A Gaussian sketch of the row space is refined with a few power
// iterations and orthonormalized with QR; the small projected problem is
// then solved with a symmetric eigen-decomposition. Both decompositions
// come from nalgebra. The output is the document embedding `U * Sigma`,
// one row per document.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use sprs::CsMat;

use super::ReduceError;

/// Extra sketch columns beyond the requested rank.
const OVERSAMPLES: usize = 10;

/// Power iterations used when the caller has no preference.
pub const DEFAULT_POWER_ITERATIONS: usize = 5;

/// Document embedding and the singular values behind it.
#[derive(Debug, Clone)]
pub struct SvdOutput {
    /// `n_docs x k` matrix `U * Sigma`
    pub embedding: Array2<f64>,
    /// Largest singular values, descending
    pub singular_values: Vec<f64>,
}

impl SvdOutput {
    /// Share of the captured squared singular mass per component.
    pub fn explained_ratio(&self) -> Vec<f64> {
        let total: f64 = self.singular_values.iter().map(|s| s * s).sum();
        if total <= 0.0 {
            return vec![0.0; self.singular_values.len()];
        }
        self.singular_values.iter().map(|s| s * s / total).collect()
    }
}

/// Rank-`k` embedding of `matrix`. `k` is clamped to the matrix dimensions.
pub fn truncated_svd(
    matrix: &CsMat<f64>,
    k: usize,
    power_iterations: usize,
    seed: u64,
) -> Result<SvdOutput, ReduceError> {
    let (n, v) = (matrix.rows(), matrix.cols());
    if n == 0 || v == 0 {
        return Err(ReduceError::EmptyMatrix { rows: n, cols: v });
    }
    if k == 0 {
        return Err(ReduceError::InvalidComponents);
    }

    let k = k.min(n).min(v);
    let sketch = (k + OVERSAMPLES).min(n).min(v);

    let mut rng = StdRng::seed_from_u64(seed);
    let omega = DMatrix::from_fn(v, sketch, |_, _| rng.sample::<f64, _>(StandardNormal));

    // Orthonormal basis for the range of A, sharpened by power iterations
    let mut q = mul(matrix, &omega).qr().q();
    for _ in 0..power_iterations {
        let z = mul_transpose(matrix, &q).qr().q();
        q = mul(matrix, &z).qr().q();
    }

    // B = Q^T A; its Gram matrix B B^T shares B's left singular vectors
    let bt = mul_transpose(matrix, &q);
    let gram = bt.transpose() * &bt;
    let eigen = SymmetricEigen::new(gram);

    let mut order: Vec<usize> = (0..eigen.eigenvalues.len()).collect();
    order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));
    order.truncate(k);

    let singular_values: Vec<f64> = order
        .iter()
        .map(|&i| eigen.eigenvalues[i].max(0.0).sqrt())
        .collect();

    // U * Sigma = Q * W_k * Sigma_k
    let scaled = DMatrix::from_fn(sketch, k, |r, c| {
        eigen.eigenvectors[(r, order[c])] * singular_values[c]
    });
    let embedding = &q * scaled;

    Ok(SvdOutput {
        embedding: to_array(&embedding),
        singular_values,
    })
}

/// `A * M` for sparse `A` (n x v) and dense `M` (v x c).
fn mul(a: &CsMat<f64>, m: &DMatrix<f64>) -> DMatrix<f64> {
    let product: Array2<f64> = a * &to_array(m);
    to_dmatrix(&product)
}

/// `A^T * M` for sparse `A` (n x v) and dense `M` (n x c). The transpose
/// is a CSC view of the same storage.
fn mul_transpose(a: &CsMat<f64>, m: &DMatrix<f64>) -> DMatrix<f64> {
    let product: Array2<f64> = &a.transpose_view() * &to_array(m);
    to_dmatrix(&product)
}

fn to_array(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}

fn to_dmatrix(a: &Array2<f64>) -> DMatrix<f64> {
    DMatrix::from_fn(a.nrows(), a.ncols(), |i, j| a[[i, j]])
}
