// L2-regularized logistic regression for the evergreen label.
//
// Minimizes the mean log loss plus `||w||^2 / (2 * C * n)`, the same
// objective as the usual `C`-parameterized formulation divided by `C * n`.
// The intercept is not penalized. Optimization is L-BFGS with a backtracking
// line search, which keeps working when raw weighted counts put feature
// columns on very different scales.

use std::collections::VecDeque;

use ndarray::{s, Array1};
use tracing::warn;

use super::{FeatureMatrix, ModelError};

/// Correction pairs kept by L-BFGS.
const MEMORY: usize = 10;

/// Sufficient-decrease constant of the line search.
const ARMIJO: f64 = 1e-4;

/// Line search gives up below this step length.
const MIN_STEP: f64 = 1e-20;

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    /// Inverse regularization strength
    c: f64,
    max_iter: usize,
    /// Stop when the largest gradient component falls below this
    tolerance: f64,
    weights: Option<Array1<f64>>,
    intercept: f64,
    /// Iterations used by the last fit
    pub iterations: usize,
    /// Whether the last fit reached `tolerance`
    pub converged: bool,
}

/// One L-BFGS correction: parameter step, gradient change, 1 / (s . y).
#[derive(Debug)]
struct Correction {
    s: Array1<f64>,
    y: Array1<f64>,
    rho: f64,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl LogisticRegression {
    pub fn new(c: f64) -> Self {
        Self {
            c,
            max_iter: 1000,
            tolerance: 1e-6,
            weights: None,
            intercept: 0.0,
            iterations: 0,
            converged: false,
        }
    }

    pub fn max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn weights(&self) -> Option<&Array1<f64>> {
        self.weights.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    fn sigmoid(z: f64) -> f64 {
        if z >= 0.0 {
            1.0 / (1.0 + (-z).exp())
        } else {
            let e = z.exp();
            e / (1.0 + e)
        }
    }

    /// ln(1 + e^z) without overflow.
    fn softplus(z: f64) -> f64 {
        z.max(0.0) + (-z.abs()).exp().ln_1p()
    }

    /// Objective value and gradient at `theta` (weights, then intercept).
    fn objective(x: &FeatureMatrix, y: &[f64], theta: &Array1<f64>, lambda: f64) -> (f64, Array1<f64>) {
        let d = x.ncols();
        let n = y.len() as f64;
        let w = theta.slice(s![..d]);
        let b = theta[d];

        let mut grad = Array1::<f64>::zeros(d + 1);
        let mut loss = 0.0;
        for (i, &label) in y.iter().enumerate() {
            let z = x.row_dot(i, w) + b;
            loss += Self::softplus(z) - label * z;
            let err = (Self::sigmoid(z) - label) / n;
            x.add_scaled_row(i, err, grad.slice_mut(s![..d]));
            grad[d] += err;
        }
        grad.slice_mut(s![..d]).scaled_add(lambda, &w);

        (loss / n + 0.5 * lambda * w.dot(&w), grad)
    }

    /// Fit on rows of `x` with 0/1 labels `y`.
    pub fn fit(&mut self, x: &FeatureMatrix, y: &[f64]) -> Result<(), ModelError> {
        let n = x.nrows();
        if n == 0 {
            return Err(ModelError::EmptyTrainingSet);
        }
        if y.len() != n {
            return Err(ModelError::DimensionMismatch {
                expected: n,
                got: y.len(),
            });
        }
        let positives = y.iter().filter(|&&v| v > 0.5).count();
        if positives == 0 || positives == n {
            return Err(ModelError::SingleClass);
        }

        let d = x.ncols();
        let lambda = 1.0 / (self.c * n as f64);

        let mut theta = Array1::<f64>::zeros(d + 1);
        let (mut f, mut g) = Self::objective(x, y, &theta, lambda);
        let mut history: VecDeque<Correction> = VecDeque::with_capacity(MEMORY);

        self.iterations = 0;
        self.converged = false;
        while self.iterations < self.max_iter {
            if max_abs(&g) < self.tolerance {
                self.converged = true;
                break;
            }
            self.iterations += 1;

            let mut direction = search_direction(&g, &history);
            let mut slope = g.dot(&direction);
            if slope >= 0.0 {
                // Curvature pairs went stale; restart from steepest descent
                history.clear();
                direction = search_direction(&g, &history);
                slope = g.dot(&direction);
            }

            let mut step = 1.0;
            let accepted = loop {
                let candidate = &theta + &(&direction * step);
                let (f_new, g_new) = Self::objective(x, y, &candidate, lambda);
                if f_new <= f + ARMIJO * step * slope {
                    break Some((candidate, f_new, g_new));
                }
                step *= 0.5;
                if step < MIN_STEP {
                    break None;
                }
            };

            let Some((next, f_next, g_next)) = accepted else {
                break;
            };

            let s_k = &next - &theta;
            let y_k = &g_next - &g;
            let sy = s_k.dot(&y_k);
            if sy > 1e-12 {
                if history.len() == MEMORY {
                    history.pop_front();
                }
                history.push_back(Correction {
                    s: s_k,
                    y: y_k,
                    rho: 1.0 / sy,
                });
            }

            theta = next;
            f = f_next;
            g = g_next;
        }

        if !self.converged && max_abs(&g) < self.tolerance {
            self.converged = true;
        }
        if !self.converged {
            warn!(
                iterations = self.iterations,
                gradient = max_abs(&g),
                tolerance = self.tolerance,
                "Logistic regression stopped before reaching tolerance"
            );
        }

        self.intercept = theta[d];
        self.weights = Some(theta.slice(s![..d]).to_owned());
        Ok(())
    }

    /// Probability of the positive (evergreen) class for each row.
    pub fn predict_proba(&self, x: &FeatureMatrix) -> Result<Vec<f64>, ModelError> {
        let w = self.weights.as_ref().ok_or(ModelError::NotFitted)?;
        if x.ncols() != w.len() {
            return Err(ModelError::DimensionMismatch {
                expected: w.len(),
                got: x.ncols(),
            });
        }
        Ok((0..x.nrows())
            .map(|i| Self::sigmoid(x.row_dot(i, w.view()) + self.intercept))
            .collect())
    }
}

fn max_abs(v: &Array1<f64>) -> f64 {
    v.iter().fold(0.0, |acc, x| acc.max(x.abs()))
}

/// L-BFGS two-loop recursion: an approximation of `-H^{-1} g`.
fn search_direction(g: &Array1<f64>, history: &VecDeque<Correction>) -> Array1<f64> {
    let mut q = g.clone();
    let mut alphas = Vec::with_capacity(history.len());
    for c in history.iter().rev() {
        let alpha = c.rho * c.s.dot(&q);
        q.scaled_add(-alpha, &c.y);
        alphas.push(alpha);
    }

    let gamma = match history.back() {
        Some(last) => last.s.dot(&last.y) / last.y.dot(&last.y),
        // No curvature yet: keep the first step at most unit length
        None => 1.0 / g.dot(g).sqrt().max(1.0),
    };
    q *= gamma;

    for (c, alpha) in history.iter().zip(alphas.iter().rev()) {
        let beta = c.rho * c.y.dot(&q);
        q.scaled_add(alpha - beta, &c.s);
    }
    q.mapv_inplace(|v| -v);
    q
}
