//! Ordinary least squares with an intercept.
//!
//! The design is centered and the normal equations are solved through a
//! symmetric eigendecomposition, keeping only directions whose eigenvalue is
//! above a relative tolerance. For a full-rank design this is the usual OLS
//! solution; for a rank-deficient one (collinear calendar columns are the
//! normal case on a five-day forecast) it is the minimum-norm least-squares
//! solution, so a fit exists for every non-empty training set.

use serde::{Deserialize, Serialize};

use crate::error::{ClimateError, Result};

/// Eigenvalues below `RANK_TOLERANCE * largest` are treated as zero.
const RANK_TOLERANCE: f64 = 1e-10;

const MAX_SWEEPS: usize = 100;

/// A fitted linear model `y = intercept + coefficients · x`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    /// Fits the model on `x` (one row per sample) against `y`.
    ///
    /// Both sides are truncated to the shorter length. All rows must have the
    /// same width.
    pub fn fit(x: &[Vec<f64>], y: &[f64]) -> Result<Self> {
        let n = x.len().min(y.len());
        if n == 0 {
            return Err(ClimateError::InsufficientData { needed: 1, got: 0 });
        }
        let (x, y) = (&x[..n], &y[..n]);
        let k = x[0].len();
        debug_assert!(x.iter().all(|row| row.len() == k), "ragged design matrix");

        let y_mean = y.iter().sum::<f64>() / n as f64;
        let x_mean: Vec<f64> = (0..k)
            .map(|j| x.iter().map(|row| row[j]).sum::<f64>() / n as f64)
            .collect();

        // Normal equations on the centered design.
        let mut xtx = vec![vec![0.0; k]; k];
        let mut xty = vec![0.0; k];
        for (row, &target) in x.iter().zip(y) {
            let centered: Vec<f64> = row.iter().zip(&x_mean).map(|(v, m)| v - m).collect();
            let yc = target - y_mean;
            for i in 0..k {
                xty[i] += centered[i] * yc;
                for j in 0..k {
                    xtx[i][j] += centered[i] * centered[j];
                }
            }
        }

        let coefficients = solve_min_norm(xtx, &xty);
        let intercept = y_mean
            - x_mean
                .iter()
                .zip(&coefficients)
                .map(|(m, c)| m * c)
                .sum::<f64>();

        Ok(Self {
            intercept,
            coefficients,
        })
    }

    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(c, v)| c * v)
                .sum::<f64>()
    }

    pub fn predict(&self, x: &[Vec<f64>]) -> Vec<f64> {
        x.iter().map(|row| self.predict_row(row)).collect()
    }
}

pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (p - a).abs())
        .sum::<f64>()
        / n as f64
}

pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> f64 {
    let n = actual.len().min(predicted.len());
    if n == 0 {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (p - a).powi(2))
        .sum::<f64>()
        / n as f64
}

/// Minimum-norm solution of `a · x = b` for symmetric positive semi-definite `a`.
fn solve_min_norm(a: Vec<Vec<f64>>, b: &[f64]) -> Vec<f64> {
    let k = b.len();
    let (eigenvalues, eigenvectors) = symmetric_eigen(a);

    let largest = eigenvalues.iter().cloned().fold(0.0_f64, f64::max);
    let mut x = vec![0.0; k];
    if largest <= 0.0 {
        return x;
    }

    for (col, &lambda) in eigenvalues.iter().enumerate() {
        if lambda <= largest * RANK_TOLERANCE {
            continue;
        }
        let projection: f64 = (0..k).map(|r| eigenvectors[r][col] * b[r]).sum();
        let scale = projection / lambda;
        for (r, xr) in x.iter_mut().enumerate() {
            *xr += scale * eigenvectors[r][col];
        }
    }

    x
}

/// Cyclic Jacobi eigendecomposition of a symmetric matrix.
///
/// Returns the eigenvalues and a matrix whose columns are the matching
/// eigenvectors.
fn symmetric_eigen(mut a: Vec<Vec<f64>>) -> (Vec<f64>, Vec<Vec<f64>>) {
    let k = a.len();
    let mut v: Vec<Vec<f64>> = (0..k)
        .map(|i| (0..k).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    let scale: f64 = a.iter().flatten().map(|x| x * x).sum::<f64>().sqrt();
    if scale == 0.0 {
        return (vec![0.0; k], v);
    }

    for _ in 0..MAX_SWEEPS {
        let off_diagonal: f64 = (0..k)
            .flat_map(|p| (p + 1..k).map(move |q| (p, q)))
            .map(|(p, q)| a[p][q] * a[p][q])
            .sum::<f64>()
            .sqrt();
        if off_diagonal <= f64::EPSILON * scale {
            break;
        }

        for p in 0..k {
            for q in p + 1..k {
                let apq = a[p][q];
                if apq == 0.0 {
                    continue;
                }

                let theta = (a[q][q] - a[p][p]) / (2.0 * apq);
                let t = if theta.abs() > 1e150 {
                    0.5 / theta
                } else {
                    theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt())
                };
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for row in a.iter_mut() {
                    let (rp, rq) = (row[p], row[q]);
                    row[p] = c * rp - s * rq;
                    row[q] = s * rp + c * rq;
                }
                for col in 0..k {
                    let (pc, qc) = (a[p][col], a[q][col]);
                    a[p][col] = c * pc - s * qc;
                    a[q][col] = s * pc + c * qc;
                }
                for row in v.iter_mut() {
                    let (rp, rq) = (row[p], row[q]);
                    row[p] = c * rp - s * rq;
                    row[q] = s * rp + c * rq;
                }
            }
        }
    }

    let eigenvalues = (0..k).map(|i| a[i][i]).collect();
    (eigenvalues, v)
}
