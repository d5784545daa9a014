//! Ordinary least squares helpers.
//!
//! Every regression in this crate is a tiny dense problem:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! with one or two features plus an intercept column.
//!
//! Implementation choices:
//! - We solve with SVD so tall design matrices (more rows than columns) work.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - Goodness of fit is the usual coefficient of determination, which is
//!   undefined when the response has zero variance.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` for non-finite input or a system too ill-conditioned to solve
/// robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() == 0 || x.nrows() != y.len() {
        return None;
    }
    // The SVD iteration panics on NaN singular values.
    if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
        return None;
    }
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Prepend a column of ones to `x`.
pub fn add_constant(x: &DMatrix<f64>) -> DMatrix<f64> {
    x.clone().insert_column(0, 1.0)
}

/// Build an `n x k` feature matrix from `k` equally long columns.
///
/// Returns `None` if the columns are empty or ragged.
pub fn columns_to_matrix(columns: &[&[f64]]) -> Option<DMatrix<f64>> {
    let n = columns.first()?.len();
    if n == 0 || columns.iter().any(|c| c.len() != n) {
        return None;
    }
    Some(DMatrix::from_fn(n, columns.len(), |i, j| columns[j][i]))
}

/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// Returns `None` for empty/mismatched input or a constant response.
pub fn r_squared(y: &[f64], y_hat: &[f64]) -> Option<f64> {
    if y.is_empty() || y.len() != y_hat.len() {
        return None;
    }
    let mean = y.iter().sum::<f64>() / y.len() as f64;
    let ss_tot: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    if !(ss_tot.is_finite() && ss_tot > 0.0) {
        return None;
    }
    let ss_res: f64 = y.iter().zip(y_hat).map(|(a, b)| (a - b).powi(2)).sum();
    let r2 = 1.0 - ss_res / ss_tot;
    r2.is_finite().then_some(r2)
}

/// `n` evenly spaced values from `start` to `stop` inclusive.
pub fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => (0..n)
            .map(|i| {
                let u = i as f64 / (n as f64 - 1.0);
                start + u * (stop - start)
            })
            .collect(),
    }
}

/// Minimum and maximum of a slice, or `None` if empty or unbounded.
pub fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for &v in values {
        lo = lo.min(v);
        hi = hi.max(v);
    }
    (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert_abs_diff_eq!(beta[0], 2.0, epsilon = 1e-10);
        assert_abs_diff_eq!(beta[1], 3.0, epsilon = 1e-10);
    }

    #[test]
    fn least_squares_rejects_mismatched_rows() {
        let x = DMatrix::from_row_slice(2, 1, &[1.0, 1.0]);
        let y = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        assert!(solve_least_squares(&x, &y).is_none());
    }

    #[test]
    fn least_squares_rejects_non_finite_values() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, f64::NAN, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);
        assert!(solve_least_squares(&x, &y).is_none());

        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, f64::INFINITY, 8.0]);
        assert!(solve_least_squares(&x, &y).is_none());
    }

    #[test]
    fn add_constant_puts_ones_first() {
        let x = DMatrix::from_row_slice(2, 1, &[4.0, 5.0]);
        let xc = add_constant(&x);
        assert_eq!(xc.ncols(), 2);
        assert_eq!(xc[(0, 0)], 1.0);
        assert_eq!(xc[(1, 1)], 5.0);
    }

    #[test]
    fn columns_to_matrix_rejects_ragged() {
        let a = [1.0, 2.0];
        let b = [3.0];
        assert!(columns_to_matrix(&[&a, &b]).is_none());
        let m = columns_to_matrix(&[&a, &a]).unwrap();
        assert_eq!((m.nrows(), m.ncols()), (2, 2));
    }

    #[test]
    fn r_squared_perfect_and_constant() {
        assert_abs_diff_eq!(r_squared(&[1.0, 2.0, 3.0], &[1.0, 2.0, 3.0]).unwrap(), 1.0);
        assert!(r_squared(&[2.0, 2.0], &[2.0, 2.0]).is_none());
    }

    #[test]
    fn linspace_endpoints() {
        let v = linspace(0.0, 1.0, 5);
        assert_eq!(v.len(), 5);
        assert_abs_diff_eq!(v[0], 0.0);
        assert_abs_diff_eq!(v[4], 1.0);
        assert_abs_diff_eq!(v[2], 0.5);
    }
}
