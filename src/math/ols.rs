//! Least squares solver.
//!
//! The linear resale model solves one regression problem of the form:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! One-hot blocks are collinear with the intercept (each block sums to 1), so the
//! design matrix is rank deficient by construction. We solve the normal equations
//! `XᵀX β = Xᵀy` with an SVD pseudo-inverse, dropping singular values below a
//! tolerance relative to the largest one. The system is small (one row/column per
//! schema column), so the cost does not grow with the number of listings beyond
//! accumulating `XᵀX`.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if no tolerance yields a finite solution.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);
    let max_sv = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    if !(max_sv.is_finite() && max_sv > 0.0) {
        return None;
    }

    // Try progressively looser tolerances if strict solve fails.
    for &rel in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, rel * max_sv) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Ordinary least squares with an intercept via the normal equations.
///
/// Returns `(intercept, coefficients)`.
pub fn fit_ols_with_intercept(rows: &[Vec<f64>], y: &[f64]) -> Option<(f64, Vec<f64>)> {
    let n_features = rows.first()?.len();
    let dim = n_features + 1;

    let mut xtx = DMatrix::<f64>::zeros(dim, dim);
    let mut xty = DVector::<f64>::zeros(dim);
    let mut augmented = vec![0.0; dim];

    for (row, &target) in rows.iter().zip(y) {
        if row.len() != n_features {
            return None;
        }
        augmented[0] = 1.0;
        augmented[1..].copy_from_slice(row);

        for i in 0..dim {
            let xi = augmented[i];
            if xi == 0.0 {
                continue;
            }
            xty[i] += xi * target;
            for j in 0..dim {
                xtx[(i, j)] += xi * augmented[j];
            }
        }
    }

    let beta = solve_least_squares(&xtx, &xty)?;
    let intercept = beta[0];
    let coefficients = beta.iter().skip(1).copied().collect();
    Some((intercept, coefficients))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn ols_with_intercept_recovers_plane() {
        // y = 10 + 2a - b
        let rows: Vec<Vec<f64>> = vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![2.0, 3.0],
            vec![4.0, 1.0],
        ];
        let y: Vec<f64> = rows.iter().map(|r| 10.0 + 2.0 * r[0] - r[1]).collect();

        let (b0, b) = fit_ols_with_intercept(&rows, &y).unwrap();
        assert!((b0 - 10.0).abs() < 1e-8);
        assert!((b[0] - 2.0).abs() < 1e-8);
        assert!((b[1] + 1.0).abs() < 1e-8);
    }

    #[test]
    fn ols_tolerates_collinear_one_hot_block() {
        // Two indicator columns that always sum to one (collinear with intercept).
        let rows = vec![
            vec![1.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![0.0, 1.0],
        ];
        let y = vec![100.0, 100.0, 200.0, 200.0];

        let (b0, b) = fit_ols_with_intercept(&rows, &y).unwrap();
        for (row, target) in rows.iter().zip(&y) {
            let fitted = b0 + row[0] * b[0] + row[1] * b[1];
            assert!((fitted - target).abs() < 1e-6, "fitted {fitted} vs {target}");
        }
    }

    #[test]
    fn ols_empty_input_is_none() {
        assert!(fit_ols_with_intercept(&[], &[]).is_none());
    }
}
