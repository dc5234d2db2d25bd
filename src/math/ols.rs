//! Least squares solver.
//!
//! The driver attribution regresses price on the macro proxy columns:
//!
//! ```text
//! minimize Σ (y_i - x_i^T β)^2
//! ```
//!
//! The proxy columns are strongly collinear by construction (GDP growth is an
//! exact linear function of demand and VIX), so the design matrix is usually
//! rank-deficient. SVD with a singular-value cutoff yields the minimum-norm
//! solution in that case instead of failing.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if no finite solution is found at any tolerance.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
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

/// Coefficient of determination for fitted values.
pub fn r_squared(y: &DVector<f64>, fitted: &DVector<f64>) -> Option<f64> {
    let n = y.len();
    if n == 0 || fitted.len() != n {
        return None;
    }
    let mean = y.mean();
    let ss_tot: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    let ss_res: f64 = y.iter().zip(fitted.iter()).map(|(a, b)| (a - b).powi(2)).sum();
    if ss_tot <= 0.0 {
        return None;
    }
    Some(1.0 - ss_res / ss_tot)
}
