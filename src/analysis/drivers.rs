//! Price driver attribution.
//!
//! Regresses the price series on the standardized macro proxy columns and
//! attributes each observation's deviation from the mean price to the
//! features. For a linear model the attribution of feature `j` on row `i` is
//! exactly `β_j · z_ij`; the report ranks features by the mean absolute value
//! of that contribution.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use crate::domain::{AuxKind, AuxiliarySeries, PriceSeries};
use crate::error::{AppError, PipelineError};
use crate::math::{r_squared, solve_least_squares};

/// Attribution for one feature.
#[derive(Debug, Clone, Serialize)]
pub struct DriverContribution {
    pub feature: AuxKind,
    /// Price change (USD/kg) per one standard deviation of the feature.
    pub coefficient: f64,
    /// Mean of `|β_j · z_ij|` over all rows.
    pub mean_abs_contribution: f64,
}

/// Fitted driver model.
#[derive(Debug, Clone, Serialize)]
pub struct DriverFit {
    pub intercept: f64,
    /// Sorted by `mean_abs_contribution`, largest first.
    pub drivers: Vec<DriverContribution>,
    pub r_squared: Option<f64>,
    pub n: usize,
}

pub fn fit_price_drivers(series: &PriceSeries, aux: &AuxiliarySeries) -> Result<DriverFit, AppError> {
    let n = series.len();
    if aux.len() != n {
        return Err(PipelineError::malformed(
            None,
            format!("auxiliary columns have {} rows, price series has {n}", aux.len()),
        )
        .into());
    }

    // Constant columns carry no information and would divide by zero when standardized.
    let features: Vec<(AuxKind, Vec<f64>)> = aux
        .iter()
        .filter_map(|(kind, col)| standardize(col).map(|z| (kind, z)))
        .collect();

    let p = features.len() + 1;
    if n <= p {
        return Err(PipelineError::malformed(
            None,
            format!("driver fit needs more than {p} observations (got {n})"),
        )
        .into());
    }

    let x = DMatrix::from_fn(n, p, |i, j| if j == 0 { 1.0 } else { features[j - 1].1[i] });
    let y = DVector::from_vec(series.prices());

    let beta = solve_least_squares(&x, &y)
        .ok_or_else(|| AppError::new(4, "Driver regression could not be solved."))?;
    let fitted = &x * &beta;

    let mut drivers: Vec<DriverContribution> = features
        .iter()
        .enumerate()
        .map(|(j, (kind, z))| {
            let coefficient = beta[j + 1];
            let mean_abs_contribution = z.iter().map(|v| (coefficient * v).abs()).sum::<f64>() / n as f64;
            DriverContribution {
                feature: *kind,
                coefficient,
                mean_abs_contribution,
            }
        })
        .collect();
    drivers.sort_by(|a, b| b.mean_abs_contribution.total_cmp(&a.mean_abs_contribution));

    let fit = DriverFit {
        intercept: beta[0],
        drivers,
        r_squared: r_squared(&y, &fitted),
        n,
    };
    log::info!("driver fit over {n} rows, R²={:?}", fit.r_squared);
    Ok(fit)
}

/// Z-score a column (population standard deviation). `None` for constant columns.
fn standardize(col: &[f64]) -> Option<Vec<f64>> {
    if col.is_empty() {
        return None;
    }
    let n = col.len() as f64;
    let mean = col.iter().sum::<f64>() / n;
    let var = col.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let sd = var.sqrt();
    if !(sd.is_finite() && sd > 1e-12) {
        return None;
    }
    Some(col.iter().map(|v| (v - mean) / sd).collect())
}
