//! Pearson correlation: plain, lagged, and as a matrix.
//!
//! Series are compared positionally. A non-finite value on either side marks
//! the pair as missing. Degenerate inputs are reported as
//! `UndefinedCorrelation`, never coerced to zero.

use crate::domain::CorrelationMatrix;
use crate::error::PipelineError;

/// Pearson correlation over positionally aligned, non-missing pairs.
///
/// If the series differ in length, only the common prefix is compared.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> Result<f64, PipelineError> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .map(|(x, y)| (*x, *y))
        .collect();

    if pairs.len() < 2 {
        return Err(PipelineError::UndefinedCorrelation("fewer than 2 valid pairs"));
    }

    // Exact constancy check first: a constant series can still show a tiny
    // rounding-induced spread around its computed mean.
    let (x0, y0) = pairs[0];
    if pairs.iter().all(|(x, _)| *x == x0) || pairs.iter().all(|(_, y)| *y == y0) {
        return Err(PipelineError::UndefinedCorrelation("zero variance"));
    }

    // Scale both sides to unit max-abs so sums of squares stay in range for
    // very large or very small magnitudes. Pearson is scale invariant.
    let scale_x = pairs.iter().fold(0.0_f64, |m, (x, _)| m.max(x.abs()));
    let scale_y = pairs.iter().fold(0.0_f64, |m, (_, y)| m.max(y.abs()));
    let pairs: Vec<(f64, f64)> = pairs.iter().map(|(x, y)| (x / scale_x, y / scale_y)).collect();

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    let denom = sxx.sqrt() * syy.sqrt();
    if !(denom.is_finite() && denom > 0.0) {
        return Err(PipelineError::UndefinedCorrelation("zero variance"));
    }

    Ok((sxy / denom).clamp(-1.0, 1.0))
}

/// Correlate `a[i]` with `b[i - lag]`.
///
/// `b` is shifted forward by `lag` positions, so the first `lag` entries of
/// `a` have no partner. This is a position shift, not a calendar shift.
pub fn lagged_correlation(a: &[f64], b: &[f64], lag: usize) -> Result<f64, PipelineError> {
    pearson_correlation(a, &shift_forward(b, lag))
}

/// Shift a series forward by `lag` positions, filling the head with NaN.
pub fn shift_forward(values: &[f64], lag: usize) -> Vec<f64> {
    let lag = lag.min(values.len());
    let mut out = vec![f64::NAN; lag];
    out.extend_from_slice(&values[..values.len() - lag]);
    out
}

/// Full pairwise matrix over labelled columns.
pub fn correlation_matrix(columns: &[(&str, &[f64])]) -> CorrelationMatrix {
    let labels: Vec<String> = columns.iter().map(|(label, _)| label.to_string()).collect();

    let mut values = vec![vec![None; columns.len()]; columns.len()];
    for i in 0..columns.len() {
        for j in i..columns.len() {
            let r = pearson_correlation(columns[i].1, columns[j].1).ok();
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    let undefined = values.iter().flatten().filter(|v| v.is_none()).count();
    if undefined > 0 {
        log::warn!("correlation matrix has {undefined} undefined entries");
    }

    CorrelationMatrix { labels, values }
}
