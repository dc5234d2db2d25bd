//! Reporting utilities: summary statistics and formatted terminal output.

pub mod format;

pub use format::*;

/// Min/max/mean/latest summary of a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStats {
    pub n: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub first: f64,
    pub last: f64,
}

impl SeriesStats {
    /// Relative change from first to last value, in percent.
    pub fn change_pct(&self) -> f64 {
        (self.last / self.first - 1.0) * 100.0
    }
}

/// Summarize the finite values of a series. `None` if there are none.
pub fn series_stats(values: &[f64]) -> Option<SeriesStats> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let first = *finite.first()?;
    let last = *finite.last()?;

    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in &finite {
        min = min.min(*v);
        max = max.max(*v);
    }

    Some(SeriesStats {
        n: finite.len(),
        min,
        max,
        mean: finite.iter().sum::<f64>() / finite.len() as f64,
        first,
        last,
    })
}
