//! Monthly OHLC resampling.
//!
//! Groups a dated value series by civil calendar month and reduces each group
//! to open (first), high (max), low (min) and close (last). Non-finite values
//! are treated as missing, like a NaN-skipping aggregation.

use chrono::NaiveDate;

use crate::domain::{OhlcBar, month_key};
use crate::error::PipelineError;

/// Resample `(dates[i], values[i])` to monthly bars.
///
/// Dates must be non-decreasing. Months with no point at all produce no bar;
/// a month whose points are all missing is an `EmptyGroup` error.
pub fn to_monthly_ohlc(dates: &[NaiveDate], values: &[f64]) -> Result<Vec<OhlcBar>, PipelineError> {
    if dates.len() != values.len() {
        return Err(PipelineError::malformed(
            None,
            format!(
                "resample input lengths differ: {} dates vs {} values",
                dates.len(),
                values.len()
            ),
        ));
    }
    if let Some(pos) = dates.windows(2).position(|w| w[1] < w[0]) {
        return Err(PipelineError::malformed(
            Some(pos + 2),
            format!("dates must be chronological ({} follows {})", dates[pos + 1], dates[pos]),
        ));
    }

    let mut bars = Vec::new();
    let mut start = 0;
    while start < dates.len() {
        let key = month_key(dates[start]);
        let end = dates[start..]
            .iter()
            .position(|d| month_key(*d) != key)
            .map_or(dates.len(), |offset| start + offset);

        bars.push(bar_from_window(key, &values[start..end])?);
        start = end;
    }

    log::debug!("resampled {} values into {} monthly bars", values.len(), bars.len());
    Ok(bars)
}

/// Reduce one month's window to a bar.
fn bar_from_window((year, month): (i32, u32), window: &[f64]) -> Result<OhlcBar, PipelineError> {
    let mut valid = window.iter().copied().filter(|v| v.is_finite());

    let Some(open) = valid.next() else {
        return Err(PipelineError::EmptyGroup {
            period: format!("{year:04}-{month:02}"),
        });
    };

    let mut bar = OhlcBar {
        year,
        month,
        open,
        high: open,
        low: open,
        close: open,
        count: 1,
    };
    for v in valid {
        bar.high = bar.high.max(v);
        bar.low = bar.low.min(v);
        bar.close = v;
        bar.count += 1;
    }

    Ok(bar)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn groups_by_calendar_month() {
        let dates = [d(2024, 1, 30), d(2024, 1, 31), d(2024, 2, 1), d(2024, 2, 15), d(2024, 2, 29)];
        let values = [2.0, 1.0, 5.0, 7.0, 6.0];

        let bars = to_monthly_ohlc(&dates, &values).unwrap();
        assert_eq!(bars.len(), 2);

        assert_eq!(bars[0].period_label(), "2024-01");
        assert_eq!((bars[0].open, bars[0].high, bars[0].low, bars[0].close), (2.0, 2.0, 1.0, 1.0));

        assert_eq!(bars[1].period_label(), "2024-02");
        assert_eq!((bars[1].open, bars[1].high, bars[1].low, bars[1].close), (5.0, 7.0, 5.0, 6.0));
        assert_eq!(bars[1].count, 3);
    }

    #[test]
    fn same_month_in_different_years_is_separate() {
        let dates = [d(2023, 3, 1), d(2024, 3, 1)];
        let bars = to_monthly_ohlc(&dates, &[1.0, 2.0]).unwrap();
        assert_eq!(bars.len(), 2);
    }

    #[test]
    fn months_without_rows_produce_no_bar() {
        let dates = [d(2024, 1, 10), d(2024, 1, 20), d(2024, 3, 5)];
        let bars = to_monthly_ohlc(&dates, &[1.0, 2.0, 3.0]).unwrap();

        let periods: Vec<String> = bars.iter().map(|b| b.period_label()).collect();
        assert_eq!(periods, vec!["2024-01", "2024-03"]);
        assert_eq!(bars[1].count, 1);
    }

    #[test]
    fn bars_respect_ohlc_invariant() {
        let dates: Vec<NaiveDate> = (0..120).map(|i| d(2024, 1, 1) + chrono::Duration::days(i)).collect();
        let values: Vec<f64> = (0..120).map(|i| ((i as f64) * 0.37).sin() * 10.0 + 20.0).collect();

        for bar in to_monthly_ohlc(&dates, &values).unwrap() {
            assert!(bar.high >= bar.open && bar.high >= bar.close, "{bar:?}");
            assert!(bar.low <= bar.open && bar.low <= bar.close, "{bar:?}");
        }
    }

    #[test]
    fn skips_missing_values_and_flags_empty_months() {
        let dates = [d(2024, 1, 1), d(2024, 1, 2), d(2024, 2, 1)];
        let bars = to_monthly_ohlc(&dates[..2], &[f64::NAN, 3.0]).unwrap();
        assert_eq!(bars[0].open, 3.0);
        assert_eq!(bars[0].count, 1);

        let err = to_monthly_ohlc(&dates, &[1.0, 2.0, f64::NAN]).unwrap_err();
        assert_eq!(
            err,
            PipelineError::EmptyGroup {
                period: "2024-02".to_string()
            }
        );
    }

    #[test]
    fn rejects_unsorted_or_mismatched_input() {
        let err = to_monthly_ohlc(&[d(2024, 2, 1), d(2024, 1, 1)], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { .. }));

        let err = to_monthly_ohlc(&[d(2024, 1, 1)], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { .. }));

        assert!(to_monthly_ohlc(&[], &[]).unwrap().is_empty());
    }
}
