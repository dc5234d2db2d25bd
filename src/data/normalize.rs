//! Series normalizer.
//!
//! Turns raw `(date, price)` rows into a chronologically ordered `PriceSeries`
//! and derives the macro proxy columns from it.
//!
//! The proxies are fixed linear maps of price plus Gaussian noise. Noise comes
//! from a caller-supplied generator, so two runs with generators seeded the
//! same way produce bit-identical columns.

use chrono::NaiveDate;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::domain::{AuxiliarySeries, PricePoint, PriceSeries, RawPriceRow};
use crate::error::PipelineError;

/// Parse, validate and sort raw rows, then derive the auxiliary series.
pub fn normalize<R: Rng + ?Sized>(
    rows: &[RawPriceRow],
    rng: &mut R,
) -> Result<(PriceSeries, AuxiliarySeries), PipelineError> {
    let series = normalize_prices(rows)?;
    let aux = derive_auxiliary(&series, rng)?;
    log::debug!(
        "normalized {} rows ({} .. {})",
        series.len(),
        series.first().map(|p| p.date.to_string()).unwrap_or_default(),
        series.last().map(|p| p.date.to_string()).unwrap_or_default(),
    );
    Ok((series, aux))
}

/// Parse and sort raw rows without touching any random state.
pub fn normalize_prices(rows: &[RawPriceRow]) -> Result<PriceSeries, PipelineError> {
    if rows.is_empty() {
        return Err(PipelineError::malformed(None, "price series has no rows"));
    }

    let mut points = Vec::with_capacity(rows.len());
    for row in rows {
        let date = parse_date(&row.date).map_err(|msg| PipelineError::malformed(Some(row.line), msg))?;
        let price = parse_price(row.price.as_deref()).map_err(|msg| PipelineError::malformed(Some(row.line), msg))?;
        points.push(PricePoint { date, price });
    }

    // `sort_by_key` is stable: equal dates keep their input order.
    points.sort_by_key(|p| p.date);

    PriceSeries::from_sorted(points)
        .ok_or_else(|| PipelineError::malformed(None, "price series is not chronological after sorting"))
}

/// Derive the macro proxy columns from a normalized series.
///
/// Each noisy column draws all of its samples before the next column starts.
pub fn derive_auxiliary<R: Rng + ?Sized>(
    series: &PriceSeries,
    rng: &mut R,
) -> Result<AuxiliarySeries, PipelineError> {
    let price = series.prices();

    let dxy = linear_with_noise(&price, 100.0, -0.25, 0.6, rng)?;
    let copper = linear_with_noise(&price, 6000.0, 120.0, 80.0, rng)?;
    let gold = linear_with_noise(&price, 1400.0, 4.5, 15.0, rng)?;
    let silver = linear_with_noise(&price, 18.0, 0.09, 0.6, rng)?;
    let vix = linear_with_noise(&price, 18.0, 0.4, 2.0, rng)?;
    let industrial_demand = linear_with_noise(&copper, 100.0, 0.03, 5.0, rng)?;

    let gdp_growth = industrial_demand
        .iter()
        .zip(&vix)
        .map(|(d, v)| 2.5 + 0.002 * d - 0.05 * v)
        .collect();

    Ok(AuxiliarySeries {
        dxy,
        copper,
        gold,
        silver,
        vix,
        industrial_demand,
        gdp_growth,
    })
}

/// Polysilicon / copper ratio (copper quoted per thousand).
pub fn ratio_series(price: &[f64], copper: &[f64]) -> Vec<f64> {
    price
        .iter()
        .zip(copper)
        .map(|(p, c)| p / (c / 1000.0))
        .collect()
}

fn linear_with_noise<R: Rng + ?Sized>(
    input: &[f64],
    intercept: f64,
    slope: f64,
    std_dev: f64,
    rng: &mut R,
) -> Result<Vec<f64>, PipelineError> {
    let noise = Normal::new(0.0, std_dev)
        .map_err(|e| PipelineError::malformed(None, format!("invalid noise distribution: {e}")))?;
    Ok(input
        .iter()
        .map(|x| intercept + slope * x + noise.sample(&mut *rng))
        .collect())
}

/// Parse a calendar date.
///
/// ISO dates are expected, but exports frequently use day-first formats or
/// carry a time component, so a small fixed set is accepted.
pub fn parse_date(s: &str) -> Result<NaiveDate, String> {
    const FMTS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
    let s = s.trim();
    for fmt in FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }

    // `2024-01-31T00:00:00` / `2024-01-31 00:00:00`
    if let (Some(head), Some(sep)) = (s.get(..10), s.get(10..11)) {
        if matches!(sep, "T" | " ") {
            if let Ok(d) = NaiveDate::parse_from_str(head, "%Y-%m-%d") {
                return Ok(d);
            }
        }
    }

    Err(format!(
        "invalid date '{s}'; expected one of: YYYY-MM-DD, YYYY/MM/DD, DD/MM/YYYY, DD-MM-YYYY"
    ))
}

fn parse_price(s: Option<&str>) -> Result<f64, String> {
    let s = s.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| "missing price".to_string())?;
    let v = s
        .parse::<f64>()
        .map_err(|_| format!("non-numeric price '{s}'"))?;
    if !v.is_finite() {
        return Err(format!("non-finite price '{s}'"));
    }
    if v <= 0.0 {
        return Err(format!("price must be > 0 (got {v})"));
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rows(data: &[(&str, &str)]) -> Vec<RawPriceRow> {
        data.iter()
            .enumerate()
            .map(|(i, (d, p))| RawPriceRow::new(i + 2, *d, *p))
            .collect()
    }

    fn bits(v: &[f64]) -> Vec<u64> {
        v.iter().map(|x| x.to_bits()).collect()
    }

    #[test]
    fn sorts_by_date_and_keeps_ties_in_input_order() {
        let input = rows(&[
            ("2024-01-03", "3.0"),
            ("2024-01-01", "1.0"),
            ("2024-01-02", "2.0"),
            ("2024-01-01", "1.5"),
        ]);
        let series = normalize_prices(&input).unwrap();
        assert_eq!(series.prices(), vec![1.0, 1.5, 2.0, 3.0]);
    }

    #[test]
    fn renormalizing_is_identity() {
        let input = rows(&[
            ("2024-02-01", "17.25"),
            ("2024-01-15", "16.1"),
            ("2024-03-01", "0.1"),
        ]);
        let first = normalize_prices(&input).unwrap();
        let second = normalize_prices(&first.to_raw_rows()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn same_seed_gives_bit_identical_auxiliaries() {
        let input = rows(&[("2024-01-01", "10.0"), ("2024-01-02", "11.5"), ("2024-01-03", "9.75")]);

        let (_, a) = normalize(&input, &mut StdRng::seed_from_u64(42)).unwrap();
        let (_, b) = normalize(&input, &mut StdRng::seed_from_u64(42)).unwrap();

        for kind in crate::domain::AuxKind::ALL {
            assert_eq!(bits(a.get(kind)), bits(b.get(kind)), "{}", kind.label());
        }

        let (_, c) = normalize(&input, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_ne!(bits(&a.copper), bits(&c.copper));
    }

    #[test]
    fn auxiliary_columns_align_with_prices() {
        let input = rows(&[("2024-01-01", "10.0"), ("2024-01-02", "20.0")]);
        let (series, aux) = normalize(&input, &mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(aux.len(), series.len());
        for (_, col) in aux.iter() {
            assert_eq!(col.len(), 2);
        }
        // GDP growth is noise-free given demand and VIX.
        let expected = 2.5 + 0.002 * aux.industrial_demand[1] - 0.05 * aux.vix[1];
        assert_eq!(aux.gdp_growth[1], expected);
        // Copper tracks 6000 + 120 * price within a generous noise band.
        assert!((aux.copper[1] - 8400.0).abs() < 800.0);
    }

    #[test]
    fn rejects_bad_prices_and_dates() {
        let err = normalize_prices(&rows(&[("2024-01-01", "-1")])).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { line: Some(2), .. }));

        let err = normalize_prices(&rows(&[("2024-01-01", "0")])).unwrap_err();
        assert!(matches!(err, PipelineError::MalformedInput { .. }));

        let err = normalize_prices(&rows(&[("2024-01-01", "abc")])).unwrap_err();
        assert!(err.to_string().contains("non-numeric"));

        let err = normalize_prices(&rows(&[("not-a-date", "1.0")])).unwrap_err();
        assert!(err.to_string().contains("invalid date"));

        let missing = vec![RawPriceRow {
            line: 5,
            date: "2024-01-01".to_string(),
            price: None,
        }];
        let err = normalize_prices(&missing).unwrap_err();
        assert_eq!(err, PipelineError::malformed(Some(5), "missing price"));

        assert!(normalize_prices(&[]).is_err());
    }

    #[test]
    fn accepts_common_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        for s in ["2024-01-31", "2024/01/31", "31/01/2024", "31-01-2024", "2024-01-31T00:00:00", "2024-01-31 12:00:00"] {
            assert_eq!(parse_date(s).unwrap(), expected, "{s}");
        }
    }

    #[test]
    fn ratio_uses_copper_per_thousand() {
        let r = ratio_series(&[10.0, 20.0], &[8000.0, 10000.0]);
        assert_eq!(r, vec![1.25, 2.0]);
    }
}
