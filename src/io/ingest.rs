//! CSV ingest.
//!
//! This module turns the price and forecast CSV files into in-memory rows.
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **No parsing of price values here**: price rows are carried as strings so
//!   the normalizer owns all validation, whatever the source
//! - **Deterministic behavior** (no hidden randomness)

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::data::normalize::parse_date;
use crate::domain::{ForecastPoint, ForecastSeries, RawPriceRow};
use crate::error::{AppError, PipelineError};

/// Preferred price column, plus accepted aliases.
const PRICE_COLUMNS: [&str; 2] = ["price_usd_per_kg", "price"];

/// Load raw `(date, price)` rows from a price CSV file.
pub fn load_price_rows(path: &Path) -> Result<Vec<RawPriceRow>, AppError> {
    let file = open(path)?;
    let rows = read_price_rows(file)?;
    log::info!("loaded {} price rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Load a forecast CSV file.
///
/// `column` picks the value column explicitly; otherwise the first header
/// containing `forecast`, then `cost`, then the first non-date column is used.
pub fn load_forecast(path: &Path, column: Option<&str>) -> Result<ForecastSeries, AppError> {
    let file = open(path)?;
    let forecast = read_forecast(file, column)?;
    log::info!(
        "loaded {} forecast rows ({}) from {}",
        forecast.points.len(),
        forecast.column,
        path.display()
    );
    Ok(forecast)
}

fn open(path: &Path) -> Result<File, AppError> {
    File::open(path).map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))
}

pub fn read_price_rows<R: Read>(reader: R) -> Result<Vec<RawPriceRow>, AppError> {
    let mut reader = csv_reader(reader);
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let date_idx = *header_map
        .get("date")
        .ok_or_else(|| AppError::new(2, "Missing required column: `date`"))?;
    let price_idx = PRICE_COLUMNS
        .iter()
        .find_map(|name| header_map.get(*name).copied())
        .ok_or_else(|| AppError::new(2, "Missing required column: `price_usd_per_kg`"))?;

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header line, CSV lines are 1-based.
        let line = idx + 2;
        let record = result.map_err(|e| PipelineError::malformed(Some(line), format!("CSV parse error: {e}")))?;

        rows.push(RawPriceRow {
            line,
            date: get_field(&record, date_idx).unwrap_or_default().to_string(),
            price: get_field(&record, price_idx).map(str::to_string),
        });
    }

    Ok(rows)
}

pub fn read_forecast<R: Read>(reader: R, column: Option<&str>) -> Result<ForecastSeries, AppError> {
    let mut reader = csv_reader(reader);
    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let header_map = build_header_map(&headers);

    let date_idx = *header_map
        .get("date")
        .ok_or_else(|| AppError::new(2, "Missing required column in forecast CSV: `date`"))?;
    let (value_name, value_idx) = resolve_forecast_column(&headers, date_idx, column)?;

    let mut points = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let record = result.map_err(|e| PipelineError::malformed(Some(line), format!("CSV parse error: {e}")))?;

        let date_raw = get_field(&record, date_idx)
            .ok_or_else(|| PipelineError::malformed(Some(line), "missing forecast date"))?;
        let date = parse_date(date_raw).map_err(|msg| PipelineError::malformed(Some(line), msg))?;

        let value_raw = get_field(&record, value_idx)
            .ok_or_else(|| PipelineError::malformed(Some(line), format!("missing `{value_name}` value")))?;
        let value = value_raw
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| PipelineError::malformed(Some(line), format!("invalid `{value_name}` value '{value_raw}'")))?;

        points.push(ForecastPoint { date, value });
    }

    points.sort_by_key(|p| p.date);

    Ok(ForecastSeries {
        column: value_name,
        points,
    })
}

fn resolve_forecast_column(
    headers: &StringRecord,
    date_idx: usize,
    column: Option<&str>,
) -> Result<(String, usize), AppError> {
    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();

    if let Some(wanted) = column {
        let wanted = normalize_header_name(wanted);
        return names
            .iter()
            .position(|n| *n == wanted)
            .map(|idx| (wanted.clone(), idx))
            .ok_or_else(|| AppError::new(2, format!("Forecast column `{wanted}` not found in forecast CSV.")));
    }

    let candidates = || names.iter().enumerate().filter(|(idx, _)| *idx != date_idx);
    candidates()
        .find(|(_, n)| n.contains("forecast"))
        .or_else(|| candidates().find(|(_, n)| n.contains("cost")))
        .or_else(|| candidates().next())
        .map(|(idx, n)| (n.clone(), idx))
        .ok_or_else(|| AppError::new(2, "Forecast CSV has no value column besides `date`."))
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn get_field(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn reads_price_rows_with_line_numbers() {
        let csv = "\u{feff}Date,price_usd_per_kg,source\n2024-01-02,15.5,x\n2024-01-01,,y\n";
        let rows = read_price_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], RawPriceRow::new(2, "2024-01-02", "15.5"));
        assert_eq!(rows[1].line, 3);
        assert_eq!(rows[1].price, None);
    }

    #[test]
    fn accepts_price_alias_and_short_rows() {
        let csv = "date,price\n2024-01-01,10\n2024-01-02\n";
        let rows = read_price_rows(csv.as_bytes()).unwrap();
        assert_eq!(rows[0].price.as_deref(), Some("10"));
        assert_eq!(rows[1].price, None);
    }

    #[test]
    fn missing_columns_are_reported() {
        let err = read_price_rows("day,price_usd_per_kg\n".as_bytes()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("`date`"));

        let err = read_price_rows("date,value\n".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("price_usd_per_kg"));
    }

    #[test]
    fn forecast_column_is_detected() {
        let csv = "date,scenario,forecast_wafer_cost_usd\n2026-02-01,base,9.1\n2026-01-01,base,9.0\n";
        let f = read_forecast(csv.as_bytes(), None).unwrap();
        assert_eq!(f.column, "forecast_wafer_cost_usd");
        assert_eq!(f.points[0].date, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());
        assert_eq!(f.points[1].value, 9.1);

        let csv = "date,material_cost\n2026-01-01,8.5\n";
        assert_eq!(read_forecast(csv.as_bytes(), None).unwrap().column, "material_cost");
    }

    #[test]
    fn explicit_forecast_column_and_bad_values() {
        let csv = "date,a,b\n2026-01-01,1.0,2.0\n";
        let f = read_forecast(csv.as_bytes(), Some("B")).unwrap();
        assert_eq!(f.points[0].value, 2.0);

        assert_eq!(read_forecast(csv.as_bytes(), Some("c")).unwrap_err().exit_code(), 2);

        let bad = "date,cost\n2026-01-01,abc\n";
        let err = read_forecast(bad.as_bytes(), None).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }
}
