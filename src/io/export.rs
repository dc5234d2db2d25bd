//! Exports: per-date simulation CSV, monthly OHLC CSV, dashboard JSON, and the
//! synthetic dataset files written by `wafer generate`.
//!
//! CSV exports are meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::domain::{ForecastSeries, OhlcBar, PriceSeries, SimulationResult};
use crate::error::AppError;

/// Write per-date shocked cost and margin to a CSV file.
pub fn write_simulation_csv(path: &Path, series: &PriceSeries, sim: &SimulationResult) -> Result<(), AppError> {
    let mut writer = csv_writer(path)?;

    writer
        .write_record([
            "date",
            "price_usd_per_kg",
            "shock_pct",
            "node",
            "dies_per_wafer",
            "wafer_cost_usd",
            "die_cost_usd",
            "margin_pct",
        ])
        .map_err(|e| csv_err(path, e))?;

    for (i, p) in series.points().iter().enumerate() {
        writer
            .write_record([
                p.date.to_string(),
                p.price.to_string(),
                sim.shock_pct.to_string(),
                sim.node.to_string(),
                sim.node.dies_per_wafer().to_string(),
                format!("{:.6}", sim.wafer_cost[i]),
                format!("{:.8}", sim.die_cost[i]),
                format!("{:.6}", sim.margin_pct[i]),
            ])
            .map_err(|e| csv_err(path, e))?;
    }

    writer.flush().map_err(|e| write_err(path, e))
}

/// Write monthly bars to a CSV file.
pub fn write_ohlc_csv(path: &Path, bars: &[OhlcBar]) -> Result<(), AppError> {
    let mut writer = csv_writer(path)?;

    writer
        .write_record(["period", "open", "high", "low", "close", "count"])
        .map_err(|e| csv_err(path, e))?;
    for b in bars {
        writer
            .write_record([
                b.period_label(),
                format!("{:.6}", b.open),
                format!("{:.6}", b.high),
                format!("{:.6}", b.low),
                format!("{:.6}", b.close),
                b.count.to_string(),
            ])
            .map_err(|e| csv_err(path, e))?;
    }

    writer.flush().map_err(|e| write_err(path, e))
}

/// Write a daily price dataset in the layout `load_price_rows` expects.
pub fn write_price_csv(path: &Path, series: &PriceSeries) -> Result<(), AppError> {
    let mut writer = csv_writer(path)?;

    writer
        .write_record(["date", "price_usd_per_kg"])
        .map_err(|e| csv_err(path, e))?;
    for p in series.points() {
        writer
            .write_record([p.date.to_string(), p.price.to_string()])
            .map_err(|e| csv_err(path, e))?;
    }

    writer.flush().map_err(|e| write_err(path, e))
}

/// Write a forecast dataset (`date,<column>`). The column name is quoted when needed.
pub fn write_forecast_csv(path: &Path, forecast: &ForecastSeries) -> Result<(), AppError> {
    let mut writer = csv_writer(path)?;

    writer
        .write_record(["date", forecast.column.as_str()])
        .map_err(|e| csv_err(path, e))?;
    for p in &forecast.points {
        writer
            .write_record([p.date.to_string(), p.value.to_string()])
            .map_err(|e| csv_err(path, e))?;
    }

    writer.flush().map_err(|e| write_err(path, e))
}

/// Serialize any output value as pretty JSON.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), AppError> {
    let mut file = create(path)?;
    serde_json::to_writer_pretty(&mut file, value)
        .map_err(|e| AppError::new(2, format!("Failed to write JSON '{}': {e}", path.display())))?;
    file.flush().map_err(|e| write_err(path, e))
}

fn create(path: &Path) -> Result<BufWriter<File>, AppError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))
}

fn csv_writer(path: &Path) -> Result<csv::Writer<File>, AppError> {
    csv::Writer::from_path(path).map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", path.display())))
}

fn csv_err(path: &Path, e: csv::Error) -> AppError {
    AppError::new(2, format!("Failed to write '{}': {e}", path.display()))
}

fn write_err(path: &Path, e: std::io::Error) -> AppError {
    AppError::new(2, format!("Failed to write '{}': {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ingest::{load_forecast, load_price_rows};
    use crate::data::normalize_prices;
    use crate::domain::TechNode;
    use crate::io::repository::InMemoryRepository;
    use crate::io::repository::PriceRepository;
    use crate::sim::simulate;

    fn series() -> PriceSeries {
        let repo = InMemoryRepository::from_pairs(&[("2024-01-01", 10.0), ("2024-01-02", 12.5)]);
        normalize_prices(&repo.load_prices().unwrap()).unwrap()
    }

    #[test]
    fn price_csv_reloads_to_the_same_series() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prices.csv");
        let s = series();

        write_price_csv(&path, &s).unwrap();
        let reloaded = normalize_prices(&load_price_rows(&path).unwrap()).unwrap();
        assert_eq!(reloaded, s);
    }

    #[test]
    fn simulation_csv_has_one_row_per_date() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sim.csv");
        let s = series();
        let sim = simulate(&s.prices(), 0.0, TechNode::Nm28).unwrap();

        write_simulation_csv(&path, &s, &sim).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("2024-01-01,10,0,28 nm,900,8.823529,0.00980392,"));
    }

    #[test]
    fn forecast_csv_round_trips_through_ingest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.csv");
        let forecast = crate::data::generate_forecast(15.0, chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), 3).unwrap();

        write_forecast_csv(&path, &forecast).unwrap();
        assert_eq!(load_forecast(&path, None).unwrap(), forecast);
    }

    #[test]
    fn forecast_column_with_a_comma_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forecast.csv");
        let mut forecast =
            crate::data::generate_forecast(15.0, chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(), 2).unwrap();
        forecast.column = "forecast cost, usd".to_string();

        write_forecast_csv(&path, &forecast).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("date,\"forecast cost, usd\"\n"), "{text}");
        assert_eq!(load_forecast(&path, None).unwrap(), forecast);
    }

    #[test]
    fn json_export_is_valid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("series.json");
        write_json(&path, &series()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["points"][1]["price"], 12.5);
    }
}
