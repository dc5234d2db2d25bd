//! Data sources for the pipeline.
//!
//! The pipeline never touches the filesystem itself; it is handed a
//! `PriceRepository` and asks it for rows. Caching of loaded data lives in the
//! pipeline (`app::pipeline::Dashboard`), not here.

use std::path::PathBuf;

use crate::domain::{ForecastSeries, RawPriceRow};
use crate::error::AppError;
use crate::io::ingest::{load_forecast, load_price_rows};

pub trait PriceRepository {
    /// Raw daily price rows, in source order.
    fn load_prices(&self) -> Result<Vec<RawPriceRow>, AppError>;

    /// Optional forecast dataset.
    fn load_forecast(&self) -> Result<Option<ForecastSeries>, AppError> {
        Ok(None)
    }
}

/// CSV files on disk.
#[derive(Debug, Clone)]
pub struct CsvRepository {
    pub prices: PathBuf,
    pub forecast: Option<PathBuf>,
    pub forecast_column: Option<String>,
}

impl CsvRepository {
    pub fn new(prices: impl Into<PathBuf>) -> Self {
        Self {
            prices: prices.into(),
            forecast: None,
            forecast_column: None,
        }
    }

    pub fn with_forecast(mut self, path: impl Into<PathBuf>, column: Option<String>) -> Self {
        self.forecast = Some(path.into());
        self.forecast_column = column;
        self
    }
}

impl PriceRepository for CsvRepository {
    fn load_prices(&self) -> Result<Vec<RawPriceRow>, AppError> {
        load_price_rows(&self.prices)
    }

    fn load_forecast(&self) -> Result<Option<ForecastSeries>, AppError> {
        self.forecast
            .as_deref()
            .map(|path| load_forecast(path, self.forecast_column.as_deref()))
            .transpose()
    }
}

/// Rows already in memory (embedding, tests).
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    pub rows: Vec<RawPriceRow>,
    pub forecast: Option<ForecastSeries>,
}

impl InMemoryRepository {
    pub fn new(rows: Vec<RawPriceRow>) -> Self {
        Self { rows, forecast: None }
    }

    /// Build rows from `(date, price)` pairs, numbering lines from 1.
    pub fn from_pairs(pairs: &[(&str, f64)]) -> Self {
        let rows = pairs
            .iter()
            .enumerate()
            .map(|(idx, (date, price))| RawPriceRow::new(idx + 1, *date, price.to_string()))
            .collect();
        Self::new(rows)
    }
}

impl PriceRepository for InMemoryRepository {
    fn load_prices(&self) -> Result<Vec<RawPriceRow>, AppError> {
        Ok(self.rows.clone())
    }

    fn load_forecast(&self) -> Result<Option<ForecastSeries>, AppError> {
        Ok(self.forecast.clone())
    }
}

impl<R: PriceRepository + ?Sized> PriceRepository for &R {
    fn load_prices(&self) -> Result<Vec<RawPriceRow>, AppError> {
        (**self).load_prices()
    }

    fn load_forecast(&self) -> Result<Option<ForecastSeries>, AppError> {
        (**self).load_forecast()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn csv_repository_reads_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let prices = dir.path().join("prices.csv");
        let forecast = dir.path().join("forecast.csv");

        let mut f = std::fs::File::create(&prices).unwrap();
        writeln!(f, "date,price_usd_per_kg\n2024-01-01,12.5\n2024-01-02,12.75").unwrap();
        let mut f = std::fs::File::create(&forecast).unwrap();
        writeln!(f, "date,forecast_cost\n2026-01-01,9.5").unwrap();

        let repo = CsvRepository::new(&prices).with_forecast(&forecast, None);
        assert_eq!(repo.load_prices().unwrap().len(), 2);
        let fc = repo.load_forecast().unwrap().unwrap();
        assert_eq!(fc.points.len(), 1);
    }

    #[test]
    fn missing_file_is_a_usage_error() {
        let repo = CsvRepository::new("does/not/exist.csv");
        assert_eq!(repo.load_prices().unwrap_err().exit_code(), 2);
        assert!(repo.load_forecast().unwrap().is_none());
    }

    #[test]
    fn in_memory_from_pairs() {
        let repo = InMemoryRepository::from_pairs(&[("2024-01-01", 10.0), ("2024-01-02", 11.5)]);
        let rows = repo.load_prices().unwrap();
        assert_eq!(rows[1], RawPriceRow::new(2, "2024-01-02", "11.5"));
    }
}
