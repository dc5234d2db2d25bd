//! Command-line parsing for the wafer cost dashboard.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the analytics code.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::TechNode;

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "wafer",
    version,
    about = "Semiconductor wafer cost intelligence: polysilicon prices, macro proxies, margin shocks"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print every dashboard view (default when no subcommand is given).
    Report(DataArgs),
    /// Shock -> die cost & margin for one node; optionally export per-date rows.
    Simulate(DataArgs),
    /// Correlation matrix plus the lagged price/copper correlation.
    Correlate(DataArgs),
    /// Monthly OHLC bars of the polysilicon/copper ratio.
    Ohlc(DataArgs),
    /// Linear attribution of the price to the macro proxies.
    Drivers(DataArgs),
    /// Write a synthetic price dataset and a matching cost forecast.
    Generate(GenerateArgs),
}

/// Data source and scenario options shared by the analysis subcommands.
#[derive(Debug, Args, Clone)]
pub struct DataArgs {
    /// Daily polysilicon price CSV (`date,price_usd_per_kg`). Prompts when omitted.
    #[arg(short = 'f', long = "prices", value_name = "CSV", env = "WAFER_PRICES")]
    pub prices: Option<PathBuf>,

    /// Optional wafer cost forecast CSV.
    #[arg(long, value_name = "CSV", env = "WAFER_FORECAST")]
    pub forecast: Option<PathBuf>,

    /// Forecast column to read (defaults to the first `*forecast*` column).
    #[arg(long)]
    pub forecast_column: Option<String>,

    /// Seed for the derived macro proxies.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Lag (days) applied to copper in the lagged correlation.
    #[arg(long, default_value_t = 180, value_parser = clap::value_parser!(u16).range(0..=365))]
    pub lag: u16,

    /// Polysilicon price shock in percent.
    #[arg(long, default_value_t = 10, allow_negative_numbers = true, value_parser = clap::value_parser!(i64).range(-30..=50))]
    pub shock: i64,

    /// Technology node.
    #[arg(long, value_enum, default_value_t = TechNode::Nm65)]
    pub node: TechNode,

    /// Render an ASCII plot in the terminal (enabled by default).
    #[arg(long, default_value_t = true)]
    pub plot: bool,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,

    /// Number of trailing monthly bars to print (0 = all).
    #[arg(long, default_value_t = 12)]
    pub months: usize,

    /// Export to CSV (per-date simulation rows, or monthly bars for `ohlc`).
    #[arg(long, value_name = "CSV")]
    pub export: Option<PathBuf>,

    /// Export the full dashboard output to JSON.
    #[arg(long = "export-json", value_name = "JSON")]
    pub export_json: Option<PathBuf>,
}

/// Options for the synthetic dataset generator.
#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    /// Output directory for `polysilicon_prices.csv` and `wafer_cost_forecast.csv`.
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// First date (YYYY-MM-DD).
    #[arg(long, default_value = "2016-01-01", value_parser = parse_day)]
    pub start: NaiveDate,

    /// Last date (YYYY-MM-DD).
    #[arg(long, default_value = "2025-12-31", value_parser = parse_day)]
    pub end: NaiveDate,

    /// Long-run price level (USD/kg).
    #[arg(long, default_value_t = 15.0)]
    pub base_price: f64,

    /// Daily log-price volatility.
    #[arg(long, default_value_t = 0.012)]
    pub vol: f64,

    /// Random seed.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Daily probability of an upward jump.
    #[arg(long, default_value_t = 0.002)]
    pub jump_prob_up: f64,

    /// Daily probability of a downward jump.
    #[arg(long, default_value_t = 0.002)]
    pub jump_prob_down: f64,

    /// Jump size in log-price units.
    #[arg(long, default_value_t = 0.12)]
    pub jump_size: f64,

    /// Forecast horizon in months.
    #[arg(long, default_value_t = 12, value_parser = clap::value_parser!(u32).range(1..=1200))]
    pub forecast_months: u32,
}

fn parse_day(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {e}"))
}
