//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between pipeline stages as plain values
//! - exported to JSON/CSV
//! - rendered by the report/plot layer without extra conversion

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Fraction of the polysilicon price that ends up as wafer material cost.
pub const MATERIAL_USAGE: f64 = 0.60;
/// Wafer yield applied on top of the material usage factor.
pub const WAFER_YIELD: f64 = 0.68;
/// Fixed average selling price per die (USD).
pub const ASP_USD: f64 = 12.0;

/// A raw `(date, price)` row as it arrives from a loader.
///
/// Parsing is deliberately deferred to the normalizer so that every input path
/// (CSV, in-memory, tests) goes through the same validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPriceRow {
    /// 1-based source line (CSV line number, or position for in-memory rows).
    pub line: usize,
    pub date: String,
    pub price: Option<String>,
}

impl RawPriceRow {
    pub fn new(line: usize, date: impl Into<String>, price: impl Into<String>) -> Self {
        Self {
            line,
            date: date.into(),
            price: Some(price.into()),
        }
    }
}

/// One normalized daily observation (USD/kg).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Chronologically ordered price series.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from points that are already in chronological order.
    ///
    /// Returns `None` if any date goes backwards.
    pub fn from_sorted(points: Vec<PricePoint>) -> Option<Self> {
        if points.windows(2).any(|w| w[1].date < w[0].date) {
            return None;
        }
        Some(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Render the series back into raw rows (ISO dates, shortest round-trip floats).
    pub fn to_raw_rows(&self) -> Vec<RawPriceRow> {
        self.points
            .iter()
            .enumerate()
            .map(|(idx, p)| RawPriceRow::new(idx + 1, p.date.format("%Y-%m-%d").to_string(), p.price.to_string()))
            .collect()
    }
}

/// Derived macro proxy series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AuxKind {
    #[serde(rename = "DXY")]
    Dxy,
    Copper,
    Gold,
    Silver,
    #[serde(rename = "VIX")]
    Vix,
    IndustrialDemand,
    #[serde(rename = "GDPGrowth")]
    GdpGrowth,
}

impl AuxKind {
    pub const ALL: [AuxKind; 7] = [
        AuxKind::Dxy,
        AuxKind::Copper,
        AuxKind::Gold,
        AuxKind::Silver,
        AuxKind::Vix,
        AuxKind::IndustrialDemand,
        AuxKind::GdpGrowth,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AuxKind::Dxy => "DXY",
            AuxKind::Copper => "Copper",
            AuxKind::Gold => "Gold",
            AuxKind::Silver => "Silver",
            AuxKind::Vix => "VIX",
            AuxKind::IndustrialDemand => "IndustrialDemand",
            AuxKind::GdpGrowth => "GDPGrowth",
        }
    }
}

/// Auxiliary series, positionally aligned with the `PriceSeries` they were derived from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuxiliarySeries {
    pub dxy: Vec<f64>,
    pub copper: Vec<f64>,
    pub gold: Vec<f64>,
    pub silver: Vec<f64>,
    pub vix: Vec<f64>,
    pub industrial_demand: Vec<f64>,
    pub gdp_growth: Vec<f64>,
}

impl AuxiliarySeries {
    pub fn get(&self, kind: AuxKind) -> &[f64] {
        match kind {
            AuxKind::Dxy => &self.dxy,
            AuxKind::Copper => &self.copper,
            AuxKind::Gold => &self.gold,
            AuxKind::Silver => &self.silver,
            AuxKind::Vix => &self.vix,
            AuxKind::IndustrialDemand => &self.industrial_demand,
            AuxKind::GdpGrowth => &self.gdp_growth,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (AuxKind, &[f64])> + '_ {
        AuxKind::ALL.into_iter().map(move |kind| (kind, self.get(kind)))
    }

    /// Common length of every column.
    pub fn len(&self) -> usize {
        self.dxy.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dxy.is_empty()
    }
}

/// Monthly open/high/low/close bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OhlcBar {
    pub year: i32,
    pub month: u32,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    /// Number of valid values that went into the bar.
    pub count: usize,
}

impl OhlcBar {
    pub fn period_label(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Calendar month key used for grouping.
pub fn month_key(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

/// Technology node with a fixed dies-per-wafer constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
pub enum TechNode {
    #[serde(rename = "65 nm")]
    #[value(name = "65nm", alias = "65 nm")]
    Nm65,
    #[serde(rename = "28 nm")]
    #[value(name = "28nm", alias = "28 nm")]
    Nm28,
    #[serde(rename = "14 nm")]
    #[value(name = "14nm", alias = "14 nm")]
    Nm14,
    #[serde(rename = "7 nm")]
    #[value(name = "7nm", alias = "7 nm")]
    Nm7,
}

impl TechNode {
    pub const ALL: [TechNode; 4] = [TechNode::Nm65, TechNode::Nm28, TechNode::Nm14, TechNode::Nm7];

    pub fn dies_per_wafer(self) -> u32 {
        match self {
            TechNode::Nm65 => 700,
            TechNode::Nm28 => 900,
            TechNode::Nm14 => 1200,
            TechNode::Nm7 => 1600,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TechNode::Nm65 => "65 nm",
            TechNode::Nm28 => "28 nm",
            TechNode::Nm14 => "14 nm",
            TechNode::Nm7 => "7 nm",
        }
    }
}

impl fmt::Display for TechNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TechNode {
    type Err = PipelineError;

    /// Accepts `"28 nm"` as well as `"28nm"` (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let compact: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        TechNode::ALL
            .into_iter()
            .find(|node| node.label().replace(' ', "").eq_ignore_ascii_case(&compact))
            .ok_or_else(|| PipelineError::UnknownNode(s.to_string()))
    }
}

/// Shock → die cost → margin output for one scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub node: TechNode,
    pub shock_pct: f64,
    pub wafer_cost: Vec<f64>,
    pub die_cost: Vec<f64>,
    pub margin_pct: Vec<f64>,
    pub mean_die_cost: f64,
    pub mean_margin_pct: f64,
}

/// Pairwise correlation matrix. `None` marks an undefined coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        self.values[i][j]
    }
}

/// One row of the forecast dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// Forecast cost series as loaded from disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    pub column: String,
    pub points: Vec<ForecastPoint>,
}

/// User-facing scenario parameters. Lag and shock are independent knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scenario {
    /// Position shift applied to Copper before correlating with price.
    pub lag_days: usize,
    /// Price shock in percent (e.g. `10.0` for +10%).
    pub shock_pct: f64,
    pub node: TechNode,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            lag_days: 180,
            shock_pct: 10.0,
            node: TechNode::Nm65,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct ScenarioConfig {
    pub prices_path: PathBuf,
    pub forecast_path: Option<PathBuf>,
    pub forecast_column: Option<String>,
    pub seed: u64,
    pub scenario: Scenario,

    /// Number of trailing monthly bars to print.
    pub ohlc_months: usize,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,

    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

/// Settings for the synthetic dataset generator.
#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Long-run price level (USD/kg) the process reverts to.
    pub base_price: f64,
    /// Daily log-price volatility.
    pub daily_vol: f64,
    /// Daily mean-reversion speed towards `ln(base_price)`.
    pub reversion: f64,
    pub jump_prob_up: f64,
    pub jump_prob_down: f64,
    /// Jump size in log-price units.
    pub jump_size: f64,
    pub seed: u64,
    /// First month of the generated forecast horizon.
    pub forecast_start: NaiveDate,
    pub forecast_months: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_labels_parse_with_or_without_space() {
        assert_eq!("28 nm".parse::<TechNode>().unwrap(), TechNode::Nm28);
        assert_eq!("7nm".parse::<TechNode>().unwrap(), TechNode::Nm7);
        assert_eq!("65 NM".parse::<TechNode>().unwrap(), TechNode::Nm65);
    }

    #[test]
    fn unknown_node_is_rejected() {
        let err = "5 nm".parse::<TechNode>().unwrap_err();
        assert_eq!(err, PipelineError::UnknownNode("5 nm".to_string()));
    }

    #[test]
    fn dies_per_wafer_table() {
        let dies: Vec<u32> = TechNode::ALL.iter().map(|n| n.dies_per_wafer()).collect();
        assert_eq!(dies, vec![700, 900, 1200, 1600]);
    }

    #[test]
    fn from_sorted_rejects_backwards_dates() {
        let d1 = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let d0 = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let points = vec![
            PricePoint { date: d1, price: 1.0 },
            PricePoint { date: d0, price: 1.0 },
        ];
        assert!(PriceSeries::from_sorted(points).is_none());
    }
}
