//! Shared pipeline logic used by every CLI subcommand.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! load -> normalize -> ratio/OHLC -> correlation matrix -> (lagged correlation, simulation)
//!
//! The work splits in two:
//! - the base view depends only on the loaded data and the seed, and is built once
//!   per `Dashboard`
//! - the scenario view depends on lag/shock/node and is recomputed on every call

use std::cell::OnceCell;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;

use crate::analysis::{correlation_matrix, lagged_correlation, to_monthly_ohlc};
use crate::data::normalize::{normalize, ratio_series};
use crate::domain::{
    AuxKind, AuxiliarySeries, CorrelationMatrix, ForecastSeries, OhlcBar, PriceSeries, Scenario, ScenarioConfig,
    SimulationResult,
};
use crate::error::{AppError, PipelineError};
use crate::io::repository::{CsvRepository, PriceRepository};
use crate::sim::simulate;

/// Label of the price column in the correlation matrix.
pub const PRICE_LABEL: &str = "Price";

/// Parameter-independent outputs.
#[derive(Debug, Clone, Serialize)]
pub struct BaseView {
    pub series: PriceSeries,
    pub aux: AuxiliarySeries,
    /// Polysilicon / copper ratio, aligned with `series`.
    pub ratio: Vec<f64>,
    pub ratio_ohlc: Vec<OhlcBar>,
    pub correlations: CorrelationMatrix,
    pub forecast: Option<ForecastSeries>,
}

/// Outputs that depend on the scenario knobs.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioView {
    pub lag_days: usize,
    /// Price vs Copper shifted by `lag_days`. `None` when undefined.
    pub lagged_correlation: Option<f64>,
    pub simulation: SimulationResult,
}

/// All computed outputs of a single run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub base: BaseView,
    pub scenario: ScenarioView,
}

/// Pipeline bound to one data source.
///
/// The base view is memoized for the lifetime of the dashboard; scenarios are
/// never cached.
pub struct Dashboard<R> {
    repo: R,
    seed: u64,
    base: OnceCell<BaseView>,
}

impl<R: PriceRepository> Dashboard<R> {
    pub fn new(repo: R, seed: u64) -> Self {
        Self {
            repo,
            seed,
            base: OnceCell::new(),
        }
    }

    pub fn base(&self) -> Result<&BaseView, AppError> {
        if let Some(base) = self.base.get() {
            return Ok(base);
        }
        let built = build_base(&self.repo, self.seed)?;
        Ok(self.base.get_or_init(|| built))
    }

    pub fn evaluate(&self, scenario: &Scenario) -> Result<ScenarioView, AppError> {
        let base = self.base()?;
        Ok(evaluate_scenario(base, scenario)?)
    }

    pub fn into_base(self) -> Option<BaseView> {
        self.base.into_inner()
    }
}

/// Load, normalize and derive everything that does not depend on the scenario.
pub fn build_base<R: PriceRepository + ?Sized>(repo: &R, seed: u64) -> Result<BaseView, AppError> {
    let rows = repo.load_prices()?;
    let forecast = repo.load_forecast()?;

    let mut rng = StdRng::seed_from_u64(seed);
    let (series, aux) = normalize(&rows, &mut rng)?;

    let ratio = ratio_series(&series.prices(), &aux.copper);
    let ratio_ohlc = to_monthly_ohlc(&series.dates(), &ratio)?;

    let prices = series.prices();
    let mut columns: Vec<(&str, &[f64])> = vec![(PRICE_LABEL, prices.as_slice())];
    columns.extend(aux.iter().map(|(kind, col)| (kind.label(), col)));
    let correlations = correlation_matrix(&columns);

    log::info!(
        "base view ready: {} prices, {} monthly bars, forecast={}",
        series.len(),
        ratio_ohlc.len(),
        forecast.as_ref().map_or(0, |f| f.points.len())
    );

    Ok(BaseView {
        series,
        aux,
        ratio,
        ratio_ohlc,
        correlations,
        forecast,
    })
}

/// Lagged correlation (price vs Copper) and shock → margin simulation.
pub fn evaluate_scenario(base: &BaseView, scenario: &Scenario) -> Result<ScenarioView, PipelineError> {
    let prices = base.series.prices();

    let lagged = match lagged_correlation(&prices, base.aux.get(AuxKind::Copper), scenario.lag_days) {
        Ok(r) => Some(r),
        Err(err @ PipelineError::UndefinedCorrelation(_)) => {
            log::warn!("lagged correlation at lag {}: {err}", scenario.lag_days);
            None
        }
        Err(err) => return Err(err),
    };

    let simulation = simulate(&prices, scenario.shock_pct, scenario.node)?;

    Ok(ScenarioView {
        lag_days: scenario.lag_days,
        lagged_correlation: lagged,
        simulation,
    })
}

/// Build the repository described by the CLI configuration.
pub fn repository_from_config(config: &ScenarioConfig) -> CsvRepository {
    let repo = CsvRepository::new(&config.prices_path);
    match &config.forecast_path {
        Some(path) => repo.with_forecast(path, config.forecast_column.clone()),
        None => repo,
    }
}

/// Execute the full pipeline once for the configured scenario.
pub fn run_dashboard(config: &ScenarioConfig) -> Result<RunOutput, AppError> {
    run_with_repository(repository_from_config(config), config.seed, &config.scenario)
}

/// Execute the full pipeline once against any repository.
pub fn run_with_repository<R: PriceRepository>(repo: R, seed: u64, scenario: &Scenario) -> Result<RunOutput, AppError> {
    let dashboard = Dashboard::new(repo, seed);
    let scenario = dashboard.evaluate(scenario)?;
    let base = dashboard
        .into_base()
        .ok_or_else(|| AppError::new(4, "Pipeline finished without a base view."))?;
    Ok(RunOutput { base, scenario })
}
