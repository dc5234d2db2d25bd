//! Synthetic polysilicon dataset generation.
//!
//! Produces a daily price series and a monthly wafer material cost forecast so
//! the pipeline can run without any external data.
//!
//! Price model: mean-reverting log price with rare jumps,
//!
//! ```text
//! ln p[t+1] = ln p[t] + κ (ln p̄ − ln p[t]) + σ z + J
//! ```
//!
//! where `J` is `+jump_size`, `−jump_size` or `0` with the configured
//! probabilities.

use chrono::{Datelike, Duration, Months, NaiveDate};
use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{
    ForecastPoint, ForecastSeries, MATERIAL_USAGE, PricePoint, PriceSeries, SampleConfig, WAFER_YIELD,
};
use crate::error::AppError;

/// Column name used for the generated forecast file.
pub const FORECAST_COLUMN: &str = "forecast_wafer_cost_usd";

/// Monthly drift applied to the forecast path (+0.5% per month).
const FORECAST_MONTHLY_DRIFT: f64 = 0.005;

/// Longest forecast horizon accepted (100 years of month-starts).
pub const MAX_FORECAST_MONTHS: u32 = 1200;

/// Prices never go below this floor (USD/kg).
const MIN_PRICE: f64 = 0.5;

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            start: NaiveDate::from_ymd_opt(2016, 1, 1).unwrap_or_default(),
            end: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap_or_default(),
            base_price: 15.0,
            daily_vol: 0.012,
            reversion: 0.004,
            jump_prob_up: 0.002,
            jump_prob_down: 0.002,
            jump_size: 0.12,
            seed: 42,
            forecast_start: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap_or_default(),
            forecast_months: 12,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SampleData {
    pub prices: PriceSeries,
    pub forecast: ForecastSeries,
}

pub fn generate_sample(config: &SampleConfig) -> Result<SampleData, AppError> {
    validate(config)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let target = config.base_price.ln();
    let mut log_price = target;
    let mut points = Vec::new();
    let mut date = config.start;

    while date <= config.end {
        let price = log_price.exp().max(MIN_PRICE);
        points.push(PricePoint {
            date,
            price: round_to(price, 4),
        });

        let z = normal.sample(&mut rng);
        let jump = sample_jump(&mut rng, config.jump_prob_up, config.jump_prob_down, config.jump_size);
        log_price += config.reversion * (target - log_price) + config.daily_vol * z + jump;

        date += Duration::days(1);
    }

    let prices = PriceSeries::from_sorted(points)
        .ok_or_else(|| AppError::new(4, "Generated series is not chronological."))?;

    let last_price = prices
        .last()
        .map(|p| p.price)
        .ok_or_else(|| AppError::new(4, "Generated series is empty."))?;
    let forecast = generate_forecast(last_price, config.forecast_start, config.forecast_months)?;

    log::info!(
        "generated {} daily prices and {} forecast months (seed={})",
        prices.len(),
        forecast.points.len(),
        config.seed
    );

    Ok(SampleData { prices, forecast })
}

/// Forecast wafer material cost for `months` month-starts from `start`.
///
/// Anchored on the last observed price, converted with the same material and
/// yield factors the margin simulator uses.
pub fn generate_forecast(last_price: f64, start: NaiveDate, months: u32) -> Result<ForecastSeries, AppError> {
    if months > MAX_FORECAST_MONTHS {
        return Err(AppError::new(
            2,
            format!("Forecast horizon must be at most {MAX_FORECAST_MONTHS} months (got {months})."),
        ));
    }
    let anchor = last_price * MATERIAL_USAGE / WAFER_YIELD;
    let first = start.with_day(1).unwrap_or(start);

    let mut points = Vec::new();
    for m in 0..months {
        let date = first
            .checked_add_months(Months::new(m))
            .ok_or_else(|| AppError::new(2, "Forecast horizon overflows the calendar."))?;
        let value = anchor * (1.0 + FORECAST_MONTHLY_DRIFT).powf(f64::from(m) + 1.0);
        points.push(ForecastPoint {
            date,
            value: round_to(value, 4),
        });
    }

    Ok(ForecastSeries {
        column: FORECAST_COLUMN.to_string(),
        points,
    })
}

fn validate(config: &SampleConfig) -> Result<(), AppError> {
    if config.end < config.start {
        return Err(AppError::new(2, "Sample end date must not precede the start date."));
    }
    if !(config.base_price.is_finite() && config.base_price > 0.0) {
        return Err(AppError::new(2, "Base price must be finite and > 0."));
    }
    if !(config.daily_vol.is_finite() && config.daily_vol >= 0.0) {
        return Err(AppError::new(2, "Daily volatility must be finite and >= 0."));
    }
    if !(config.reversion.is_finite() && (0.0..=1.0).contains(&config.reversion)) {
        return Err(AppError::new(2, "Mean reversion must be within [0, 1]."));
    }
    if config.jump_prob_up < 0.0
        || config.jump_prob_down < 0.0
        || (config.jump_prob_up + config.jump_prob_down) >= 1.0
    {
        return Err(AppError::new(2, "Invalid jump probability settings."));
    }
    if !(config.jump_size.is_finite() && config.jump_size >= 0.0) {
        return Err(AppError::new(2, "Invalid jump size."));
    }
    if !(1..=MAX_FORECAST_MONTHS).contains(&config.forecast_months) {
        return Err(AppError::new(
            2,
            format!("Forecast horizon must be within 1..={MAX_FORECAST_MONTHS} months."),
        ));
    }
    Ok(())
}

fn sample_jump(rng: &mut StdRng, p_up: f64, p_down: f64, size: f64) -> f64 {
    let roll: f64 = rng.r#gen();
    if roll < p_up {
        size
    } else if roll < p_up + p_down {
        -size
    } else {
        0.0
    }
}

fn round_to(v: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (v * scale).round() / scale
}
