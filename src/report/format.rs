//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the analytics code stays clean and testable
//! - output changes are localized (important for snapshot tests)
//!
//! Each `format_*` function renders one dashboard view.

use crate::analysis::DriverFit;
use crate::app::pipeline::{BaseView, RunOutput, ScenarioView};
use crate::domain::{
    ASP_USD, AuxKind, AuxiliarySeries, CorrelationMatrix, ForecastSeries, OhlcBar, PriceSeries, ScenarioConfig,
    SimulationResult,
};
use crate::report::series_stats;

/// Format the run header (dataset + scenario).
pub fn format_run_summary(run: &RunOutput, config: &ScenarioConfig) -> String {
    let mut out = String::new();
    let series = &run.base.series;

    out.push_str("=== wafer - Semiconductor Wafer Cost Intelligence ===\n");
    out.push_str(&format!("Prices: {}\n", config.prices_path.display()));
    if let (Some(first), Some(last)) = (series.first(), series.last()) {
        out.push_str(&format!("Range: {} .. {} (n={})\n", first.date, last.date, series.len()));
    }
    out.push_str(&format!("Seed: {}\n", config.seed));
    out.push_str(&format!(
        "Scenario: lag={}d | shock={:+}% | node={} ({} dies/wafer)\n",
        config.scenario.lag_days,
        config.scenario.shock_pct,
        config.scenario.node,
        config.scenario.node.dies_per_wafer()
    ));
    out.push('\n');

    out
}

/// Every dashboard view, in tab order.
pub fn format_dashboard(run: &RunOutput, config: &ScenarioConfig) -> String {
    let base: &BaseView = &run.base;
    let scenario: &ScenarioView = &run.scenario;

    let mut out = format_run_summary(run, config);
    out.push_str(&format_price_trend(&base.series));
    out.push('\n');
    out.push_str(&format_ohlc_table(&base.ratio_ohlc, config.ohlc_months));
    out.push('\n');
    out.push_str(&format_correlations(&base.correlations));
    out.push('\n');
    out.push_str(&format_lagged(scenario));
    out.push('\n');
    out.push_str(&format_macro_cycle(&base.aux));
    out.push('\n');
    out.push_str(&format_simulation(&scenario.simulation));
    if let Some(forecast) = &base.forecast {
        out.push('\n');
        out.push_str(&format_forecast(forecast));
    }

    out
}

pub fn format_price_trend(series: &PriceSeries) -> String {
    let mut out = String::from("Polysilicon price trend (USD/kg):\n");
    match series_stats(&series.prices()) {
        Some(s) => {
            out.push_str(&format!(
                "- latest {:.2} | mean {:.2} | min {:.2} | max {:.2} | change {:+.1}%\n",
                s.last,
                s.mean,
                s.min,
                s.max,
                s.change_pct()
            ));
        }
        None => out.push_str("- no data\n"),
    }
    out
}

/// Monthly polysilicon/copper ratio bars (last `months` only; 0 = all).
pub fn format_ohlc_table(bars: &[OhlcBar], months: usize) -> String {
    let mut out = String::from("Polysilicon / Copper ratio (monthly OHLC):\n");
    out.push_str(format!("{:<8} {:>10} {:>10} {:>10} {:>10} {:>5}", "period", "open", "high", "low", "close", "n").trim_end());
    out.push('\n');
    out.push_str(format!("{:-<8} {:-<10} {:-<10} {:-<10} {:-<10} {:-<5}", "", "", "", "", "", "").trim_end());
    out.push('\n');

    let skip = if months == 0 { 0 } else { bars.len().saturating_sub(months) };
    for b in &bars[skip..] {
        out.push_str(&format!(
            "{:<8} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>5}\n",
            b.period_label(),
            b.open,
            b.high,
            b.low,
            b.close,
            b.count
        ));
    }
    out
}

/// Correlation matrix; undefined coefficients print as `n/a`.
pub fn format_correlations(matrix: &CorrelationMatrix) -> String {
    let mut out = String::from("Correlation: macro & metals:\n");

    let width = 9;
    out.push_str(&format!("{:<w$}", "", w = width + 1));
    for label in &matrix.labels {
        out.push_str(&format!(" {:>w$}", truncate(label, width), w = width));
    }
    out.push('\n');

    for (label, row) in matrix.labels.iter().zip(&matrix.values) {
        out.push_str(&format!("{:<w$} ", truncate(label, width), w = width));
        for v in row {
            out.push_str(&format!(" {:>w$}", fmt_corr(*v), w = width));
        }
        out.push('\n');
    }
    out
}

pub fn format_lagged(view: &ScenarioView) -> String {
    format!(
        "Lagged correlation (polysilicon vs copper, lag {}d): {}\n",
        view.lag_days,
        view.lagged_correlation
            .map(|r| format!("{r:.3}"))
            .unwrap_or_else(|| "undefined (not enough overlapping data)".to_string())
    )
}

/// Macro cycle indicators: VIX, industrial demand, GDP growth.
pub fn format_macro_cycle(aux: &AuxiliarySeries) -> String {
    let mut out = String::from("Macro cycle indicators:\n");
    out.push_str(format!("{:<18} {:>10} {:>10} {:>10} {:>10}", "series", "latest", "mean", "min", "max").trim_end());
    out.push('\n');
    for kind in [AuxKind::Vix, AuxKind::IndustrialDemand, AuxKind::GdpGrowth] {
        let Some(s) = series_stats(aux.get(kind)) else {
            continue;
        };
        out.push_str(&format!(
            "{:<18} {:>10.3} {:>10.3} {:>10.3} {:>10.3}\n",
            kind.label(),
            s.last,
            s.mean,
            s.min,
            s.max
        ));
    }
    out
}

pub fn format_simulation(sim: &SimulationResult) -> String {
    let mut out = String::from("Price shock -> die cost & margin:\n");
    out.push_str(&format!(
        "- node {} ({} dies/wafer) | shock {:+}% | ASP {:.2} USD\n",
        sim.node,
        sim.node.dies_per_wafer(),
        sim.shock_pct,
        ASP_USD
    ));
    out.push_str(&format!("- avg die cost (USD): {:.4}\n", sim.mean_die_cost));
    out.push_str(&format!("- gross margin (%):   {:.2}\n", sim.mean_margin_pct));
    if let Some(s) = series_stats(&sim.die_cost) {
        out.push_str(&format!("- die cost range:     {:.6} .. {:.6}\n", s.min, s.max));
    }
    out
}

pub fn format_forecast(forecast: &ForecastSeries) -> String {
    let mut out = format!("Forecast ({}):\n", forecast.column);
    let values: Vec<f64> = forecast.points.iter().map(|p| p.value).collect();
    match (series_stats(&values), forecast.points.first(), forecast.points.last()) {
        (Some(s), Some(first), Some(last)) => {
            out.push_str(&format!(
                "- {} .. {} (n={}) | first {:.4} | last {:.4} | mean {:.4}\n",
                first.date, last.date, s.n, s.first, s.last, s.mean
            ));
        }
        _ => out.push_str("- no data\n"),
    }
    out
}

/// Driver attribution table, strongest first.
pub fn format_drivers(fit: &DriverFit) -> String {
    let mut out = String::from("Price drivers (linear attribution on standardized proxies):\n");
    out.push_str(&format!(
        "- n={} | intercept {:.4} | R² {}\n",
        fit.n,
        fit.intercept,
        fit.r_squared.map(|r| format!("{r:.4}")).unwrap_or_else(|| "n/a".to_string())
    ));
    out.push_str(format!("{:<18} {:>12} {:>14}", "feature", "coef/sd", "mean |contrib|").trim_end());
    out.push('\n');
    for d in &fit.drivers {
        out.push_str(&format!(
            "{:<18} {:>12.4} {:>14.4}\n",
            d.feature.label(),
            d.coefficient,
            d.mean_abs_contribution
        ));
    }
    out
}

fn fmt_corr(v: Option<f64>) -> String {
    match v {
        Some(r) => format!("{r:.3}"),
        None => "n/a".to_string(),
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}
