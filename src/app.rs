//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - loads `.env` and sets up logging
//! - parses CLI arguments
//! - resolves the price dataset (flag, env var or interactive picker)
//! - runs the dashboard pipeline and prints the requested views
//! - writes optional exports

use std::fs;

use chrono::{Datelike, Months, NaiveDate};
use clap::Parser;

use crate::cli::{Command, DataArgs, GenerateArgs};
use crate::domain::{SampleConfig, Scenario, ScenarioConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `wafer` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_logging();

    // `wafer` and `wafer -f prices.csv` behave like `wafer report ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Report(args) => handle_report(&args),
        Command::Simulate(args) => handle_simulate(&args),
        Command::Correlate(args) => handle_correlate(&args),
        Command::Ohlc(args) => handle_ohlc(&args),
        Command::Drivers(args) => handle_drivers(&args),
        Command::Generate(args) => handle_generate(&args),
    }
}

fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("warn");
    // A second init (e.g. from tests) is harmless.
    let _ = env_logger::Builder::from_env(env).format_timestamp(None).try_init();
}

fn handle_report(args: &DataArgs) -> Result<(), AppError> {
    let config = config_from_args(args)?;
    let run = pipeline::run_dashboard(&config)?;

    println!("{}", crate::report::format_dashboard(&run, &config));

    if config.plot {
        let plot = crate::plot::render_series_plot(
            &run.base.series.dates(),
            &run.base.series.prices(),
            config.plot_width,
            config.plot_height,
            "polysilicon USD/kg",
        );
        println!("{plot}");

        let macro_plot = crate::plot::render_macro_cycle(
            &run.base.series.dates(),
            &run.base.aux,
            config.plot_width,
            config.plot_height,
        );
        println!("{macro_plot}");
    }

    if let Some(path) = &config.export_csv {
        crate::io::write_simulation_csv(path, &run.base.series, &run.scenario.simulation)?;
        log::info!("wrote {}", path.display());
    }
    if let Some(path) = &config.export_json {
        crate::io::write_json(path, &run)?;
        log::info!("wrote {}", path.display());
    }

    Ok(())
}

fn handle_simulate(args: &DataArgs) -> Result<(), AppError> {
    let config = config_from_args(args)?;
    let run = pipeline::run_dashboard(&config)?;

    println!("{}", crate::report::format_run_summary(&run, &config));
    println!("{}", crate::report::format_simulation(&run.scenario.simulation));

    if config.plot {
        let plot = crate::plot::render_series_plot(
            &run.base.series.dates(),
            &run.scenario.simulation.die_cost,
            config.plot_width,
            config.plot_height,
            &format!("die cost USD ({})", run.scenario.simulation.node),
        );
        println!("{plot}");
    }

    if let Some(path) = &config.export_csv {
        crate::io::write_simulation_csv(path, &run.base.series, &run.scenario.simulation)?;
    }
    if let Some(path) = &config.export_json {
        crate::io::write_json(path, &run.scenario)?;
    }

    Ok(())
}

fn handle_correlate(args: &DataArgs) -> Result<(), AppError> {
    let config = config_from_args(args)?;
    let run = pipeline::run_dashboard(&config)?;

    println!("{}", crate::report::format_correlations(&run.base.correlations));
    println!("{}", crate::report::format_lagged(&run.scenario));

    if let Some(path) = &config.export_json {
        crate::io::write_json(path, &run.base.correlations)?;
    }

    Ok(())
}

fn handle_ohlc(args: &DataArgs) -> Result<(), AppError> {
    let config = config_from_args(args)?;
    let run = pipeline::run_dashboard(&config)?;
    let bars = &run.base.ratio_ohlc;

    println!("{}", crate::report::format_ohlc_table(bars, config.ohlc_months));

    if config.plot {
        let dates: Vec<_> = run.base.series.dates();
        let plot = crate::plot::render_series_plot(
            &dates,
            &run.base.ratio,
            config.plot_width,
            config.plot_height,
            "polysilicon / copper",
        );
        println!("{plot}");
    }

    if let Some(path) = &config.export_csv {
        crate::io::write_ohlc_csv(path, bars)?;
    }
    if let Some(path) = &config.export_json {
        crate::io::write_json(path, bars)?;
    }

    Ok(())
}

fn handle_drivers(args: &DataArgs) -> Result<(), AppError> {
    let config = config_from_args(args)?;
    let dashboard = pipeline::Dashboard::new(pipeline::repository_from_config(&config), config.seed);
    let base = dashboard.base()?;

    let fit = crate::analysis::fit_price_drivers(&base.series, &base.aux)?;
    println!("{}", crate::report::format_drivers(&fit));

    if let Some(path) = &config.export_json {
        crate::io::write_json(path, &fit)?;
    }

    Ok(())
}

fn handle_generate(args: &GenerateArgs) -> Result<(), AppError> {
    let config = sample_config_from_args(args);
    let data = crate::data::generate_sample(&config)?;

    fs::create_dir_all(&args.out_dir)
        .map_err(|e| AppError::new(2, format!("Failed to create '{}': {e}", args.out_dir.display())))?;

    let prices_path = args.out_dir.join("polysilicon_prices.csv");
    let forecast_path = args.out_dir.join("wafer_cost_forecast.csv");
    crate::io::write_price_csv(&prices_path, &data.prices)?;
    crate::io::write_forecast_csv(&forecast_path, &data.forecast)?;

    println!("Wrote {} daily prices to {}", data.prices.len(), prices_path.display());
    println!("Wrote {} forecast months to {}", data.forecast.points.len(), forecast_path.display());
    Ok(())
}

/// Resolve CLI flags (and the picker, when no price file is given) into a run config.
pub fn config_from_args(args: &DataArgs) -> Result<ScenarioConfig, AppError> {
    let prices_path = match &args.prices {
        Some(path) => crate::cli::picker::validate_csv_path(path)?,
        None => crate::cli::picker::prompt_for_csv_path()?,
    };
    Ok(scenario_config(args, prices_path))
}

fn scenario_config(args: &DataArgs, prices_path: std::path::PathBuf) -> ScenarioConfig {
    ScenarioConfig {
        prices_path,
        forecast_path: args.forecast.clone(),
        forecast_column: args.forecast_column.clone(),
        seed: args.seed,
        scenario: Scenario {
            lag_days: usize::from(args.lag),
            shock_pct: args.shock as f64,
            node: args.node,
        },
        ohlc_months: args.months,
        plot: args.plot && !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        export_csv: args.export.clone(),
        export_json: args.export_json.clone(),
    }
}

pub fn sample_config_from_args(args: &GenerateArgs) -> SampleConfig {
    let defaults = SampleConfig::default();
    SampleConfig {
        start: args.start,
        end: args.end,
        base_price: args.base_price,
        daily_vol: args.vol,
        jump_prob_up: args.jump_prob_up,
        jump_prob_down: args.jump_prob_down,
        jump_size: args.jump_size,
        seed: args.seed,
        forecast_start: next_month_start(args.end),
        forecast_months: args.forecast_months,
        ..defaults
    }
}

fn next_month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1)
        .and_then(|d| d.checked_add_months(Months::new(1)))
        .unwrap_or(date)
}

/// Rewrite argv so `wafer` defaults to `wafer report`.
///
/// Rules:
/// - `wafer`                      -> `wafer report`
/// - `wafer -f prices.csv ...`    -> `wafer report -f prices.csv ...`
/// - `wafer --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("report".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "report" | "simulate" | "correlate" | "ohlc" | "drivers" | "generate"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "report flags".
    if arg1.starts_with('-') {
        argv.insert(1, "report".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::domain::TechNode;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_runs_the_report() {
        assert_eq!(rewrite_args(argv(&["wafer"])), argv(&["wafer", "report"]));
        assert_eq!(
            rewrite_args(argv(&["wafer", "-f", "p.csv"])),
            argv(&["wafer", "report", "-f", "p.csv"])
        );
        assert_eq!(rewrite_args(argv(&["wafer", "--help"])), argv(&["wafer", "--help"]));
        assert_eq!(
            rewrite_args(argv(&["wafer", "simulate", "--shock", "20"])),
            argv(&["wafer", "simulate", "--shock", "20"])
        );
    }

    #[test]
    fn flags_become_a_scenario_config() {
        let cli = Cli::try_parse_from(rewrite_args(argv(&[
            "wafer", "--lag", "30", "--shock", "-15", "--node", "14nm", "--no-plot",
        ])))
        .unwrap();
        let Command::Report(args) = cli.command else {
            panic!("expected report");
        };
        let config = scenario_config(&args, "prices.csv".into());
        assert_eq!(
            config.scenario,
            Scenario {
                lag_days: 30,
                shock_pct: -15.0,
                node: TechNode::Nm14,
            }
        );
        assert!(!config.plot);
    }

    #[test]
    fn forecast_starts_after_the_last_generated_day() {
        let cli = Cli::try_parse_from(["wafer", "generate", "--end", "2020-12-31", "--seed", "7"]).unwrap();
        let Command::Generate(args) = cli.command else {
            panic!("expected generate");
        };
        let config = sample_config_from_args(&args);
        assert_eq!(config.seed, 7);
        assert_eq!(config.forecast_start.to_string(), "2021-01-01");
        assert_eq!(config.reversion, SampleConfig::default().reversion);

        let mid = NaiveDate::from_ymd_opt(2020, 6, 15).unwrap();
        assert_eq!(next_month_start(mid).to_string(), "2020-07-01");
    }
}
