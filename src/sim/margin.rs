//! Price shock → wafer cost → die cost → gross margin.
//!
//! ```text
//! shocked  = price × (1 + shock% / 100)
//! wafer    = shocked × 0.60 / 0.68
//! die      = wafer / dies_per_wafer(node)
//! margin % = (ASP − die) / ASP × 100        (ASP = 12.0 USD)
//! ```
//!
//! No clamping: shocks outside the usual [-30, 50] band and negative margins
//! are valid outputs.

use crate::domain::{ASP_USD, MATERIAL_USAGE, SimulationResult, TechNode, WAFER_YIELD};
use crate::error::PipelineError;

/// Run the cost/margin projection over a price series.
pub fn simulate(prices: &[f64], shock_pct: f64, node: TechNode) -> Result<SimulationResult, PipelineError> {
    if prices.is_empty() {
        return Err(PipelineError::malformed(None, "cannot simulate an empty price series"));
    }

    let dies = f64::from(node.dies_per_wafer());
    let factor = 1.0 + shock_pct / 100.0;

    let wafer_cost: Vec<f64> = prices
        .iter()
        .map(|p| p * factor * MATERIAL_USAGE / WAFER_YIELD)
        .collect();
    let die_cost: Vec<f64> = wafer_cost.iter().map(|w| w / dies).collect();
    let margin_pct: Vec<f64> = die_cost.iter().map(|d| (ASP_USD - d) / ASP_USD * 100.0).collect();

    let mean_die_cost = mean(&die_cost);
    let mean_margin_pct = mean(&margin_pct);

    log::debug!(
        "simulated node={node} shock={shock_pct:+}% over {} points: die={mean_die_cost:.6} margin={mean_margin_pct:.3}%",
        prices.len()
    );

    Ok(SimulationResult {
        node,
        shock_pct,
        wafer_cost,
        die_cost,
        margin_pct,
        mean_die_cost,
        mean_margin_pct,
    })
}

/// Same as [`simulate`], resolving the node from a label such as `"28 nm"`.
pub fn simulate_label(prices: &[f64], shock_pct: f64, node_label: &str) -> Result<SimulationResult, PipelineError> {
    let node: TechNode = node_label.parse()?;
    simulate(prices, shock_pct, node)
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn flat_series_without_shock_on_28nm() {
        let r = simulate(&[10.0, 10.0], 0.0, TechNode::Nm28).unwrap();
        assert!(close(r.wafer_cost[0], 8.8235, 1e-4));
        assert!(close(r.die_cost[0], 0.009804, 1e-6));
        assert!(close(r.margin_pct[0], 99.918, 1e-3));
        assert!(close(r.mean_die_cost, 0.009804, 1e-6));
        assert!(close(r.mean_margin_pct, 99.918, 1e-3));
    }

    #[test]
    fn ten_percent_shock_on_28nm() {
        let r = simulate(&[10.0, 10.0], 10.0, TechNode::Nm28).unwrap();
        assert!(close(r.wafer_cost[1], 9.7059, 1e-4));
        assert!(close(r.die_cost[1], 0.010784, 1e-6));
        assert!(close(r.margin_pct[1], 99.910, 1e-3));

        let base = simulate(&[10.0, 10.0], 0.0, TechNode::Nm28).unwrap();
        assert!(r.mean_margin_pct < base.mean_margin_pct);
    }

    #[test]
    fn shock_is_strictly_monotone() {
        let prices = [3.5, 10.0, 17.25, 42.0];
        for node in TechNode::ALL {
            let mut prev: Option<SimulationResult> = None;
            for shock in -30..=50 {
                let r = simulate(&prices, f64::from(shock), node).unwrap();
                if let Some(p) = &prev {
                    for i in 0..prices.len() {
                        assert!(r.die_cost[i] > p.die_cost[i], "node={node} shock={shock} i={i}");
                        assert!(r.margin_pct[i] < p.margin_pct[i], "node={node} shock={shock} i={i}");
                    }
                }
                prev = Some(r);
            }
        }
    }

    #[test]
    fn extreme_prices_give_negative_margin() {
        let r = simulate(&[20_000.0], 50.0, TechNode::Nm65).unwrap();
        assert!(r.die_cost[0] > ASP_USD);
        assert!(r.margin_pct[0] < 0.0);
    }

    #[test]
    fn node_labels_are_checked() {
        assert_eq!(
            simulate_label(&[10.0], 0.0, "5 nm").unwrap_err(),
            PipelineError::UnknownNode("5 nm".to_string())
        );
        let r = simulate_label(&[10.0], 0.0, "7 nm").unwrap();
        assert_eq!(r.node, TechNode::Nm7);
    }

    #[test]
    fn empty_series_is_rejected() {
        assert!(matches!(
            simulate(&[], 0.0, TechNode::Nm14),
            Err(PipelineError::MalformedInput { .. })
        ));
    }
}
