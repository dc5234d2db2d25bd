//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! The x axis is calendar days since the first date, so gaps in the data keep
//! their true width. Non-finite values break the line.

use chrono::NaiveDate;

use crate::domain::{AuxKind, AuxiliarySeries};

const LINE: char = '*';

/// Render a dated series as a line plot on a `width` x `height` grid.
pub fn render_series_plot(dates: &[NaiveDate], values: &[f64], width: usize, height: usize, label: &str) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (Some(&first), Some(&last)) = (dates.first(), dates.last()) else {
        return format!("Plot: {label} | no data\n");
    };

    let (y_min, y_max) = match y_range(values) {
        Some(range) => range,
        None => return format!("Plot: {label} | no data\n"),
    };
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let x_min = 0.0;
    let x_max = ((last - first).num_days() as f64).max(1.0);

    let mut grid = vec![vec![' '; width]; height];

    let mut prev: Option<(usize, usize)> = None;
    for (date, &v) in dates.iter().zip(values) {
        if !v.is_finite() {
            prev = None;
            continue;
        }
        let x = map_x((*date - first).num_days() as f64, x_min, x_max, width);
        let y = map_y(v, y_min, y_max, height);
        match prev {
            Some((x0, y0)) => draw_line(&mut grid, x0, y0, x, y, LINE),
            None => grid[y][x] = LINE,
        }
        prev = Some((x, y));
    }

    let mut out = String::new();
    out.push_str(&format!("Plot: {label} | {first}..{last} | y=[{y_min:.2}, {y_max:.2}]\n"));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

/// Macro cycle view: VIX, industrial demand and GDP growth over time, one
/// panel per indicator on a shared date axis.
pub fn render_macro_cycle(dates: &[NaiveDate], aux: &AuxiliarySeries, width: usize, height: usize) -> String {
    let mut out = String::new();
    for kind in [AuxKind::Vix, AuxKind::IndustrialDemand, AuxKind::GdpGrowth] {
        out.push_str(&render_series_plot(dates, aux.get(kind), width, height, kind.label()));
    }
    out
}

fn y_range(values: &[f64]) -> Option<(f64, f64)> {
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &v in values.iter().filter(|v| v.is_finite()) {
        min_y = min_y.min(v);
        max_y = max_y.max(v);
    }

    if !(min_y.is_finite() && max_y.is_finite()) {
        return None;
    }
    if max_y > min_y {
        Some((min_y, max_y))
    } else {
        // flat series: center it
        Some((min_y - 1.0, max_y + 1.0))
    }
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham-ish).
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0 && (y0 as usize) < grid.len() && x0 >= 0 && (x0 as usize) < grid[0].len() {
            grid[y0 as usize][x0 as usize] = ch;
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::domain::RawPriceRow;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let txt = render_series_plot(&[d(1), d(10)], &[100.0, 110.0], 10, 10, "price");
        let expected = concat!(
            "Plot: price | 2024-01-01..2024-01-10 | y=[99.50, 110.50]\n",
            "         *\n",
            "        * \n",
            "       *  \n",
            "      *   \n",
            "     *    \n",
            "    *     \n",
            "   *      \n",
            "  *       \n",
            " *        \n",
            "*         \n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn missing_values_break_the_line() {
        let txt = render_series_plot(&[d(1), d(5), d(10)], &[1.0, f64::NAN, 1.0], 10, 5, "flat");
        // flat series sits in the middle row; only the two endpoints are drawn
        let rows: Vec<&str> = txt.lines().skip(1).collect();
        assert_eq!(rows[2], "*        *");
        assert_eq!(txt.matches('*').count(), 2);
    }

    #[test]
    fn macro_cycle_has_one_panel_per_indicator() {
        let dates: Vec<NaiveDate> = (1..=10).map(d).collect();
        let rows: Vec<RawPriceRow> = dates
            .iter()
            .enumerate()
            .map(|(i, date)| RawPriceRow::new(i + 2, date.to_string(), format!("{}", 10 + i)))
            .collect();
        let mut rng = StdRng::seed_from_u64(42);
        let (_, aux) = crate::data::normalize(&rows, &mut rng).unwrap();

        let txt = render_macro_cycle(&dates, &aux, 20, 5);
        let headers: Vec<&str> = txt.lines().filter(|l| l.starts_with("Plot: ")).collect();
        assert_eq!(headers.len(), 3);
        assert!(headers[0].starts_with("Plot: VIX | 2024-01-01..2024-01-10"));
        assert!(headers[1].starts_with("Plot: IndustrialDemand |"));
        assert!(headers[2].starts_with("Plot: GDPGrowth |"));
        assert_eq!(txt.lines().count(), 3 * (1 + 5));
    }

    #[test]
    fn empty_input_is_reported() {
        assert_eq!(render_series_plot(&[], &[], 20, 5, "x"), "Plot: x | no data\n");
        assert_eq!(render_series_plot(&[d(1)], &[f64::NAN], 20, 5, "x"), "Plot: x | no data\n");
    }
}
