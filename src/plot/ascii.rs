//! ASCII plotting for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Each dataset gets its own marker; consecutive points of a series are
//! joined with that marker, and a legend maps markers to ledger names.

use chrono::NaiveDate;

use crate::domain::ChartData;

/// Series markers, assigned in dataset order.
pub const MARKERS: [char; 8] = ['*', '+', 'o', 'x', '#', '@', '%', '&'];

/// Render every dataset of `chart` on one `width` x `height` grid.
pub fn render_chart_plot(chart: &ChartData, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (Some(&first), Some(&last)) = (chart.labels.first(), chart.labels.last()) else {
        return "Plot: (no data)\n".to_string();
    };

    let x_max = (days(first, last)).max(1.0);
    let (y_min, y_max) = match chart.y_range() {
        Some((lo, hi)) if hi > lo => (lo, hi),
        Some((lo, hi)) => (lo - 1.0, hi + 1.0),
        None => (0.0, 1.0),
    };
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    for (idx, ds) in chart.datasets.iter().enumerate() {
        let marker = MARKERS[idx % MARKERS.len()];
        let cells: Vec<(usize, usize)> = ds
            .data
            .iter()
            .map(|p| {
                (
                    map_x(days(first, p.x), x_max, width),
                    map_y(p.y, y_min, y_max, height),
                )
            })
            .collect();

        for pair in cells.windows(2) {
            let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
            draw_line(&mut grid, x0, y0, x1, y1, marker);
        }
        // Points always win over connecting lines.
        for &(x, y) in &cells {
            grid[y][x] = marker;
        }
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: dates=[{first}, {last}] | y=[{y_min:.2}, {y_max:.2}]\n"
    ));
    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }
    for (idx, ds) in chart.datasets.iter().enumerate() {
        out.push_str(&format!("{} {}\n", MARKERS[idx % MARKERS.len()], ds.label));
    }

    out
}

fn days(from: NaiveDate, to: NaiveDate) -> f64 {
    (to - from).num_days() as f64
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(x: f64, x_max: f64, width: usize) -> usize {
    let u = (x / x_max).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // y=top is max -> row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

/// Integer line drawing (Bresenham). Only blank cells are painted.
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
        if let Some(cell) = grid
            .get_mut(y0 as usize)
            .and_then(|row| row.get_mut(x0 as usize))
            .filter(|c| **c == ' ')
        {
            *cell = ch;
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
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::chart::build_chart_data;
    use crate::domain::{DataEntry, Layer};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn plot_golden_snapshot_small() {
        let rows = vec![
            DataEntry::new(d(2020, 1, 1), Some("bitcoin")).with_value("hhi", Some(0.0)),
            DataEntry::new(d(2020, 1, 11), Some("bitcoin")).with_value("hhi", Some(10.0)),
        ];
        let chart = build_chart_data("hhi", Layer::Consensus, &rows, None);

        let txt = render_chart_plot(&chart, 11, 5);
        let expected = concat!(
            "Plot: dates=[2020-01-01, 2020-01-11] | y=[-0.50, 10.50]\n",
            "         **\n",
            "       **  \n",
            "    ***    \n",
            "  **       \n",
            "**         \n",
            "* Bitcoin\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn each_dataset_gets_its_own_marker() {
        let rows = vec![
            DataEntry::new(d(2020, 1, 1), Some("bitcoin")).with_value("hhi", Some(1.0)),
            DataEntry::new(d(2020, 1, 1), Some("ethereum")).with_value("hhi", Some(2.0)),
        ];
        let chart = build_chart_data("hhi", Layer::Consensus, &rows, None);
        let txt = render_chart_plot(&chart, 20, 6);

        assert!(txt.contains('*'));
        assert!(txt.contains('+'));
        assert!(txt.ends_with("* Bitcoin\n+ Ethereum\n"));
    }

    #[test]
    fn empty_chart_renders_placeholder() {
        assert_eq!(render_chart_plot(&ChartData::default(), 40, 10), "Plot: (no data)\n");
    }
}
