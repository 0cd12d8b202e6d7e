//! Chart data builder: parsed rows -> one time series per ledger.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::domain::{
    ChartData, DataEntry, DateWindow, Layer, LedgerDataset, Point, ledger_color, ledger_display_name,
};

/// Alpha applied to a ledger colour for the dataset background.
pub const BACKGROUND_ALPHA: f64 = 0.2;

/// Build the chart payload for `metric` over `rows`.
///
/// 1. The window defaults to the extent of all row dates.
/// 2. Rows outside the (inclusive) window are dropped.
/// 3. Remaining rows are grouped by ledger; each group becomes one dataset of
///    date-sorted points, skipping rows whose metric is missing or non-finite.
///    Rows without a ledger contribute no dataset.
/// 4. Labels and colours come from the registry subset for `layer`.
///
/// The function is pure: identical inputs always produce identical output.
pub fn build_chart_data(
    metric: &str,
    layer: Layer,
    rows: &[DataEntry],
    window: Option<DateWindow>,
) -> ChartData {
    let Some(window) = window.or_else(|| DateWindow::extent(rows.iter().map(|r| r.date))) else {
        return ChartData::default();
    };

    let mut groups: BTreeMap<&str, Vec<Point>> = BTreeMap::new();
    let mut labels: BTreeSet<NaiveDate> = BTreeSet::new();

    for row in rows.iter().filter(|r| window.contains(r.date)) {
        let Some(ledger) = row.ledger.as_deref() else {
            continue;
        };
        labels.insert(row.date);
        let series = groups.entry(ledger).or_default();
        if let Some(y) = row.value(metric) {
            series.push(Point { x: row.date, y });
        }
    }

    let datasets = groups
        .into_iter()
        .map(|(ledger, mut data)| {
            data.sort_by_key(|p| p.x);
            let color = ledger_color(ledger, layer);
            LedgerDataset {
                label: ledger_display_name(ledger, layer),
                ledger: ledger.to_string(),
                data,
                border_color: color.hex(),
                background_color: color.rgba(BACKGROUND_ALPHA),
                fill: false,
            }
        })
        .collect();

    ChartData {
        labels: labels.into_iter().collect(),
        datasets,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn row(ledger: &str, date: NaiveDate, hhi: Option<f64>) -> DataEntry {
        DataEntry::new(date, Some(ledger)).with_value("hhi", hhi)
    }

    fn rows() -> Vec<DataEntry> {
        vec![
            row("bitcoin", d(2020, 1, 1), Some(500.0)),
            row("bitcoin", d(2020, 2, 1), Some(600.0)),
            row("bitcoin", d(2020, 3, 1), None),
            row("ethereum", d(2020, 2, 1), Some(f64::NAN)),
            row("ethereum", d(2020, 4, 1), Some(900.0)),
            row("mystery", d(2020, 1, 15), Some(1.0)),
        ]
    }

    #[test]
    fn groups_by_ledger_and_skips_missing_values() {
        let chart = build_chart_data("hhi", Layer::Consensus, &rows(), None);

        let labels: Vec<&str> = chart.datasets.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["Bitcoin", "Ethereum", "mystery"]);

        let btc = &chart.datasets[0];
        assert_eq!(
            btc.data,
            vec![Point { x: d(2020, 1, 1), y: 500.0 }, Point { x: d(2020, 2, 1), y: 600.0 }]
        );
        assert_eq!(btc.border_color, "#f7931a");
        assert_eq!(btc.background_color, "rgba(247, 147, 26, 0.2)");
        assert!(!btc.fill);

        assert_eq!(chart.datasets[1].data, vec![Point { x: d(2020, 4, 1), y: 900.0 }]);
        // Unknown ledgers still render, with the fallback colour.
        assert_eq!(chart.datasets[2].border_color, "#f7931a");

        assert_eq!(
            chart.labels,
            vec![d(2020, 1, 1), d(2020, 1, 15), d(2020, 2, 1), d(2020, 3, 1), d(2020, 4, 1)]
        );
    }

    #[test]
    fn window_is_inclusive_on_both_bounds() {
        let window = DateWindow::new(d(2020, 2, 1), d(2020, 4, 1));
        let chart = build_chart_data("hhi", Layer::Consensus, &rows(), Some(window));

        for p in chart.datasets.iter().flat_map(|d| d.data.iter()) {
            assert!(window.contains(p.x), "{:?} outside window", p.x);
        }
        assert_eq!(chart.datasets[0].data, vec![Point { x: d(2020, 2, 1), y: 600.0 }]);
        assert_eq!(chart.datasets[1].data, vec![Point { x: d(2020, 4, 1), y: 900.0 }]);
        assert_eq!(chart.labels.first(), Some(&d(2020, 2, 1)));
        assert_eq!(chart.labels.last(), Some(&d(2020, 4, 1)));
    }

    #[test]
    fn full_range_window_matches_no_window() {
        let data = rows();
        let full = DateWindow::extent(data.iter().map(|r| r.date)).unwrap();
        assert_eq!(
            build_chart_data("hhi", Layer::Consensus, &data, Some(full)),
            build_chart_data("hhi", Layer::Consensus, &data, None)
        );
    }

    #[test]
    fn is_pure() {
        let data = rows();
        let a = build_chart_data("hhi", Layer::Consensus, &data, None);
        let b = build_chart_data("hhi", Layer::Consensus, &data, None);
        assert_eq!(a, b);
    }

    #[test]
    fn sorts_points_even_for_unsorted_input() {
        let data = vec![
            row("bitcoin", d(2021, 3, 1), Some(3.0)),
            row("bitcoin", d(2021, 1, 1), Some(1.0)),
            row("bitcoin", d(2021, 2, 1), Some(2.0)),
        ];
        let chart = build_chart_data("hhi", Layer::Consensus, &data, None);
        let ys: Vec<f64> = chart.datasets[0].data.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn empty_rows_give_empty_chart() {
        assert_eq!(build_chart_data("hhi", Layer::Consensus, &[], None), ChartData::default());
    }

    #[test]
    fn fill_variant_only_touches_fill() {
        let chart = build_chart_data("hhi", Layer::Consensus, &rows(), None);
        let filled = chart.clone().with_fill(true);
        assert!(filled.datasets.iter().all(|d| d.fill));
        assert_eq!(filled.labels, chart.labels);
    }
}
