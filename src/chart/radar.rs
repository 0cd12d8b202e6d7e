//! Radar snapshot: one polygon per ledger, one axis per metric.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::chart::build::BACKGROUND_ALPHA;
use crate::domain::{DataEntry, Layer, ledger_color, ledger_display_name, metric_label};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarSeries {
    pub label: String,
    #[serde(skip)]
    pub ledger: String,
    /// One entry per metric axis, `None` where the ledger never reported it.
    pub values: Vec<Option<f64>>,
    /// Date each value was taken from.
    pub as_of: Vec<Option<NaiveDate>>,
    pub border_color: String,
    pub background_color: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RadarData {
    pub at: Option<NaiveDate>,
    pub axes: Vec<String>,
    pub series: Vec<RadarSeries>,
}

/// Latest value of each metric per ledger, on or before `at`.
///
/// Metrics are looked up independently: a ledger whose newest row lacks one
/// metric falls back to the most recent earlier row that has it. `at = None`
/// means "latest available". Rows without a ledger are ignored.
pub fn radar_snapshot(layer: Layer, rows: &[DataEntry], metrics: &[&str], at: Option<NaiveDate>) -> RadarData {
    let mut by_ledger: BTreeMap<&str, Vec<&DataEntry>> = BTreeMap::new();
    for row in rows.iter().filter(|r| at.is_none_or(|at| r.date <= at)) {
        if let Some(ledger) = row.ledger.as_deref() {
            by_ledger.entry(ledger).or_default().push(row);
        }
    }

    let series = by_ledger
        .into_iter()
        .map(|(ledger, mut ledger_rows)| {
            ledger_rows.sort_by_key(|r| std::cmp::Reverse(r.date));
            let (values, as_of) = metrics
                .iter()
                .map(|m| {
                    ledger_rows
                        .iter()
                        .find_map(|r| r.value(m).map(|v| (Some(v), Some(r.date))))
                        .unwrap_or((None, None))
                })
                .unzip();
            let color = ledger_color(ledger, layer);
            RadarSeries {
                label: ledger_display_name(ledger, layer),
                ledger: ledger.to_string(),
                values,
                as_of,
                border_color: color.hex(),
                background_color: color.rgba(BACKGROUND_ALPHA),
            }
        })
        .collect();

    RadarData {
        at,
        axes: metrics.iter().map(|m| metric_label(m, layer)).collect(),
        series,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn rows() -> Vec<DataEntry> {
        vec![
            DataEntry::new(d(2021, 1, 1), Some("bitcoin"))
                .with_value("hhi", Some(100.0))
                .with_value("gini", Some(0.5)),
            DataEntry::new(d(2021, 2, 1), Some("bitcoin"))
                .with_value("hhi", Some(120.0))
                .with_value("gini", None),
            DataEntry::new(d(2021, 3, 1), Some("bitcoin")).with_value("hhi", Some(130.0)),
            DataEntry::new(d(2021, 1, 1), Some("ethereum")).with_value("hhi", Some(900.0)),
            DataEntry::new(d(2021, 1, 1), None).with_value("hhi", Some(1.0)),
        ]
    }

    #[test]
    fn takes_latest_value_per_metric() {
        let radar = radar_snapshot(Layer::Consensus, &rows(), &["hhi", "gini"], None);

        assert_eq!(radar.series.len(), 2);
        let btc = &radar.series[0];
        assert_eq!(btc.label, "Bitcoin");
        assert_eq!(btc.values, vec![Some(130.0), Some(0.5)]);
        assert_eq!(btc.as_of, vec![Some(d(2021, 3, 1)), Some(d(2021, 1, 1))]);

        let eth = &radar.series[1];
        assert_eq!(eth.values, vec![Some(900.0), None]);
        assert_eq!(radar.axes.len(), 2);
    }

    #[test]
    fn respects_cut_off_date() {
        let radar = radar_snapshot(Layer::Consensus, &rows(), &["hhi"], Some(d(2021, 2, 15)));
        assert_eq!(radar.series[0].values, vec![Some(120.0)]);
        assert_eq!(radar.at, Some(d(2021, 2, 15)));

        let before_all = radar_snapshot(Layer::Consensus, &rows(), &["hhi"], Some(d(2020, 1, 1)));
        assert!(before_all.series.is_empty());
    }
}
