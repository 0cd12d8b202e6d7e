//! Reporting utilities: per-ledger series statistics and formatted terminal output.

use chrono::NaiveDate;

use crate::domain::{ChartData, Point};

pub mod format;

pub use format::*;

/// Summary of one plotted series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStats {
    pub label: String,
    pub points: usize,
    pub first: Option<Point>,
    pub last: Option<Point>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
}

impl SeriesStats {
    /// `last - first`, when the series has at least one point.
    pub fn change(&self) -> Option<f64> {
        Some(self.last?.y - self.first?.y)
    }

    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.first?.x, self.last?.x))
    }
}

/// Compute [`SeriesStats`] for every dataset, in dataset order.
pub fn series_stats(chart: &ChartData) -> Vec<SeriesStats> {
    chart
        .datasets
        .iter()
        .map(|ds| {
            let ys = ds.data.iter().map(|p| p.y);
            let n = ds.data.len();
            let min = ys.clone().fold(None, |acc: Option<f64>, y| Some(acc.map_or(y, |a| a.min(y))));
            let max = ys.clone().fold(None, |acc: Option<f64>, y| Some(acc.map_or(y, |a| a.max(y))));
            let mean = (n > 0).then(|| ys.sum::<f64>() / n as f64);
            SeriesStats {
                label: ds.label.clone(),
                points: n,
                first: ds.data.first().copied(),
                last: ds.data.last().copied(),
                min,
                max,
                mean,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::build_chart_data;
    use crate::domain::{DataEntry, Layer};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn stats_per_dataset() {
        let rows = vec![
            DataEntry::new(d(2020, 1, 1), Some("bitcoin")).with_value("gini", Some(0.5)),
            DataEntry::new(d(2020, 2, 1), Some("bitcoin")).with_value("gini", Some(0.9)),
            DataEntry::new(d(2020, 3, 1), Some("bitcoin")).with_value("gini", Some(0.7)),
            DataEntry::new(d(2020, 1, 1), Some("ethereum")).with_value("gini", None),
        ];
        let chart = build_chart_data("gini", Layer::Consensus, &rows, None);
        let stats = series_stats(&chart);

        assert_eq!(stats.len(), 2);
        let btc = &stats[0];
        assert_eq!(btc.points, 3);
        assert_eq!(btc.min, Some(0.5));
        assert_eq!(btc.max, Some(0.9));
        assert!((btc.mean.unwrap() - 0.7).abs() < 1e-12);
        assert!((btc.change().unwrap() - 0.2).abs() < 1e-12);
        assert_eq!(btc.span(), Some((d(2020, 1, 1), d(2020, 3, 1))));

        let eth = &stats[1];
        assert_eq!(eth.points, 0);
        assert_eq!(eth.mean, None);
        assert_eq!(eth.change(), None);
    }
}
