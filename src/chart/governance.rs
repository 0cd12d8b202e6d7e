//! Governance adapters.
//!
//! Governance CSVs carry several named metrics per row. They are charted
//! either as a dual-Y-axis pair (e.g. communities vs modularity) or reshaped
//! into "long" rows where each metric becomes its own synthetic ledger so a
//! plain time-series chart can draw them side by side.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::chart::build::BACKGROUND_ALPHA;
use crate::domain::{DateWindow, GovernanceDataEntry, Layer, Point, ledger_color};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GovMetric {
    GiniCoefficient,
    Posts,
    Comments,
    Users,
    Communities,
    Modularity,
    Percentage,
}

impl GovMetric {
    /// Column / field name.
    pub fn key(self) -> &'static str {
        match self {
            GovMetric::GiniCoefficient => "gini_coefficient",
            GovMetric::Posts => "posts",
            GovMetric::Comments => "comments",
            GovMetric::Users => "users",
            GovMetric::Communities => "communities",
            GovMetric::Modularity => "modularity",
            GovMetric::Percentage => "percentage",
        }
    }

    /// Synthetic ledger label used by [`unify_metrics`].
    pub fn label(self) -> &'static str {
        match self {
            GovMetric::GiniCoefficient => "Gini coefficient",
            GovMetric::Posts => "Posts",
            GovMetric::Comments => "Comments",
            GovMetric::Users => "Users",
            GovMetric::Communities => "Communities",
            GovMetric::Modularity => "Modularity",
            GovMetric::Percentage => "Percentage",
        }
    }

    /// The metric's value on `row`, if present and finite.
    pub fn value(self, row: &GovernanceDataEntry) -> Option<f64> {
        let v = match self {
            GovMetric::GiniCoefficient => row.gini_coefficient,
            GovMetric::Posts => row.posts,
            GovMetric::Comments => row.comments,
            GovMetric::Users => row.users,
            GovMetric::Communities => row.communities,
            GovMetric::Modularity => row.modularity,
            GovMetric::Percentage => row.percentage,
        };
        v.filter(|v| v.is_finite())
    }
}

/// The activity metrics shown together on one unified chart.
pub const ACTIVITY_METRICS: [GovMetric; 3] = [GovMetric::Posts, GovMetric::Comments, GovMetric::Users];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Left,
    Right,
}

impl Axis {
    /// Axis identifier handed to the charting library.
    pub fn id(self) -> &'static str {
        match self {
            Axis::Left => "y-left",
            Axis::Right => "y-right",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisSeries {
    pub axis: Axis,
    #[serde(rename = "yAxisID")]
    pub axis_id: &'static str,
    pub metric: GovMetric,
    pub label: String,
    pub border_color: String,
    pub background_color: String,
    pub data: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DualAxisChart {
    /// Ledger the rows were taken from; `None` for files without a ledger column.
    pub ledger: Option<String>,
    pub labels: Vec<NaiveDate>,
    pub left: AxisSeries,
    pub right: AxisSeries,
}

/// Distinct ledgers of `rows`, sorted.
pub fn governance_ledgers(rows: &[GovernanceDataEntry]) -> Vec<&str> {
    let set: BTreeSet<&str> = rows.iter().filter_map(|r| r.ledger.as_deref()).collect();
    set.into_iter().collect()
}

/// Resolve which ledger a governance chart is drawn for.
///
/// An explicit `requested` ledger must occur in `rows`. Without one, a file
/// with a single ledger uses it and a file without a ledger column yields
/// `None`; a file with several ledgers is an error (exit 2).
pub fn pick_ledger(rows: &[GovernanceDataEntry], requested: Option<&str>) -> Result<Option<String>, AppError> {
    let ledgers = governance_ledgers(rows);
    match (requested, ledgers.as_slice()) {
        (Some(l), _) if ledgers.contains(&l) => Ok(Some(l.to_string())),
        (Some(l), _) => Err(AppError::new(
            2,
            format!("No governance rows for ledger `{l}` (available: {})", ledgers.join(", ")),
        )),
        (None, []) => Ok(None),
        (None, [only]) => Ok(Some((*only).to_string())),
        (None, _) => Err(AppError::new(
            2,
            format!("Governance file covers several ledgers ({}); pass --ledger", ledgers.join(", ")),
        )),
    }
}

fn in_ledger(row: &GovernanceDataEntry, ledger: Option<&str>) -> bool {
    ledger.is_none_or(|l| row.ledger.as_deref() == Some(l))
}

/// Split one ledger's governance rows into a left/right axis pair.
///
/// With `ledger = Some(id)` only that ledger's rows are used; `None` keeps
/// every row and is meant for files with at most one ledger (see
/// [`pick_ledger`]). A row adds a point to a series only if that series'
/// field is present and finite on the row; rows outside `window` are ignored.
pub fn dual_axis_series(
    rows: &[GovernanceDataEntry],
    ledger: Option<&str>,
    left: GovMetric,
    right: GovMetric,
    window: Option<DateWindow>,
) -> DualAxisChart {
    let in_window = |r: &&GovernanceDataEntry| window.is_none_or(|w| w.contains(r.date));

    let series = |metric: GovMetric, axis: Axis| {
        let mut data: Vec<Point> = rows
            .iter()
            .filter(|r| in_ledger(r, ledger))
            .filter(in_window)
            .filter_map(|r| metric.value(r).map(|y| Point { x: r.date, y }))
            .collect();
        data.sort_by_key(|p| p.x);
        let color = ledger_color(metric.label(), Layer::Governance);
        AxisSeries {
            axis,
            axis_id: axis.id(),
            metric,
            label: metric.label().to_string(),
            border_color: color.hex(),
            background_color: color.rgba(BACKGROUND_ALPHA),
            data,
        }
    };

    let left = series(left, Axis::Left);
    let right = series(right, Axis::Right);

    let labels: BTreeSet<NaiveDate> = left.data.iter().chain(right.data.iter()).map(|p| p.x).collect();

    DualAxisChart {
        ledger: ledger.map(str::to_string),
        labels: labels.into_iter().collect(),
        left,
        right,
    }
}

/// Reshape one ledger's wide governance rows into one row per present metric.
///
/// `ledger` filters the rows as in [`dual_axis_series`]. Each output row keeps
/// the source date, takes the metric's label as its ledger and stores the
/// value in `unified_metric`. Absent fields produce no row; explicit zeros are
/// kept.
pub fn unify_metrics(
    rows: &[GovernanceDataEntry],
    ledger: Option<&str>,
    metrics: &[GovMetric],
) -> Vec<GovernanceDataEntry> {
    rows.iter()
        .filter(|r| in_ledger(r, ledger))
        .flat_map(|row| {
            metrics.iter().filter_map(move |m| {
                m.value(row).map(|v| {
                    let mut out = GovernanceDataEntry::new(row.date, Some(m.label()));
                    out.unified_metric = Some(v);
                    out
                })
            })
        })
        .collect()
}
