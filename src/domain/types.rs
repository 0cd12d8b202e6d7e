//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - built in-memory by the CSV parsers and chart builders
//! - exported to JSON for a browser charting library
//! - rendered in the terminal (ASCII plot / TUI)

use std::collections::BTreeMap;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// One decentralisation dimension, each with its own CSV schema and allow-lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    Consensus,
    Tokenomics,
    Software,
    Network,
    Geography,
    Governance,
}

impl Layer {
    pub const ALL: [Layer; 6] = [
        Layer::Consensus,
        Layer::Tokenomics,
        Layer::Software,
        Layer::Network,
        Layer::Geography,
        Layer::Governance,
    ];

    /// Path segment used in the `output/{layer}/...` scheme.
    pub fn as_str(self) -> &'static str {
        match self {
            Layer::Consensus => "consensus",
            Layer::Tokenomics => "tokenomics",
            Layer::Software => "software",
            Layer::Network => "network",
            Layer::Geography => "geography",
            Layer::Governance => "governance",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Layer::Consensus => "Consensus",
            Layer::Tokenomics => "Tokenomics",
            Layer::Software => "Software",
            Layer::Network => "Network",
            Layer::Geography => "Geography",
            Layer::Governance => "Governance",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|l| *l == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|l| *l == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl std::fmt::Display for Layer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which date formats a layer's CSV may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateFormat {
    /// `YYYY-MM-DD`
    Iso,
    /// `MMM-YYYY` (e.g. `Jan-2021`), day defaults to the 1st.
    MonthYear,
    /// Detect either of the above per value.
    Auto,
}

/// What the CSV parser does with a malformed row (column-count mismatch or
/// unparsable date).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MalformedRowPolicy {
    /// Drop the row without a trace.
    #[default]
    Skip,
    /// Drop the row but record a [`RowIssue`](crate::io::RowIssue).
    Collect,
    /// Abort parsing with the row's error.
    Fail,
}

/// Normalize a CSV header (or metric name) into the key used for storage and lookup.
///
/// Headers such as `tau=0.5` or `entropy=1` are rewritten to `tau_0.5` /
/// `entropy_1`. The same function is applied at parse time and at read time so
/// callers may use either spelling.
pub fn metric_key(name: &str) -> String {
    // Spreadsheet exports sometimes prefix the first header with a BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase().replace('=', "_")
}

/// One `(ledger, date)` observation with an open-ended set of numeric metrics.
///
/// `values` holds every allow-listed column present in the file; `None` marks
/// a value that was empty or did not parse as a finite number. `text` holds
/// allow-listed non-numeric columns (e.g. governance `author`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataEntry {
    pub date: NaiveDate,
    pub ledger: Option<String>,
    pub values: BTreeMap<String, Option<f64>>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub text: BTreeMap<String, String>,
}

impl DataEntry {
    pub fn new(date: NaiveDate, ledger: Option<&str>) -> Self {
        Self {
            date,
            ledger: ledger.map(str::to_string),
            values: BTreeMap::new(),
            text: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, metric: &str, value: Option<f64>) -> Self {
        self.values.insert(metric_key(metric), value);
        self
    }

    pub fn with_text(mut self, column: &str, value: impl Into<String>) -> Self {
        self.text.insert(metric_key(column), value.into());
        self
    }

    /// Finite value of `metric`, if present.
    pub fn value(&self, metric: &str) -> Option<f64> {
        self.values
            .get(&metric_key(metric))
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }
}

/// A single doughnut slice: an author (or entity) and its count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoughnutDataEntry {
    pub author: String,
    pub commits: f64,
}

impl DoughnutDataEntry {
    pub fn new(author: impl Into<String>, commits: f64) -> Self {
        Self {
            author: author.into(),
            commits,
        }
    }
}

/// Governance row: a sparse superset of the governance CSV fields.
///
/// Only the fields present in the source CSV are populated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GovernanceDataEntry {
    pub date: NaiveDate,
    pub ledger: Option<String>,
    pub gini_coefficient: Option<f64>,
    pub posts: Option<f64>,
    pub comments: Option<f64>,
    pub users: Option<f64>,
    pub communities: Option<f64>,
    pub modularity: Option<f64>,
    pub author: Option<String>,
    pub percentage: Option<f64>,
    pub unified_metric: Option<f64>,
}

impl GovernanceDataEntry {
    pub fn new(date: NaiveDate, ledger: Option<&str>) -> Self {
        Self {
            date,
            ledger: ledger.map(str::to_string),
            gini_coefficient: None,
            posts: None,
            comments: None,
            users: None,
            communities: None,
            modularity: None,
            author: None,
            percentage: None,
            unified_metric: None,
        }
    }

    /// Pick the governance fields out of a parsed row.
    pub fn from_entry(entry: &DataEntry) -> Self {
        Self {
            date: entry.date,
            ledger: entry.ledger.clone(),
            gini_coefficient: entry.value("gini_coefficient"),
            posts: entry.value("posts"),
            comments: entry.value("comments"),
            users: entry.value("users"),
            communities: entry.value("communities"),
            modularity: entry.value("modularity"),
            author: entry.text.get("author").cloned(),
            percentage: entry.value("percentage"),
            unified_metric: entry.value("unified_metric"),
        }
    }
}

impl From<&GovernanceDataEntry> for DataEntry {
    fn from(g: &GovernanceDataEntry) -> Self {
        let fields = [
            ("gini_coefficient", g.gini_coefficient),
            ("posts", g.posts),
            ("comments", g.comments),
            ("users", g.users),
            ("communities", g.communities),
            ("modularity", g.modularity),
            ("percentage", g.percentage),
            ("unified_metric", g.unified_metric),
        ];
        let mut entry = DataEntry::new(g.date, g.ledger.as_deref());
        for (name, value) in fields {
            if value.is_some() {
                entry.values.insert(name.to_string(), value);
            }
        }
        if let Some(author) = &g.author {
            entry.text.insert("author".to_string(), author.clone());
        }
        entry
    }
}

/// One chart point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: NaiveDate,
    pub y: f64,
}

/// One series per ledger, in the shape JS charting libraries expect.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerDataset {
    pub label: String,
    #[serde(skip)]
    pub ledger: String,
    pub data: Vec<Point>,
    pub border_color: String,
    pub background_color: String,
    pub fill: bool,
}

/// Final chart payload: distinct dates plus one dataset per ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<NaiveDate>,
    pub datasets: Vec<LedgerDataset>,
}

impl ChartData {
    /// Same data rendered as filled (area) series.
    pub fn with_fill(mut self, fill: bool) -> Self {
        for ds in &mut self.datasets {
            ds.fill = fill;
        }
        self
    }

    pub fn point_count(&self) -> usize {
        self.datasets.iter().map(|d| d.data.len()).sum()
    }

    /// `(min, max)` over every plotted y-value.
    pub fn y_range(&self) -> Option<(f64, f64)> {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for p in self.datasets.iter().flat_map(|d| d.data.iter()) {
            lo = lo.min(p.y);
            hi = hi.max(p.y);
        }
        (lo.is_finite() && hi.is_finite()).then_some((lo, hi))
    }
}

/// Inclusive `[start, end]` date range used to filter chart series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Build a window; bounds are swapped if given in reverse order.
    pub fn new(a: NaiveDate, b: NaiveDate) -> Self {
        if a <= b {
            Self { start: a, end: b }
        } else {
            Self { start: b, end: a }
        }
    }

    /// Smallest window containing every date, or `None` if there are none.
    pub fn extent<I>(dates: I) -> Option<Self>
    where
        I: IntoIterator<Item = NaiveDate>,
    {
        let mut iter = dates.into_iter();
        let first = iter.next()?;
        let (lo, hi) = iter.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
        Some(Self { start: lo, end: hi })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Clamp both bounds into `outer`.
    pub fn clamp_to(&self, outer: &DateWindow) -> DateWindow {
        let start = self.start.clamp(outer.start, outer.end);
        let end = self.end.clamp(outer.start, outer.end);
        DateWindow::new(start, end)
    }
}

/// UI theme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}
