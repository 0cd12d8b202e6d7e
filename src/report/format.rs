//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the parsing/charting code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;

use crate::chart::{DoughnutSlice, DualAxisChart, RadarData};
use crate::domain::{DateWindow, Layer, Theme, layer_ledgers, layer_metrics};
use crate::io::ParsedCsv;
use crate::prefs::Preferences;
use crate::report::SeriesStats;

/// Header block: what was loaded and what the parser kept.
pub fn format_dataset_summary(layer: Layer, selection: &str, origin: &str, parsed: &ParsedCsv) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== dcharts - {} ===\n", layer.display_name()));
    out.push_str(&format!("Source: {origin}\n"));
    out.push_str(&format!("Options: {selection}\n"));
    out.push_str(&format!(
        "Rows: kept={} | read={} | malformed={} | excluded ledgers={}\n",
        parsed.rows.len(),
        parsed.rows_read,
        parsed.malformed_rows,
        parsed.excluded_ledger_rows
    ));
    if let Some(extent) = DateWindow::extent(parsed.rows.iter().map(|r| r.date)) {
        out.push_str(&format!("Dates: [{}, {}]\n", extent.start, extent.end));
    }
    out.push_str(&format!("Ledgers: {}\n", join_or_dash(&parsed.ledgers())));
    let columns: Vec<&str> = parsed.columns.iter().map(String::as_str).collect();
    out.push_str(&format!("Metrics: {}\n", join_or_dash(&columns)));

    for issue in &parsed.issues {
        out.push_str(&format!("  (line {}) {}\n", issue.line, issue.message));
    }

    out
}

/// Per-ledger table for one metric over `window`.
pub fn format_series_stats(metric: &str, window: Option<DateWindow>, stats: &[SeriesStats]) -> String {
    let mut out = String::new();

    match window {
        Some(w) => out.push_str(&format!("{metric} over [{}, {}]:\n", w.start, w.end)),
        None => out.push_str(&format!("{metric}:\n")),
    }

    push_row(
        &mut out,
        format!(
            "{:<20} {:>6} {:>12} {:>12} {:>12} {:>12} {:>12}",
            "ledger", "points", "first", "last", "min", "max", "change"
        ),
    );
    push_row(
        &mut out,
        format!(
            "{:-<20} {:-<6} {:-<12} {:-<12} {:-<12} {:-<12} {:-<12}",
            "", "", "", "", "", "", ""
        ),
    );

    for s in stats {
        push_row(
            &mut out,
            format!(
                "{:<20} {:>6} {:>12} {:>12} {:>12} {:>12} {:>12}",
                truncate(&s.label, 20),
                s.points,
                fmt_opt(s.first.map(|p| p.y)),
                fmt_opt(s.last.map(|p| p.y)),
                fmt_opt(s.min),
                fmt_opt(s.max),
                fmt_opt(s.change()),
            ),
        );
    }

    out
}

pub fn format_doughnut_table(title: &str, slices: &[DoughnutSlice]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{title}:\n"));

    push_row(&mut out, format!("{:<28} {:>12} {:>8}", "author", "count", "share"));
    push_row(&mut out, format!("{:-<28} {:-<12} {:-<8}", "", "", ""));
    for s in slices {
        push_row(
            &mut out,
            format!(
                "{:<28} {:>12} {:>7.1}%",
                truncate(&s.author, 28),
                fmt_value(s.commits),
                s.share
            ),
        );
    }

    out
}

/// Date-aligned table of the left and right axis series.
pub fn format_dual_axis_table(chart: &DualAxisChart) -> String {
    let left: BTreeMap<NaiveDate, f64> = chart.left.data.iter().map(|p| (p.x, p.y)).collect();
    let right: BTreeMap<NaiveDate, f64> = chart.right.data.iter().map(|p| (p.x, p.y)).collect();

    let mut out = String::new();
    push_row(
        &mut out,
        format!(
            "{:<10} {:>14} {:>14}",
            "date",
            format!("{} (L)", chart.left.label),
            format!("{} (R)", chart.right.label)
        ),
    );
    push_row(&mut out, format!("{:-<10} {:-<14} {:-<14}", "", "", ""));
    for date in &chart.labels {
        push_row(
            &mut out,
            format!(
                "{:<10} {:>14} {:>14}",
                date.to_string(),
                fmt_opt(left.get(date).copied()),
                fmt_opt(right.get(date).copied())
            ),
        );
    }

    out
}

pub fn format_radar_table(radar: &RadarData) -> String {
    let mut out = String::new();
    match radar.at {
        Some(at) => out.push_str(&format!("Snapshot as of {at}:\n")),
        None => out.push_str("Latest snapshot:\n"),
    }

    let mut header = format!("{:<20}", "ledger");
    for axis in &radar.axes {
        header.push_str(&format!(" {:>14}", truncate(axis, 14)));
    }
    push_row(&mut out, header);

    for series in &radar.series {
        let mut line = format!("{:<20}", truncate(&series.label, 20));
        for v in &series.values {
            line.push_str(&format!(" {:>14}", fmt_opt(*v)));
        }
        push_row(&mut out, line);
    }

    out
}

/// The registry subset and metric list of `layer`.
pub fn format_layer_registry(layer: Layer) -> String {
    let mut out = String::new();
    out.push_str(&format!("{} ledgers:\n", layer.display_name()));
    for l in layer_ledgers(layer) {
        push_row(
            &mut out,
            format!("  {:<18} {:<22} {}", l.id, l.display_name, l.color.hex()),
        );
    }
    out.push_str("Metrics:\n");
    for m in layer_metrics(layer) {
        push_row(&mut out, format!("  {:<24} {}", m.column, m.label));
    }
    out
}

pub fn format_preferences(path: &Path, prefs: &Preferences) -> String {
    format!(
        "Preferences ({}):\n  theme: {}\n  withoutTor: {}\n",
        path.display(),
        match prefs.theme {
            Theme::Light => "light",
            Theme::Dark => "dark",
        },
        prefs.without_tor
    )
}

fn push_row(out: &mut String, row: String) {
    out.push_str(row.trim_end());
    out.push('\n');
}

fn join_or_dash(items: &[&str]) -> String {
    if items.is_empty() {
        "-".to_string()
    } else {
        items.join(", ")
    }
}

/// Integers print without decimals; everything else with up to 4.
pub fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        format!("{v:.4}")
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), fmt_value)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::chart::{GovMetric, doughnut_slices, dual_axis_series};
    use crate::domain::{DoughnutDataEntry, GovernanceDataEntry};
    use crate::io::{LayerConfig, parse_layer_csv};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn value_formatting() {
        assert_eq!(fmt_value(42.0), "42");
        assert_eq!(fmt_value(0.12346), "0.1235");
        assert_eq!(fmt_opt(None), "-");
        assert_eq!(truncate("Bitcoin Cash Node", 8), "Bitcoin.");
    }

    #[test]
    fn dataset_summary_lists_counts_and_ledgers() {
        let csv = "date,ledger,hhi\n2021-01-01,bitcoin,1\n2021-02-01,cardano,2\n2021-03-01,mystery,3\n";
        let parsed = parse_layer_csv(
            csv,
            &LayerConfig::for_layer(Layer::Consensus),
            Default::default(),
        )
        .unwrap();

        let txt = format_dataset_summary(Layer::Consensus, "explorers=true", "x.csv", &parsed);
        assert_eq!(
            txt,
            concat!(
                "=== dcharts - Consensus ===\n",
                "Source: x.csv\n",
                "Options: explorers=true\n",
                "Rows: kept=2 | read=3 | malformed=0 | excluded ledgers=1\n",
                "Dates: [2021-01-01, 2021-02-01]\n",
                "Ledgers: bitcoin, cardano\n",
                "Metrics: hhi\n",
            )
        );
    }

    #[test]
    fn doughnut_table_shows_shares() {
        let slices = doughnut_slices(
            &[DoughnutDataEntry::new("alice", 3.0), DoughnutDataEntry::new("bob", 1.0)],
            5,
        );
        let txt = format_doughnut_table("bitcoin", &slices);
        assert!(txt.contains("alice"));
        assert!(txt.contains("75.0%"));
        assert!(txt.contains("25.0%"));
    }

    #[test]
    fn dual_axis_table_aligns_on_dates() {
        let mut a = GovernanceDataEntry::new(d(2022, 1, 1), Some("bitcoin"));
        a.communities = Some(4.0);
        let mut b = GovernanceDataEntry::new(d(2022, 2, 1), Some("bitcoin"));
        b.communities = Some(5.0);
        b.modularity = Some(0.4);
        let chart = dual_axis_series(&[a, b], Some("bitcoin"), GovMetric::Communities, GovMetric::Modularity, None);

        let txt = format_dual_axis_table(&chart);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[2].starts_with("2022-01-01"));
        assert!(lines[2].ends_with('-'));
        assert!(lines[3].ends_with("0.4000"));
    }
}
