//! CSV ingest and normalization.
//!
//! One parameterized parser serves every layer. The per-layer differences
//! (which numeric columns and which ledgers are kept, which date format is
//! accepted) live in a [`LayerConfig`] passed in by the caller.
//!
//! Design goals:
//! - **Permissive by default**: malformed rows are dropped, not fatal
//!   (see [`MalformedRowPolicy`] for the stricter modes)
//! - **Deterministic output**: rows are sorted by ledger, then date
//! - **Separation of concerns**: no charting logic here

use std::collections::HashSet;

use csv::StringRecord;

use crate::domain::{
    DataEntry, DateFormat, DoughnutDataEntry, GovernanceDataEntry, Layer, MalformedRowPolicy,
    layer_date_format, layer_metrics, ledger_ids, metric_key,
};
use crate::error::ParseError;
use crate::io::date::parse_date_as;

/// Column and ledger allow-lists for one layer's CSV schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerConfig {
    pub layer: Layer,
    /// Numeric columns to keep (raw spelling; normalized before matching).
    pub value_columns: Vec<String>,
    /// Text columns to keep verbatim.
    pub text_columns: Vec<String>,
    /// Ledger ids to keep when the file has a `ledger` column.
    pub allowed_ledgers: Vec<String>,
    pub date_format: DateFormat,
}

impl LayerConfig {
    /// The published schema for `layer`: its registry subset and metric list.
    pub fn for_layer(layer: Layer) -> Self {
        let text_columns = match layer {
            Layer::Governance => vec!["author".to_string()],
            _ => Vec::new(),
        };
        Self {
            layer,
            value_columns: layer_metrics(layer).iter().map(|m| m.column.to_string()).collect(),
            text_columns,
            allowed_ledgers: ledger_ids(layer).into_iter().map(str::to_string).collect(),
            date_format: layer_date_format(layer),
        }
    }

    pub fn with_value_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_allowed_ledgers<I, S>(mut self, ledgers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_ledgers = ledgers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_date_format(mut self, format: DateFormat) -> Self {
        self.date_format = format;
        self
    }
}

/// A row that was dropped, recorded under [`MalformedRowPolicy::Collect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowIssue {
    pub line: usize,
    pub message: String,
}

/// Parser output: sorted rows plus bookkeeping about what was dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedCsv {
    pub rows: Vec<DataEntry>,
    pub issues: Vec<RowIssue>,
    /// Data lines seen (excluding the header).
    pub rows_read: usize,
    /// Lines dropped as malformed (column-count mismatch, bad date).
    pub malformed_rows: usize,
    /// Lines dropped because their ledger is not allow-listed.
    pub excluded_ledger_rows: usize,
    /// Normalized numeric columns that were present and kept.
    pub columns: Vec<String>,
}

impl ParsedCsv {
    /// Distinct ledgers in output order.
    pub fn ledgers(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for ledger in self.rows.iter().filter_map(|r| r.ledger.as_deref()) {
            if out.last() != Some(&ledger) {
                out.push(ledger);
            }
        }
        out
    }
}

/// Parse a layer CSV into sorted [`DataEntry`] rows.
///
/// The first line is the header; `date` is required, `ledger` is optional.
/// Every other header is normalized with [`metric_key`] and kept only if it
/// is allow-listed in `config`.
pub fn parse_layer_csv(
    text: &str,
    config: &LayerConfig,
    policy: MalformedRowPolicy,
) -> Result<ParsedCsv, ParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ParseError::Csv(e.to_string()))?
        .clone();
    if headers.iter().all(str::is_empty) {
        return Err(ParseError::EmptyInput);
    }

    let keys: Vec<String> = headers.iter().map(metric_key).collect();
    let date_idx = keys
        .iter()
        .position(|k| k == "date")
        .ok_or_else(|| ParseError::MissingColumn("date".to_string()))?;
    let ledger_idx = keys.iter().position(|k| k == "ledger");

    let wanted_values: HashSet<String> = config.value_columns.iter().map(|c| metric_key(c)).collect();
    let wanted_text: HashSet<String> = config.text_columns.iter().map(|c| metric_key(c)).collect();
    let allowed: HashSet<&str> = config.allowed_ledgers.iter().map(String::as_str).collect();

    let value_cols = select_columns(&keys, &wanted_values);
    let text_cols = select_columns(&keys, &wanted_text);

    let mut out = ParsedCsv {
        columns: value_cols.iter().map(|(_, k)| k.clone()).collect(),
        ..ParsedCsv::default()
    };

    for result in reader.records() {
        out.rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line() as usize);
                out.malformed_rows += 1;
                absorb(policy, &mut out.issues, line, ParseError::Csv(e.to_string()))?;
                continue;
            }
        };
        let line = record.position().map_or(0, |p| p.line() as usize);

        if record.len() != headers.len() {
            out.malformed_rows += 1;
            let err = ParseError::MalformedRow {
                line,
                expected: headers.len(),
                found: record.len(),
            };
            absorb(policy, &mut out.issues, line, err)?;
            continue;
        }

        let ledger = match ledger_idx {
            Some(idx) => {
                let ledger = record.get(idx).unwrap_or("");
                if !allowed.contains(ledger) {
                    out.excluded_ledger_rows += 1;
                    continue;
                }
                Some(ledger)
            }
            None => None,
        };

        let date = match parse_date_as(record.get(date_idx).unwrap_or(""), config.date_format) {
            Ok(d) => d,
            Err(e) => {
                out.malformed_rows += 1;
                let err = ParseError::InvalidRowDate {
                    line,
                    source: Box::new(e),
                };
                absorb(policy, &mut out.issues, line, err)?;
                continue;
            }
        };

        out.rows.push(build_entry(&record, date, ledger, &value_cols, &text_cols));
    }

    out.rows
        .sort_by(|a, b| a.ledger.cmp(&b.ledger).then(a.date.cmp(&b.date)));

    Ok(out)
}

/// Parse a governance CSV and lift each row into a [`GovernanceDataEntry`].
pub fn parse_governance_csv(
    text: &str,
    policy: MalformedRowPolicy,
) -> Result<Vec<GovernanceDataEntry>, ParseError> {
    let parsed = parse_layer_csv(text, &LayerConfig::for_layer(Layer::Governance), policy)?;
    Ok(parsed.rows.iter().map(GovernanceDataEntry::from_entry).collect())
}

/// Parse a two-column `author,commits` CSV.
///
/// The first line is a header. Lines without exactly two columns, with an
/// empty author, or with a count that is not a finite non-negative number are
/// dropped. File order is preserved.
pub fn parse_doughnut_csv(text: &str) -> Vec<DoughnutDataEntry> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    reader
        .records()
        .filter_map(Result::ok)
        .filter(|r| r.len() == 2)
        .filter_map(|r| {
            let author = r.get(0)?;
            if author.is_empty() {
                return None;
            }
            let commits = parse_opt_f64(r.get(1))?;
            (commits >= 0.0).then(|| DoughnutDataEntry::new(author, commits))
        })
        .collect()
}

fn select_columns(keys: &[String], wanted: &HashSet<String>) -> Vec<(usize, String)> {
    keys.iter()
        .enumerate()
        .filter(|(_, k)| k.as_str() != "date" && k.as_str() != "ledger" && wanted.contains(k.as_str()))
        .map(|(idx, k)| (idx, k.clone()))
        .collect()
}

fn build_entry(
    record: &StringRecord,
    date: chrono::NaiveDate,
    ledger: Option<&str>,
    value_cols: &[(usize, String)],
    text_cols: &[(usize, String)],
) -> DataEntry {
    let mut entry = DataEntry::new(date, ledger);
    for (idx, key) in value_cols {
        entry.values.insert(key.clone(), parse_opt_f64(record.get(*idx)));
    }
    for (idx, key) in text_cols {
        if let Some(v) = record.get(*idx).filter(|v| !v.is_empty()) {
            entry.text.insert(key.clone(), v.to_string());
        }
    }
    entry
}

fn absorb(
    policy: MalformedRowPolicy,
    issues: &mut Vec<RowIssue>,
    line: usize,
    err: ParseError,
) -> Result<(), ParseError> {
    match policy {
        MalformedRowPolicy::Skip => Ok(()),
        MalformedRowPolicy::Collect => {
            issues.push(RowIssue {
                line,
                message: err.to_string(),
            });
            Ok(())
        }
        MalformedRowPolicy::Fail => Err(err),
    }
}

/// Empty, unparsable, and non-finite (`NaN`, `inf`) values all become `None`.
fn parse_opt_f64(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let v = s.parse::<f64>().ok()?;
    if v.is_finite() { Some(v) } else { None }
}
