//! Shared "load" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! selection -> path -> fetch -> parse -> summary logging
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::path::PathBuf;
use std::sync::Arc;

use crate::data::{CsvSource, DedupLog};
use crate::domain::{
    DataSelection, DoughnutDataEntry, GovernanceDataEntry, Layer, MalformedRowPolicy, SoftwareWeight,
    doughnut_path, metric_key,
};
use crate::error::AppError;
use crate::io::{LayerConfig, ParsedCsv, parse_doughnut_csv, parse_layer_csv};

/// Where one CSV is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Relative path resolved by the configured [`CsvSource`].
    Remote(String),
    /// Local file given with `--file`.
    Local(PathBuf),
}

impl Input {
    pub fn for_selection(selection: &DataSelection, file: Option<PathBuf>) -> Result<Self, AppError> {
        match file {
            Some(path) => Ok(Input::Local(path)),
            None => Ok(Input::Remote(selection.path()?)),
        }
    }

    pub fn for_doughnut(ledger: &str, weight: SoftwareWeight, file: Option<PathBuf>) -> Self {
        match file {
            Some(path) => Input::Local(path),
            None => Input::Remote(doughnut_path(ledger, weight)),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Input::Remote(path) => path.clone(),
            Input::Local(path) => path.display().to_string(),
        }
    }
}

/// One layer's parsed CSV plus where it came from.
#[derive(Debug, Clone)]
pub struct LayerData {
    pub layer: Layer,
    pub origin: String,
    pub parsed: ParsedCsv,
}

pub struct Pipeline {
    source: Arc<dyn CsvSource>,
    policy: MalformedRowPolicy,
    dedup: DedupLog,
}

impl Pipeline {
    pub fn new(source: Arc<dyn CsvSource>, policy: MalformedRowPolicy) -> Self {
        Self {
            source,
            policy,
            dedup: DedupLog::new(),
        }
    }

    pub fn source(&self) -> Arc<dyn CsvSource> {
        Arc::clone(&self.source)
    }

    pub fn policy(&self) -> MalformedRowPolicy {
        self.policy
    }

    pub fn fetch(&self, input: &Input) -> Result<String, AppError> {
        fetch_input(self.source.as_ref(), input)
    }

    pub fn load_layer(&mut self, layer: Layer, input: &Input) -> Result<LayerData, AppError> {
        let text = self.fetch(input)?;
        let parsed = parse_layer(layer, &text, self.policy)?;
        let origin = input.describe();
        self.report_parse(layer, &origin, &parsed);
        Ok(LayerData { layer, origin, parsed })
    }

    pub fn load_governance(&mut self, input: &Input) -> Result<Vec<GovernanceDataEntry>, AppError> {
        let data = self.load_layer(Layer::Governance, input)?;
        Ok(data.parsed.rows.iter().map(GovernanceDataEntry::from_entry).collect())
    }

    pub fn load_doughnut(&mut self, input: &Input) -> Result<Vec<DoughnutDataEntry>, AppError> {
        let text = self.fetch(input)?;
        let entries = parse_doughnut_csv(&text);
        let origin = input.describe();
        tracing::info!(%origin, entries = entries.len(), "parsed doughnut csv");
        if entries.is_empty() {
            self.dedup
                .warn(&format!("{origin}:empty"), &format!("{origin} has no usable author rows"));
        }
        Ok(entries)
    }

    /// Log what a parse kept and dropped; repeated warnings are suppressed.
    pub fn report_parse(&mut self, layer: Layer, origin: &str, parsed: &ParsedCsv) {
        tracing::info!(
            %layer,
            %origin,
            rows = parsed.rows.len(),
            read = parsed.rows_read,
            malformed = parsed.malformed_rows,
            excluded = parsed.excluded_ledger_rows,
            "parsed layer csv"
        );
        if parsed.malformed_rows > 0 {
            self.dedup.warn(
                &format!("{origin}:malformed"),
                &format!("{origin}: dropped {} malformed row(s)", parsed.malformed_rows),
            );
        }
        for issue in &parsed.issues {
            self.dedup
                .warn(&format!("{origin}:{}", issue.line), &format!("{origin}: {}", issue.message));
        }
        if parsed.excluded_ledger_rows > 0 {
            tracing::debug!(%origin, rows = parsed.excluded_ledger_rows, "rows outside the ledger allow-list");
        }
    }

    /// Warn (once) if `metric` is not a column of `data`.
    pub fn check_metric(&mut self, data: &LayerData, metric: &str) -> bool {
        let key = metric_key(metric);
        let present = data.parsed.columns.contains(&key);
        if !present {
            self.dedup.warn(
                &format!("{}:{key}:missing", data.origin),
                &format!("{} has no `{metric}` column", data.origin),
            );
        }
        present
    }

    pub fn dedup(&self) -> &DedupLog {
        &self.dedup
    }
}

pub fn fetch_input(source: &dyn CsvSource, input: &Input) -> Result<String, AppError> {
    match input {
        Input::Remote(path) => source.fetch(path),
        Input::Local(path) => std::fs::read_to_string(path)
            .map_err(|e| AppError::new(2, format!("Failed to read {}: {e}", path.display()))),
    }
}

/// Parse `text` with `layer`'s published schema.
pub fn parse_layer(layer: Layer, text: &str, policy: MalformedRowPolicy) -> Result<ParsedCsv, AppError> {
    Ok(parse_layer_csv(text, &LayerConfig::for_layer(layer), policy)?)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::data::DirSource;

    const NETWORK_CSV: &str = "\
date,ledger,hhi,gini
2023-01-01,bitcoin,100,0.5
2023-02-01,bitcoin,110,0.6
2023-01-01,ethereum,999,0.1
2023-03-01,bitcoin,oops
";

    fn write(root: &Path, rel: &str, body: &str) {
        let full = root.join(rel);
        std::fs::create_dir_all(full.parent().unwrap()).unwrap();
        std::fs::write(full, body).unwrap();
    }

    fn pipeline(root: &Path, policy: MalformedRowPolicy) -> Pipeline {
        Pipeline::new(Arc::new(DirSource::new(root)), policy)
    }

    #[test]
    fn loads_a_selection_through_the_source() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "output/network/output_organizations.csv", NETWORK_CSV);

        let selection = DataSelection::default_for(Layer::Network, false);
        let input = Input::for_selection(&selection, None).unwrap();
        let mut p = pipeline(dir.path(), MalformedRowPolicy::Skip);
        let data = p.load_layer(Layer::Network, &input).unwrap();

        assert_eq!(data.origin, "output/network/output_organizations.csv");
        assert_eq!(data.parsed.rows.len(), 2);
        assert_eq!(data.parsed.excluded_ledger_rows, 1);
        assert_eq!(data.parsed.malformed_rows, 1);
        assert!(p.dedup().seen("output/network/output_organizations.csv:malformed"));
    }

    #[test]
    fn fail_policy_surfaces_as_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "net.csv", NETWORK_CSV);

        let mut p = pipeline(dir.path(), MalformedRowPolicy::Fail);
        let err = p.load_layer(Layer::Network, &Input::Remote("net.csv".into())).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn local_file_override_bypasses_the_source() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "elsewhere/authors.csv", "author,commits\nalice,10\nbob,5\n");

        let mut p = pipeline(Path::new("/nonexistent"), MalformedRowPolicy::Skip);
        let input = Input::for_doughnut("bitcoin", SoftwareWeight::Commits, Some(dir.path().join("elsewhere/authors.csv")));
        let entries = p.load_doughnut(&input).unwrap();
        assert_eq!(entries, vec![DoughnutDataEntry::new("alice", 10.0), DoughnutDataEntry::new("bob", 5.0)]);
    }

    #[test]
    fn missing_local_file_is_a_usage_error() {
        let p = pipeline(Path::new("."), MalformedRowPolicy::Skip);
        let err = p.fetch(&Input::Local(PathBuf::from("/definitely/missing.csv"))).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn missing_metric_is_reported_once() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "net.csv", NETWORK_CSV);

        let mut p = pipeline(dir.path(), MalformedRowPolicy::Skip);
        let data = p.load_layer(Layer::Network, &Input::Remote("net.csv".into())).unwrap();
        assert!(p.check_metric(&data, "hhi"));
        assert!(!p.check_metric(&data, "entropy=1"));
        assert!(!p.check_metric(&data, "entropy_1"));
        assert!(p.dedup().seen("net.csv:entropy_1:missing"));
    }

    #[test]
    fn governance_rows_keep_their_fields() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "output/governance/communities.csv",
            "date,ledger,communities,modularity\nJan-2022,bitcoin,4,\nFeb-2022,bitcoin,5,0.4\n",
        );

        let mut p = pipeline(dir.path(), MalformedRowPolicy::Skip);
        let selection = DataSelection::Governance {
            file: crate::domain::GovernanceFile::Communities,
        };
        let rows = p.load_governance(&Input::for_selection(&selection, None).unwrap()).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].communities, Some(4.0));
        assert_eq!(rows[0].modularity, None);
        assert_eq!(rows[1].modularity, Some(0.4));
    }
}
