//! Command-line parsing for the decentralisation charts tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! parsing/charting code; [`crate::app`] does the dispatch.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::chart::GovMetric;
use crate::domain::{
    DataSelection, DateWindow, GovernanceFile, Layer, MalformedRowPolicy, SoftwareWeight, Theme,
    TokenomicsThreshold,
};
use crate::io::parse_date;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "dcharts",
    version,
    about = "Blockchain decentralisation charts from pre-generated CSV snapshots"
)]
pub struct Cli {
    /// Fetch CSVs from this HTTP origin (overrides DCHARTS_BASE_URL).
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Read CSVs from this directory (overrides DCHARTS_DATA_DIR and any base URL).
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// More logging (debug).
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Errors only.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Time-series chart of one metric, one series per ledger.
    Chart(ChartArgs),
    /// Top contributors of one ledger's software repository.
    Doughnut(DoughnutArgs),
    /// Governance charts: dual-axis pair or unified activity metrics.
    Governance(GovernanceArgs),
    /// Latest value of several metrics per ledger.
    Radar(RadarArgs),
    /// List the ledger registry and metrics of one or all layers.
    Ledgers(LedgersArgs),
    /// Show or change persisted preferences.
    Prefs(PrefsArgs),
    /// Launch the interactive TUI.
    Tui(TuiArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Summary and per-ledger table.
    #[default]
    Text,
    /// Summary plus a terminal plot.
    Ascii,
    /// Chart payload as JSON.
    Json,
}

/// Where to read from and how strictly to parse.
#[derive(Debug, Clone, Args)]
pub struct InputArgs {
    /// Read this local CSV instead of the selected snapshot.
    #[arg(long, value_name = "CSV")]
    pub file: Option<PathBuf>,

    /// What to do with malformed rows.
    #[arg(long, value_enum, default_value_t = MalformedRowPolicy::Skip)]
    pub malformed: MalformedRowPolicy,
}

/// Output destination and format.
#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write the JSON payload to this file (in addition to terminal output).
    #[arg(long, value_name = "JSON")]
    pub output: Option<PathBuf>,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,
}

/// Inclusive date window.
#[derive(Debug, Clone, Args)]
pub struct WindowArgs {
    /// First date to include (YYYY-MM-DD or MMM-YYYY).
    #[arg(long, value_parser = parse_cli_date)]
    pub from: Option<NaiveDate>,

    /// Last date to include (YYYY-MM-DD or MMM-YYYY).
    #[arg(long, value_parser = parse_cli_date)]
    pub to: Option<NaiveDate>,
}

impl WindowArgs {
    /// Window over `extent`, with either bound optionally overridden.
    ///
    /// Two explicit bounds are taken as given (reversed ones are swapped). A
    /// single bound never flips the window: `--from` past the end of the data
    /// (or `--to` before its start) collapses to that one day, so nothing
    /// outside the requested side can be charted.
    pub fn resolve(&self, extent: Option<DateWindow>) -> Option<DateWindow> {
        match (self.from, self.to, extent) {
            (None, None, _) => None,
            (Some(a), Some(b), _) => Some(DateWindow::new(a, b)),
            (Some(a), None, Some(e)) => Some(DateWindow::new(a, e.end.max(a))),
            (None, Some(b), Some(e)) => Some(DateWindow::new(e.start.min(b), b)),
            (Some(d), None, None) | (None, Some(d), None) => Some(DateWindow::new(d, d)),
        }
    }
}

/// Per-layer file-selection options. Each layer reads only its own flags.
#[derive(Debug, Clone, Args)]
pub struct SelectionArgs {
    /// Consensus: cluster block producers by explorer labels.
    #[arg(long, action = ArgAction::Set, default_value_t = true, value_name = "BOOL")]
    pub explorers: bool,

    /// Consensus: cluster block producers by staking keys.
    #[arg(long, action = ArgAction::Set, default_value_t = true, value_name = "BOOL")]
    pub staking_keys: bool,

    /// Tokenomics: holder threshold.
    #[arg(long, value_enum, default_value_t = TokenomicsThreshold::Top1000)]
    pub threshold: TokenomicsThreshold,

    /// Tokenomics: use the non-clustered address snapshot.
    #[arg(long)]
    pub non_clustered: bool,

    /// Software: contribution weight.
    #[arg(long, value_enum, default_value_t = SoftwareWeight::Commits)]
    pub weight: SoftwareWeight,

    /// Software: commits per sample window.
    #[arg(long, default_value_t = 100)]
    pub sample_window: u32,

    /// Network/geography: exclude Tor nodes (defaults to the saved preference).
    #[arg(long, value_name = "BOOL")]
    pub without_tor: Option<bool>,

    /// Governance: which governance file to load.
    #[arg(long, value_enum, default_value_t = GovernanceFile::Gini)]
    pub gov_file: GovernanceFile,
}

impl SelectionArgs {
    pub fn resolve(&self, layer: Layer, saved_without_tor: bool) -> DataSelection {
        let without_tor = self.without_tor.unwrap_or(saved_without_tor);
        match layer {
            Layer::Consensus => DataSelection::Consensus {
                explorers: self.explorers,
                staking_keys: self.staking_keys,
            },
            Layer::Tokenomics => DataSelection::Tokenomics {
                threshold: self.threshold,
                clustered: !self.non_clustered,
            },
            Layer::Software => DataSelection::Software {
                weight: self.weight,
                sample_window: self.sample_window,
            },
            Layer::Network => DataSelection::Network { without_tor },
            Layer::Geography => DataSelection::Geography { without_tor },
            Layer::Governance => DataSelection::Governance { file: self.gov_file },
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct ChartArgs {
    #[arg(short, long, value_enum, default_value_t = Layer::Consensus)]
    pub layer: Layer,

    /// Metric column (e.g. `hhi`, `gini`, `tau=0.66`). Defaults to the layer's first metric.
    #[arg(short, long)]
    pub metric: Option<String>,

    /// Render as filled areas.
    #[arg(long)]
    pub fill: bool,

    #[command(flatten)]
    pub selection: SelectionArgs,

    #[command(flatten)]
    pub window: WindowArgs,

    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, Args)]
pub struct DoughnutArgs {
    /// Ledger id (e.g. `bitcoin`).
    #[arg(long)]
    pub ledger: String,

    #[arg(long, value_enum, default_value_t = SoftwareWeight::Commits)]
    pub weight: SoftwareWeight,

    /// Contributors shown individually; the rest are grouped as "Others".
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, Args)]
pub struct GovernanceArgs {
    #[arg(long, value_enum, default_value_t = GovernanceFile::Communities)]
    pub gov_file: GovernanceFile,

    /// Ledger to chart (e.g. `bitcoin`). Required when the file covers several.
    #[arg(long)]
    pub ledger: Option<String>,

    /// Left-axis metric.
    #[arg(long, value_enum, default_value_t = GovMetric::Communities)]
    pub left: GovMetric,

    /// Right-axis metric.
    #[arg(long, value_enum, default_value_t = GovMetric::Modularity)]
    pub right: GovMetric,

    /// Chart these metrics as one series each instead of a dual-axis pair.
    #[arg(long, value_enum, value_delimiter = ',', num_args = 1..)]
    pub unify: Vec<GovMetric>,

    #[command(flatten)]
    pub window: WindowArgs,

    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, Args)]
pub struct RadarArgs {
    #[arg(short, long, value_enum, default_value_t = Layer::Consensus)]
    pub layer: Layer,

    /// Metric columns to include (comma-separated). Defaults to every layer metric.
    #[arg(long, value_delimiter = ',')]
    pub metrics: Vec<String>,

    /// Snapshot date: latest values on or before it.
    #[arg(long, value_parser = parse_cli_date)]
    pub at: Option<NaiveDate>,

    #[command(flatten)]
    pub selection: SelectionArgs,

    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Clone, Args)]
pub struct LedgersArgs {
    /// Only this layer.
    #[arg(short, long, value_enum)]
    pub layer: Option<Layer>,
}

#[derive(Debug, Clone, Args)]
pub struct PrefsArgs {
    #[arg(long, value_enum)]
    pub theme: Option<Theme>,

    #[arg(long, value_name = "BOOL")]
    pub without_tor: Option<bool>,
}

#[derive(Debug, Clone, Args)]
pub struct TuiArgs {
    #[arg(short, long, value_enum, default_value_t = Layer::Consensus)]
    pub layer: Layer,

    #[arg(short, long)]
    pub metric: Option<String>,

    #[command(flatten)]
    pub selection: SelectionArgs,

    #[command(flatten)]
    pub input: InputArgs,
}

fn parse_cli_date(s: &str) -> Result<NaiveDate, String> {
    parse_date(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn chart_flags_resolve_to_a_selection() {
        let cli = Cli::try_parse_from([
            "dcharts",
            "chart",
            "--layer",
            "consensus",
            "--explorers",
            "false",
            "--from",
            "Jan-2020",
            "--format",
            "json",
        ])
        .unwrap();
        let Command::Chart(args) = cli.command else {
            panic!("expected chart");
        };
        assert_eq!(
            args.selection.resolve(args.layer, false),
            DataSelection::Consensus {
                explorers: false,
                staking_keys: true
            }
        );
        assert_eq!(args.window.from, Some(d(2020, 1, 1)));
        assert_eq!(args.output.format, OutputFormat::Json);
    }

    #[test]
    fn without_tor_falls_back_to_saved_preference() {
        let cli = Cli::try_parse_from(["dcharts", "tui", "--layer", "network"]).unwrap();
        let Command::Tui(args) = cli.command else {
            panic!("expected tui");
        };
        assert_eq!(
            args.selection.resolve(Layer::Network, true),
            DataSelection::Network { without_tor: true }
        );

        let cli = Cli::try_parse_from(["dcharts", "tui", "--layer", "network", "--without-tor", "false"]).unwrap();
        let Command::Tui(args) = cli.command else {
            panic!("expected tui");
        };
        assert_eq!(
            args.selection.resolve(Layer::Network, true),
            DataSelection::Network { without_tor: false }
        );
    }

    #[test]
    fn bad_dates_are_rejected_at_parse_time() {
        let err = Cli::try_parse_from(["dcharts", "chart", "--from", "Foo-2020"]).unwrap_err();
        assert!(err.to_string().contains("Foo"));
    }

    #[test]
    fn window_args_fill_missing_bounds_from_extent() {
        let extent = DateWindow::new(d(2020, 1, 1), d(2020, 12, 1));
        let only_from = WindowArgs {
            from: Some(d(2020, 6, 1)),
            to: None,
        };
        assert_eq!(only_from.resolve(Some(extent)), Some(DateWindow::new(d(2020, 6, 1), d(2020, 12, 1))));

        let none = WindowArgs { from: None, to: None };
        assert_eq!(none.resolve(Some(extent)), None);
    }

    #[test]
    fn one_sided_bound_outside_the_data_never_flips_the_window() {
        use crate::chart::build_chart_data;
        use crate::domain::DataEntry;

        let rows: Vec<DataEntry> = (1..=6)
            .map(|m| DataEntry::new(d(2020, m, 1), Some("bitcoin")).with_value("hhi", Some(f64::from(m))))
            .collect();
        let extent = DateWindow::extent(rows.iter().map(|r| r.date));

        let late = WindowArgs {
            from: Some(d(2021, 1, 1)),
            to: None,
        };
        let window = late.resolve(extent);
        assert_eq!(window, Some(DateWindow::new(d(2021, 1, 1), d(2021, 1, 1))));
        let chart = build_chart_data("hhi", Layer::Consensus, &rows, window);
        assert_eq!(chart.point_count(), 0);

        let early = WindowArgs {
            from: None,
            to: Some(d(2019, 1, 1)),
        };
        let window = early.resolve(extent);
        assert_eq!(window, Some(DateWindow::new(d(2019, 1, 1), d(2019, 1, 1))));
        assert_eq!(build_chart_data("hhi", Layer::Consensus, &rows, window).point_count(), 0);
    }

    #[test]
    fn unify_takes_a_list() {
        let cli = Cli::try_parse_from(["dcharts", "governance", "--unify", "posts,comments,users"]).unwrap();
        let Command::Governance(args) = cli.command else {
            panic!("expected governance");
        };
        assert_eq!(args.unify, vec![GovMetric::Posts, GovMetric::Comments, GovMetric::Users]);
        assert_eq!(args.ledger, None);

        let cli = Cli::try_parse_from(["dcharts", "governance", "--ledger", "cardano"]).unwrap();
        let Command::Governance(args) = cli.command else {
            panic!("expected governance");
        };
        assert_eq!(args.ledger.as_deref(), Some("cardano"));
    }
}
