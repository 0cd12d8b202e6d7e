//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - resolves settings (env, `.env`, flags) into a CSV source
//! - loads and parses the selected snapshot
//! - builds the requested chart payload
//! - prints reports/plots and writes optional JSON exports

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::chart::{
    build_chart_data, doughnut_slices, dual_axis_series, pick_ledger, radar_snapshot, unify_metrics,
};
use crate::cli::{
    ChartArgs, Cli, Command, DoughnutArgs, GovernanceArgs, LedgersArgs, OutputArgs, OutputFormat, PrefsArgs,
    RadarArgs, TuiArgs,
};
use crate::config::{ENV_LOG, Settings, TUI_LOG_PATH};
use crate::domain::{DataEntry, DataSelection, DateWindow, Layer, layer_metrics, metric_key};
use crate::error::AppError;
use crate::prefs::PreferenceStore;
use crate::report::{
    format_dataset_summary, format_doughnut_table, format_dual_axis_table, format_layer_registry,
    format_preferences, format_radar_table, format_series_stats, series_stats,
};

pub mod pipeline;

use pipeline::{Input, Pipeline};

/// Entry point for the `dcharts` binary.
pub fn run() -> Result<(), AppError> {
    // `dcharts` and `dcharts -l network` behave like `dcharts tui ...`.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    let tui = matches!(cli.command, Command::Tui(_));
    init_tracing(cli.quiet, cli.verbose, tui);

    let settings = Settings::from_env().with_overrides(cli.base_url.clone(), cli.data_dir.clone());
    tracing::debug!(?settings, "resolved settings");
    let prefs = PreferenceStore::new(settings.prefs_path.clone());

    match cli.command {
        Command::Chart(args) => handle_chart(args, &settings, &prefs),
        Command::Doughnut(args) => handle_doughnut(args, &settings),
        Command::Governance(args) => handle_governance(args, &settings),
        Command::Radar(args) => handle_radar(args, &settings, &prefs),
        Command::Ledgers(args) => handle_ledgers(args),
        Command::Prefs(args) => handle_prefs(args, &prefs),
        Command::Tui(args) => handle_tui(args, &settings, prefs),
    }
}

/// Install the global subscriber. `DCHARTS_LOG` wins over `-v`/`-q`.
///
/// In TUI mode logs go to a file so they never land on the alternate screen.
fn init_tracing(quiet: bool, verbose: bool, tui: bool) {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new(level));

    if tui {
        let path = Path::new(TUI_LOG_PATH);
        // Reported before the TUI owns the terminal; afterwards stderr is hidden.
        match open_log_file(path) {
            Ok(file) => {
                let init = tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .try_init();
                if let Err(err) = init {
                    eprintln!("dcharts: logging disabled: {err}");
                }
            }
            Err(err) => eprintln!("dcharts: logging disabled, cannot open {}: {err}", path.display()),
        }
        return;
    }

    let init = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
    if let Err(err) = init {
        eprintln!("dcharts: logging disabled: {err}");
    }
}

/// Open (appending) the TUI log, creating its directory first.
fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn handle_chart(args: ChartArgs, settings: &Settings, prefs: &PreferenceStore) -> Result<(), AppError> {
    let selection = args.selection.resolve(args.layer, prefs.load().without_tor);
    let metric = resolve_metric(args.layer, args.metric.as_deref())?;
    let input = Input::for_selection(&selection, args.input.file.clone())?;

    let mut pipeline = Pipeline::new(settings.source(), args.input.malformed);
    let data = pipeline.load_layer(args.layer, &input)?;
    if !pipeline.check_metric(&data, &metric) {
        return Err(AppError::new(3, format!("{} has no `{metric}` column", data.origin)));
    }

    let extent = DateWindow::extent(data.parsed.rows.iter().map(|r| r.date));
    let window = args.window.resolve(extent);
    let chart = build_chart_data(&metric, args.layer, &data.parsed.rows, window).with_fill(args.fill);

    match args.output.format {
        OutputFormat::Text => {
            println!(
                "{}",
                format_dataset_summary(args.layer, &selection.describe(), &data.origin, &data.parsed)
            );
            print!("{}", format_series_stats(&metric, window.or(extent), &series_stats(&chart)));
        }
        OutputFormat::Ascii => {
            println!(
                "{}",
                format_dataset_summary(args.layer, &selection.describe(), &data.origin, &data.parsed)
            );
            print!(
                "{}",
                crate::plot::render_chart_plot(&chart, args.output.width, args.output.height)
            );
        }
        OutputFormat::Json => println!("{}", crate::io::to_json(&chart)?),
    }

    export(&args.output, &chart)
}

fn handle_doughnut(args: DoughnutArgs, settings: &Settings) -> Result<(), AppError> {
    let input = Input::for_doughnut(&args.ledger, args.weight, args.input.file.clone());
    let mut pipeline = Pipeline::new(settings.source(), args.input.malformed);
    let entries = pipeline.load_doughnut(&input)?;
    let slices = doughnut_slices(&entries, args.top);

    match args.output.format {
        OutputFormat::Text | OutputFormat::Ascii => {
            let title = format!("{} ({})", args.ledger, input.describe());
            print!("{}", format_doughnut_table(&title, &slices));
        }
        OutputFormat::Json => println!("{}", crate::io::to_json(&slices)?),
    }

    export(&args.output, &slices)
}

fn handle_governance(args: GovernanceArgs, settings: &Settings) -> Result<(), AppError> {
    let selection = DataSelection::Governance { file: args.gov_file };
    let input = Input::for_selection(&selection, args.input.file.clone())?;
    let mut pipeline = Pipeline::new(settings.source(), args.input.malformed);
    let rows = pipeline.load_governance(&input)?;
    let ledger = pick_ledger(&rows, args.ledger.as_deref())?;
    let ledger = ledger.as_deref();

    let extent = DateWindow::extent(
        rows.iter()
            .filter(|r| ledger.is_none_or(|l| r.ledger.as_deref() == Some(l)))
            .map(|r| r.date),
    );
    let window = args.window.resolve(extent);

    if !args.unify.is_empty() {
        let unified: Vec<DataEntry> = unify_metrics(&rows, ledger, &args.unify)
            .iter()
            .map(DataEntry::from)
            .collect();
        let chart = build_chart_data("unified_metric", Layer::Governance, &unified, window);
        match args.output.format {
            OutputFormat::Text => print!(
                "{}",
                format_series_stats("unified_metric", window.or(extent), &series_stats(&chart))
            ),
            OutputFormat::Ascii => print!(
                "{}",
                crate::plot::render_chart_plot(&chart, args.output.width, args.output.height)
            ),
            OutputFormat::Json => println!("{}", crate::io::to_json(&chart)?),
        }
        return export(&args.output, &chart);
    }

    let chart = dual_axis_series(&rows, ledger, args.left, args.right, window);
    match args.output.format {
        OutputFormat::Text | OutputFormat::Ascii => print!("{}", format_dual_axis_table(&chart)),
        OutputFormat::Json => println!("{}", crate::io::to_json(&chart)?),
    }
    export(&args.output, &chart)
}

fn handle_radar(args: RadarArgs, settings: &Settings, prefs: &PreferenceStore) -> Result<(), AppError> {
    let selection = args.selection.resolve(args.layer, prefs.load().without_tor);
    let input = Input::for_selection(&selection, args.input.file.clone())?;
    let mut pipeline = Pipeline::new(settings.source(), args.input.malformed);
    let data = pipeline.load_layer(args.layer, &input)?;

    let metrics: Vec<&str> = if args.metrics.is_empty() {
        layer_metrics(args.layer)
            .iter()
            .map(|m| m.column)
            .filter(|m| data.parsed.columns.contains(&metric_key(m)))
            .collect()
    } else {
        args.metrics.iter().map(String::as_str).collect()
    };
    for metric in &metrics {
        pipeline.check_metric(&data, metric);
    }

    let radar = radar_snapshot(args.layer, &data.parsed.rows, &metrics, args.at);
    match args.output.format {
        OutputFormat::Text | OutputFormat::Ascii => print!("{}", format_radar_table(&radar)),
        OutputFormat::Json => println!("{}", crate::io::to_json(&radar)?),
    }
    export(&args.output, &radar)
}

fn handle_ledgers(args: LedgersArgs) -> Result<(), AppError> {
    let layers: Vec<Layer> = match args.layer {
        Some(layer) => vec![layer],
        None => Layer::ALL.to_vec(),
    };
    let blocks: Vec<String> = layers.into_iter().map(format_layer_registry).collect();
    print!("{}", blocks.join("\n"));
    Ok(())
}

fn handle_prefs(args: PrefsArgs, store: &PreferenceStore) -> Result<(), AppError> {
    let prefs = if args.theme.is_some() || args.without_tor.is_some() {
        store.update(|p| {
            if let Some(theme) = args.theme {
                p.theme = theme;
            }
            if let Some(without_tor) = args.without_tor {
                p.without_tor = without_tor;
            }
        })?
    } else {
        store.load()
    };
    print!("{}", format_preferences(store.path(), &prefs));
    Ok(())
}

fn handle_tui(args: TuiArgs, settings: &Settings, prefs: PreferenceStore) -> Result<(), AppError> {
    let selection = args.selection.resolve(args.layer, prefs.load().without_tor);
    crate::tui::run(crate::tui::TuiOptions {
        selection,
        metric: args.metric,
        file: args.input.file,
        pipeline: Pipeline::new(settings.source(), args.input.malformed),
        prefs,
    })
}

/// `metric`, or the first metric `layer` publishes.
fn resolve_metric(layer: Layer, metric: Option<&str>) -> Result<String, AppError> {
    match metric {
        Some(m) => Ok(m.to_string()),
        None => layer_metrics(layer)
            .first()
            .map(|m| m.column.to_string())
            .ok_or_else(|| AppError::new(2, format!("{layer} has no default metric; pass --metric"))),
    }
}

fn export<T: Serialize>(output: &OutputArgs, payload: &T) -> Result<(), AppError> {
    if let Some(path) = &output.output {
        crate::io::write_json(path, payload)?;
        tracing::info!(path = %path.display(), "wrote chart json");
    }
    Ok(())
}

/// Rewrite argv so `dcharts` defaults to `dcharts tui`.
///
/// Rules:
/// - `dcharts`                          -> `dcharts tui`
/// - `dcharts -l network ...`           -> `dcharts tui -l network ...`
/// - `dcharts --help/--version/-h`      -> unchanged (show top-level help/version)
/// - a global flag first (`--data-dir d`) is left alone
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "chart" | "doughnut" | "governance" | "radar" | "ledgers" | "prefs" | "tui"
    );
    if is_subcommand {
        return argv;
    }

    let is_global_flag = matches!(
        arg1.as_str(),
        "--base-url" | "--data-dir" | "-v" | "--verbose" | "-q" | "--quiet"
    );
    if is_global_flag {
        return argv;
    }

    // Any other flag is a TUI flag.
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}
