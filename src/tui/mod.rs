//! Ratatui-based terminal UI.
//!
//! One interactive time-series chart for a layer: slider handles narrow the
//! date window, the metric and layer can be cycled, and the "without Tor" and
//! theme toggles are persisted. Fetches run on a background thread; each one
//! carries a request token and responses for superseded tokens are dropped.

use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use plotters::style::RGBColor;
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::app::pipeline::{Input, Pipeline, fetch_input, parse_layer};
use crate::chart::RangeWindow;
use crate::data::{Latest, RequestToken, RequestTracker};
use crate::domain::{DataSelection, Layer, MalformedRowPolicy, Theme, layer_metrics, metric_key};
use crate::error::AppError;
use crate::io::ParsedCsv;
use crate::prefs::{PreferenceStore, Preferences};

mod plotters_chart;

pub use plotters_chart::{LedgerPlottersChart, PlotSeries, date_to_x, x_to_date};

/// Everything the TUI needs from the command line.
pub struct TuiOptions {
    pub selection: DataSelection,
    pub metric: Option<String>,
    pub file: Option<PathBuf>,
    pub pipeline: Pipeline,
    pub prefs: PreferenceStore,
}

/// Start the TUI.
pub fn run(opts: TuiOptions) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(opts);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// A finished background fetch.
#[derive(Debug)]
struct Fetched {
    token: RequestToken,
    selection: DataSelection,
    origin: String,
    result: Result<ParsedCsv, AppError>,
}

struct App {
    pipeline: Pipeline,
    prefs_store: PreferenceStore,
    prefs: Preferences,
    selection: DataSelection,
    /// Column keys of the current layer's metrics.
    metrics: Vec<&'static str>,
    metric_idx: usize,
    window: RangeWindow,
    fill: bool,
    /// `--file` override; kept for reloads, dropped once the selection changes.
    file: Option<PathBuf>,
    tracker: RequestTracker,
    latest: Latest<Fetched>,
    tx: Sender<Fetched>,
    rx: Receiver<Fetched>,
    loading: bool,
    source_label: String,
    status: String,
}

impl App {
    fn new(opts: TuiOptions) -> Self {
        let prefs = opts.prefs.load();
        let selection = opts.selection.with_without_tor(prefs.without_tor);
        let metrics = metric_columns(selection.layer());
        let metric_idx = opts
            .metric
            .as_deref()
            .and_then(|m| metrics.iter().position(|c| metric_key(c) == metric_key(m)))
            .unwrap_or(0);

        let tracker = RequestTracker::new();
        let (tx, rx) = mpsc::channel();
        let source_label = opts.pipeline.source().describe();

        let mut app = Self {
            pipeline: opts.pipeline,
            prefs_store: opts.prefs,
            prefs,
            selection,
            metrics,
            metric_idx,
            window: RangeWindow::new(),
            fill: false,
            file: opts.file,
            latest: Latest::new(tracker.clone()),
            tracker,
            tx,
            rx,
            loading: false,
            source_label,
            status: String::new(),
        };

        app.reload();
        app
    }

    fn layer(&self) -> Layer {
        self.selection.layer()
    }

    fn metric(&self) -> &'static str {
        self.metrics.get(self.metric_idx).copied().unwrap_or("hhi")
    }

    /// Issue a new request; any in-flight one becomes stale.
    fn start_fetch(&mut self, input: Input) {
        let token = self.tracker.begin();
        let source = self.pipeline.source();
        let policy: MalformedRowPolicy = self.pipeline.policy();
        let layer = self.layer();
        let selection = self.selection;
        let tx = self.tx.clone();
        let origin = input.describe();

        tracing::info!(generation = token.generation(), %origin, "starting fetch");
        self.loading = true;
        self.status = format!("Loading {origin}...");

        std::thread::spawn(move || {
            let result = fetch_input(source.as_ref(), &input).and_then(|text| parse_layer(layer, &text, policy));
            // The receiver is gone only when the UI has exited.
            let _ = tx.send(Fetched {
                token,
                selection,
                origin,
                result,
            });
        });
    }

    fn input(&self) -> Result<Input, AppError> {
        Input::for_selection(&self.selection, self.file.clone())
    }

    /// Fetch the current input again, local file included.
    fn reload(&mut self) {
        match self.input() {
            Ok(input) => self.start_fetch(input),
            Err(err) => self.status = err.to_string(),
        }
    }

    /// Fetch after the selection changed. A local file belongs to the old
    /// selection, so the override is dropped.
    fn refetch(&mut self) {
        let dropped = self.file.take();
        self.reload();
        if let Some(path) = dropped {
            tracing::info!(path = %path.display(), "dropping --file override");
            self.status = format!("{} (--file {} dropped)", self.status, path.display());
        }
    }

    /// Drain finished fetches. Returns `true` if anything changed on screen.
    fn poll_fetches(&mut self) -> bool {
        let mut changed = false;
        while let Ok(msg) = self.rx.try_recv() {
            let token = msg.token;
            if !self.latest.accept(token, msg) {
                continue;
            }
            if let Some(msg) = self.latest.take() {
                self.apply_fetch(msg);
                changed = true;
            }
        }
        changed
    }

    fn apply_fetch(&mut self, msg: Fetched) {
        self.loading = false;
        match msg.result {
            Ok(parsed) => {
                let layer = msg.selection.layer();
                self.pipeline.report_parse(layer, &msg.origin, &parsed);
                let metric = self.metric();
                if self.window.load(layer, metric, parsed.rows) {
                    self.status = format!("Loaded {}", msg.origin);
                } else {
                    self.status = format!("No rows in {}", msg.origin);
                }
            }
            Err(err) => {
                tracing::warn!(origin = %msg.origin, error = %err, "fetch failed");
                self.window.clear();
                self.status = format!("Load failed: {err}");
            }
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if self.poll_fetches() {
                needs_redraw = true;
            }

            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Left => {
                self.window.step_start(-1);
            }
            KeyCode::Right => {
                self.window.step_start(1);
            }
            KeyCode::Char(',') => {
                self.window.step_end(-1);
            }
            KeyCode::Char('.') => {
                self.window.step_end(1);
            }
            KeyCode::Char('0') => {
                self.window.reset_window();
                self.status = "Window reset.".to_string();
            }
            KeyCode::Up => self.cycle_metric(-1),
            KeyCode::Down => self.cycle_metric(1),
            KeyCode::Tab => self.switch_layer(self.layer().next()),
            KeyCode::BackTab => self.switch_layer(self.layer().prev()),
            KeyCode::Char('o') => self.toggle_without_tor(),
            KeyCode::Char('t') => self.toggle_theme(),
            KeyCode::Char('f') => {
                self.fill = !self.fill;
            }
            KeyCode::Char('r') => self.reload(),
            _ => {}
        }
        false
    }

    fn cycle_metric(&mut self, delta: isize) {
        if self.metrics.is_empty() {
            return;
        }
        let n = self.metrics.len() as isize;
        self.metric_idx = (self.metric_idx as isize + delta).rem_euclid(n) as usize;
        let metric = self.metric();
        self.window.set_metric(metric);
        self.status = format!("metric: {}", crate::domain::metric_label(metric, self.layer()));
    }

    fn switch_layer(&mut self, layer: Layer) {
        self.selection = DataSelection::default_for(layer, self.prefs.without_tor);
        self.metrics = metric_columns(layer);
        self.metric_idx = 0;
        self.window.clear();
        self.refetch();
    }

    fn toggle_without_tor(&mut self) {
        let without_tor = !self.prefs.without_tor;
        self.prefs.without_tor = without_tor;
        self.persist_prefs();

        let next = self.selection.with_without_tor(without_tor);
        if next != self.selection {
            self.selection = next;
            self.refetch();
        } else {
            self.status = format!("withoutTor={without_tor} (no Tor variant for this layer)");
        }
    }

    fn toggle_theme(&mut self) {
        self.prefs.theme = self.prefs.theme.toggled();
        self.persist_prefs();
        self.status = format!("theme: {:?}", self.prefs.theme).to_lowercase();
    }

    fn persist_prefs(&mut self) {
        if let Err(err) = self.prefs_store.save(&self.prefs) {
            tracing::warn!(error = %err, "could not save preferences");
            self.status = format!("Could not save preferences: {err}");
        }
    }

    fn palette(&self) -> (Color, Color, RGBColor) {
        match self.prefs.theme {
            Theme::Dark => (Color::Black, Color::White, RGBColor(255, 255, 255)),
            Theme::Light => (Color::White, Color::Black, RGBColor(0, 0, 0)),
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let (bg, fg, _) = self.palette();
        frame.render_widget(Block::default().style(Style::default().bg(bg).fg(fg)), size);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_chart(frame, chunks[1]);
        self.draw_slider(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let layer = self.layer();
        let window = self
            .window
            .window()
            .map_or_else(|| "-".to_string(), |w| format!("[{}, {}]", w.start, w.end));

        let lines = vec![
            Line::from(vec![
                Span::styled("dcharts", Style::default().fg(Color::Cyan)),
                Span::raw(format!(" - {} | {}", layer.display_name(), self.source_label)),
            ]),
            Line::from(Span::styled(
                format!(
                    "{} | metric: {} | window: {window} | theme: {:?} | withoutTor: {}",
                    self.selection.describe(),
                    crate::domain::metric_label(self.metric(), layer),
                    self.prefs.theme,
                    self.prefs.without_tor,
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let title = crate::domain::metric_label(self.metric(), self.layer());
        let block = Block::default().title(title.clone()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(chart) = self.window.chart().filter(|c| c.point_count() > 0) else {
            let msg = if self.loading { "Loading..." } else { "No data for this metric/window." };
            let p = Paragraph::new(msg).style(Style::default().fg(Color::Yellow));
            frame.render_widget(p, inner);
            return;
        };

        let series = PlotSeries::from_chart(chart);
        let x_bounds = self
            .window
            .window()
            .map_or([0.0, 1.0], |w| [date_to_x(w.start), date_to_x(w.end)]);
        let x_bounds = if x_bounds[1] > x_bounds[0] {
            x_bounds
        } else {
            [x_bounds[0] - 1.0, x_bounds[1] + 1.0]
        };
        let y_bounds = padded_y_bounds(chart.y_range());

        let (chart_area, legend_area) = split_legend(inner, series.len());
        let (_, _, foreground) = self.palette();
        let widget = LedgerPlottersChart {
            series: &series,
            x_bounds,
            y_bounds,
            y_label: &title,
            fill: self.fill,
            foreground,
        };
        frame.render_widget(widget, chart_area);

        if let Some(legend_area) = legend_area {
            let lines: Vec<Line> = series
                .iter()
                .map(|s| {
                    let RGBColor(r, g, b) = s.color;
                    Line::from(vec![
                        Span::styled("■ ", Style::default().fg(Color::Rgb(r, g, b))),
                        Span::raw(s.label.clone()),
                    ])
                })
                .collect();
            frame.render_widget(Paragraph::new(Text::from(lines)), legend_area);
        }
    }

    fn draw_slider(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Range").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some((start, end, stops)) = self.window.handles() else {
            return;
        };
        let track = slider_track(start, end, stops, inner.width as usize);
        let p = Paragraph::new(track)
            .alignment(Alignment::Left)
            .style(Style::default().add_modifier(Modifier::BOLD));
        frame.render_widget(p, inner);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ start  ,/. end  0 reset  ↑/↓ metric  Tab layer  o Tor  t theme  f fill  r reload  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn metric_columns(layer: Layer) -> Vec<&'static str> {
    layer_metrics(layer).iter().map(|m| m.column).collect()
}

fn padded_y_bounds(range: Option<(f64, f64)>) -> [f64; 2] {
    let (lo, hi) = match range {
        Some((lo, hi)) if hi > lo => (lo, hi),
        Some((lo, hi)) => (lo - 1.0, hi + 1.0),
        None => (0.0, 1.0),
    };
    let pad = ((hi - lo) * 0.05).max(1e-12);
    [lo - pad, hi + pad]
}

/// Reserve a right-hand legend column when there is room for it.
fn split_legend(inner: Rect, entries: usize) -> (Rect, Option<Rect>) {
    const LEGEND_WIDTH: u16 = 22;
    if entries == 0 || inner.width < LEGEND_WIDTH + 30 {
        return (inner, None);
    }
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(LEGEND_WIDTH)])
        .split(inner);
    (chunks[0], Some(chunks[1]))
}

/// Text rendering of the two-handle slider: `─` track, `━` selected span,
/// `◆` handles.
fn slider_track(start: usize, end: usize, stops: usize, width: usize) -> String {
    if width == 0 || stops == 0 {
        return String::new();
    }
    let last = stops.saturating_sub(1).max(1);
    let pos = |idx: usize| ((idx as f64 / last as f64) * (width as f64 - 1.0)).round() as usize;
    let (a, b) = (pos(start), pos(end));

    (0..width)
        .map(|i| {
            if i == a || i == b {
                '◆'
            } else if i > a && i < b {
                '━'
            } else {
                '─'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::data::DirSource;

    fn app_with_file(root: &std::path::Path, file: PathBuf) -> App {
        App::new(TuiOptions {
            selection: DataSelection::default_for(Layer::Consensus, false),
            metric: None,
            file: Some(file),
            pipeline: Pipeline::new(Arc::new(DirSource::new(root)), MalformedRowPolicy::Skip),
            prefs: PreferenceStore::new(root.join("prefs.json")),
        })
    }

    #[test]
    fn reload_keeps_the_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("mine.csv");
        std::fs::write(&csv, "date,ledger,hhi\n2021-01-01,bitcoin,1\n").unwrap();

        let mut app = app_with_file(dir.path(), csv.clone());
        app.handle_key(KeyCode::Char('r'));
        assert_eq!(app.input().unwrap(), Input::Local(csv));
    }

    #[test]
    fn changing_the_layer_drops_the_local_file_visibly() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("mine.csv");
        std::fs::write(&csv, "date,ledger,hhi\n2021-01-01,bitcoin,1\n").unwrap();

        let mut app = app_with_file(dir.path(), csv);
        app.handle_key(KeyCode::Tab);
        assert!(app.file.is_none());
        assert!(matches!(app.input().unwrap(), Input::Remote(_)));
        assert!(app.status.contains("mine.csv dropped"));
    }

    #[test]
    fn slider_marks_handles_and_span() {
        assert_eq!(slider_track(0, 4, 5, 9), "◆━━━━━━━◆");
        assert_eq!(slider_track(1, 2, 5, 9), "──◆━◆────");
        assert_eq!(slider_track(2, 2, 5, 5), "──◆──");
        assert_eq!(slider_track(0, 0, 0, 5), "");
    }

    #[test]
    fn y_bounds_are_padded_and_never_empty() {
        assert_eq!(padded_y_bounds(None), [-0.05, 1.05]);
        let [lo, hi] = padded_y_bounds(Some((3.0, 3.0)));
        assert!(lo < 3.0 && hi > 3.0);
    }

    #[test]
    fn legend_needs_room() {
        let narrow = Rect::new(0, 0, 40, 10);
        assert_eq!(split_legend(narrow, 3), (narrow, None));
        let wide = Rect::new(0, 0, 100, 10);
        let (chart, legend) = split_legend(wide, 3);
        assert_eq!(chart.width, 78);
        assert_eq!(legend.map(|r| r.width), Some(22));
    }
}
