//! Range window controller.
//!
//! Owns the parsed rows and the selected `[start, end]` window of one chart
//! instance. Every change of window or metric rebuilds the chart data
//! synchronously from the rows already held; nothing is re-fetched.
//!
//! States:
//! - `Idle`: nothing loaded
//! - `Windowed`: rows loaded, window defaults to the full date extent

use chrono::NaiveDate;

use crate::chart::build::build_chart_data;
use crate::domain::{ChartData, DataEntry, DateWindow, Layer};

#[derive(Debug, Clone, Default)]
enum WindowState {
    #[default]
    Idle,
    Windowed(WindowedView),
}

#[derive(Debug, Clone)]
struct WindowedView {
    layer: Layer,
    metric: String,
    rows: Vec<DataEntry>,
    /// Distinct row dates, ascending. Slider handles step over these.
    dates: Vec<NaiveDate>,
    extent: DateWindow,
    window: DateWindow,
    chart: ChartData,
}

impl WindowedView {
    fn rebuild(&mut self) {
        self.chart = build_chart_data(&self.metric, self.layer, &self.rows, Some(self.window));
    }

    /// Index of the first slider stop at or after the window start.
    fn start_idx(&self) -> usize {
        self.dates
            .partition_point(|d| *d < self.window.start)
            .min(self.dates.len() - 1)
    }

    /// Index of the last slider stop at or before the window end.
    fn end_idx(&self) -> usize {
        self.dates.partition_point(|d| *d <= self.window.end).saturating_sub(1)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RangeWindow {
    state: WindowState,
}

impl RangeWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the dataset. The window resets to the full extent of `rows`.
    ///
    /// Returns `false` (and goes back to `Idle`) when `rows` is empty.
    pub fn load(&mut self, layer: Layer, metric: impl Into<String>, rows: Vec<DataEntry>) -> bool {
        let mut dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
        dates.sort_unstable();
        dates.dedup();

        let Some(extent) = DateWindow::extent(dates.iter().copied()) else {
            self.state = WindowState::Idle;
            return false;
        };

        let mut view = WindowedView {
            layer,
            metric: metric.into(),
            rows,
            dates,
            extent,
            window: extent,
            chart: ChartData::default(),
        };
        view.rebuild();
        self.state = WindowState::Windowed(view);
        true
    }

    pub fn clear(&mut self) {
        self.state = WindowState::Idle;
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, WindowState::Idle)
    }

    /// Move both handles. Bounds are ordered and clamped to the data extent;
    /// the latest call always wins.
    pub fn set_window(&mut self, start: NaiveDate, end: NaiveDate) -> Option<&ChartData> {
        let view = self.view_mut()?;
        view.window = DateWindow::new(start, end).clamp_to(&view.extent);
        view.rebuild();
        Some(&view.chart)
    }

    /// Move the start handle by `delta` slider stops, never past the end handle.
    pub fn step_start(&mut self, delta: isize) -> Option<&ChartData> {
        let view = self.view_mut()?;
        let end = view.end_idx();
        let idx = offset(view.start_idx(), delta).min(end);
        view.window = DateWindow::new(view.dates[idx], view.window.end);
        view.rebuild();
        Some(&view.chart)
    }

    /// Move the end handle by `delta` slider stops, never before the start handle.
    pub fn step_end(&mut self, delta: isize) -> Option<&ChartData> {
        let view = self.view_mut()?;
        let start = view.start_idx();
        let last = view.dates.len() - 1;
        let idx = offset(view.end_idx(), delta).clamp(start, last);
        view.window = DateWindow::new(view.window.start, view.dates[idx]);
        view.rebuild();
        Some(&view.chart)
    }

    /// Switch the plotted metric, keeping the current window.
    pub fn set_metric(&mut self, metric: impl Into<String>) -> Option<&ChartData> {
        let view = self.view_mut()?;
        view.metric = metric.into();
        view.rebuild();
        Some(&view.chart)
    }

    pub fn reset_window(&mut self) -> Option<&ChartData> {
        let view = self.view_mut()?;
        view.window = view.extent;
        view.rebuild();
        Some(&view.chart)
    }

    pub fn chart(&self) -> Option<&ChartData> {
        self.view().map(|v| &v.chart)
    }

    pub fn window(&self) -> Option<DateWindow> {
        self.view().map(|v| v.window)
    }

    pub fn extent(&self) -> Option<DateWindow> {
        self.view().map(|v| v.extent)
    }

    pub fn metric(&self) -> Option<&str> {
        self.view().map(|v| v.metric.as_str())
    }

    pub fn layer(&self) -> Option<Layer> {
        self.view().map(|v| v.layer)
    }

    pub fn rows(&self) -> &[DataEntry] {
        self.view().map(|v| v.rows.as_slice()).unwrap_or_default()
    }

    /// Slider handle positions as `(start_idx, end_idx, stop_count)`.
    pub fn handles(&self) -> Option<(usize, usize, usize)> {
        self.view().map(|v| (v.start_idx(), v.end_idx(), v.dates.len()))
    }

    fn view(&self) -> Option<&WindowedView> {
        match &self.state {
            WindowState::Windowed(v) => Some(v),
            WindowState::Idle => None,
        }
    }

    fn view_mut(&mut self) -> Option<&mut WindowedView> {
        match &mut self.state {
            WindowState::Windowed(v) => Some(v),
            WindowState::Idle => None,
        }
    }
}

fn offset(idx: usize, delta: isize) -> usize {
    if delta.is_negative() {
        idx.saturating_sub(delta.unsigned_abs())
    } else {
        idx.saturating_add(delta.unsigned_abs())
    }
}
