//! Plotters-powered time-series chart widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.
//! X values are days since the common era so dates map onto a plain `f64` axis.

use chrono::{Datelike, NaiveDate};
use plotters::prelude::*;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color as TuiColor, Style},
    widgets::Widget,
};

use crate::domain::{ChartData, Rgb};

/// Opacity of filled areas.
pub const BACKGROUND_FILL_ALPHA: f64 = 0.2;

/// One line (or area) on the chart, already in plot coordinates.
#[derive(Debug, Clone)]
pub struct PlotSeries {
    pub label: String,
    pub color: RGBColor,
    pub points: Vec<(f64, f64)>,
}

impl PlotSeries {
    /// Convert every dataset of `chart`, keeping dataset order and colours.
    pub fn from_chart(chart: &ChartData) -> Vec<PlotSeries> {
        chart
            .datasets
            .iter()
            .map(|ds| {
                let rgb = ledger_rgb(&ds.border_color);
                PlotSeries {
                    label: ds.label.clone(),
                    color: RGBColor(rgb.0, rgb.1, rgb.2),
                    points: ds.data.iter().map(|p| (date_to_x(p.x), p.y)).collect(),
                }
            })
            .collect()
    }
}

/// X coordinate of `date`.
pub fn date_to_x(date: NaiveDate) -> f64 {
    f64::from(date.num_days_from_ce())
}

pub fn x_to_date(x: f64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
}

fn ledger_rgb(hex: &str) -> Rgb {
    let channel = |i: usize| hex.get(i..i + 2).and_then(|s| u8::from_str_radix(s, 16).ok());
    match (channel(1), channel(3), channel(5)) {
        (Some(r), Some(g), Some(b)) => Rgb(r, g, b),
        _ => Rgb(255, 255, 255),
    }
}

/// A render-only chart description; all series and bounds are computed by the caller.
pub struct LedgerPlottersChart<'a> {
    pub series: &'a [PlotSeries],
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub y_label: &'a str,
    /// Draw filled areas down to the lower y bound instead of lines.
    pub fill: bool,
    /// Axis and label colour (depends on the theme).
    pub foreground: RGBColor,
}

impl<'a> Widget for LedgerPlottersChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to lay out a chart in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(TuiColor::Yellow),
            );
            return;
        }

        let [x0, x1] = self.x_bounds;
        let [y0, y1] = self.y_bounds;
        if !(x0.is_finite() && x1.is_finite() && y0.is_finite() && y1.is_finite()) || x1 <= x0 || y1 <= y0 {
            return;
        }

        let widget = widget_fn(move |root| {
            let mut chart = ChartBuilder::on(&root)
                .margin(1)
                .set_label_area_size(LabelAreaPosition::Left, 6)
                .set_label_area_size(LabelAreaPosition::Bottom, 3)
                .build_cartesian_2d(x0..x1, y0..y1)?;

            // Mesh lines are noise at terminal resolution.
            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc("date")
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| fmt_axis_date(*v))
                .y_label_formatter(&|v| fmt_axis_value(*v))
                .label_style(("sans-serif", 10).into_font().color(&self.foreground))
                .axis_style(&self.foreground)
                .bold_line_style(&self.foreground)
                .draw()?;

            for s in self.series {
                if self.fill {
                    chart.draw_series(AreaSeries::new(
                        s.points.iter().copied(),
                        y0,
                        s.color.mix(BACKGROUND_FILL_ALPHA),
                    ))?;
                }
                chart.draw_series(LineSeries::new(s.points.iter().copied(), &s.color))?;
                // Pixels keep single-point series visible.
                chart.draw_series(s.points.iter().map(|&(x, y)| Pixel::new((x, y), s.color)))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}

pub fn fmt_axis_date(v: f64) -> String {
    x_to_date(v).map(|d| d.format("%Y-%m").to_string()).unwrap_or_default()
}

pub fn fmt_axis_value(v: f64) -> String {
    if v.abs() >= 1000.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::build_chart_data;
    use crate::domain::{DataEntry, Layer};

    #[test]
    fn dates_round_trip_through_the_x_axis() {
        let d = NaiveDate::from_ymd_opt(2021, 7, 15).unwrap();
        assert_eq!(x_to_date(date_to_x(d)), Some(d));
        assert_eq!(fmt_axis_date(date_to_x(d)), "2021-07");
    }

    #[test]
    fn series_keep_ledger_colours() {
        let d = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let rows = vec![DataEntry::new(d, Some("bitcoin")).with_value("hhi", Some(5.0))];
        let chart = build_chart_data("hhi", Layer::Consensus, &rows, None);

        let series = PlotSeries::from_chart(&chart);
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].color, RGBColor(247, 147, 26));
        assert_eq!(series[0].points, vec![(date_to_x(d), 5.0)]);
    }

    #[test]
    fn fill_colour_is_a_translucent_series_colour() {
        let fill = RGBColor(247, 147, 26).mix(BACKGROUND_FILL_ALPHA).to_backend_color();
        assert_eq!(fill.rgb, (247, 147, 26));
        assert!((fill.alpha - 0.2).abs() < 1e-12);
    }

    #[test]
    fn malformed_hex_falls_back_to_white() {
        assert_eq!(ledger_rgb("#zz0000"), Rgb(255, 255, 255));
        assert_eq!(ledger_rgb("#0a0b0c"), Rgb(10, 11, 12));
    }
}
