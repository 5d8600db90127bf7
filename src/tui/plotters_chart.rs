//! Plotters-powered price histogram widget for Ratatui.
//!
//! We render Plotters output into the Ratatui buffer using `plotters-ratatui-backend`.

use plotters::prelude::*;
use plotters::style::Color as _;
use plotters_ratatui_backend::widget_fn;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

/// A lightweight, render-only chart description.
///
/// All series and bounds are computed outside the render call.
pub struct PriceHistogramChart<'a> {
    /// `(left edge, right edge, count)` per bin.
    pub bars: &'a [(f64, f64, usize)],
    /// Predicted price, drawn as a vertical marker.
    pub prediction: Option<f64>,
    /// X bounds (price).
    pub x_bounds: [f64; 2],
    /// Y bounds (listing count).
    pub y_bounds: [f64; 2],
    pub x_label: &'a str,
    pub y_label: &'a str,
    pub fmt_x: fn(f64) -> String,
    pub fmt_y: fn(f64) -> String,
}

impl<'a> Widget for PriceHistogramChart<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        // Plotters may fail to build a chart in a tiny area.
        if area.width < 20 || area.height < 8 {
            buf.set_string(
                area.x,
                area.y,
                "Chart area too small (resize terminal).",
                Style::default().fg(Color::Yellow),
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

            chart
                .configure_mesh()
                .disable_x_mesh()
                .disable_y_mesh()
                .x_desc(self.x_label)
                .y_desc(self.y_label)
                .x_labels(5)
                .y_labels(5)
                .x_label_formatter(&|v| (self.fmt_x)(*v))
                .y_label_formatter(&|v| (self.fmt_y)(*v))
                .label_style(("sans-serif", 10).into_font().color(&WHITE))
                .axis_style(&WHITE)
                .bold_line_style(&WHITE)
                .draw()?;

            let bar_color = RGBColor(0, 255, 255); // cyan
            let marker_color = RGBColor(255, 0, 0); // red

            chart.draw_series(
                self.bars
                    .iter()
                    .filter(|(_, _, count)| *count > 0)
                    .map(|&(left, right, count)| {
                        Rectangle::new([(left, 0.0), (right, count as f64)], bar_color.filled())
                    }),
            )?;

            if let Some(price) = self.prediction {
                chart.draw_series(LineSeries::new([(price, y0), (price, y1)], &marker_color))?;
            }

            Ok(())
        });

        widget.render(area, buf);
    }
}
