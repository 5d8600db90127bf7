//! Ratatui-based terminal UI.
//!
//! The TUI provides a form for the flat's attributes. Every change re-runs the
//! prediction pipeline and redraws the price, the comparable listings and the
//! price histogram with the prediction marked.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
};
use tracing::{debug, warn};

use crate::app::pipeline::{AppContext, PredictionOutput, run_prediction};
use crate::domain::{
    CategoricalField, DEFAULT_FLOOR_AREA, DEFAULT_LEASE_YEAR, FLOOR_AREA_RANGE, LEASE_YEAR_RANGE, RawInput,
};
use crate::error::AppError;
use crate::report::{format_listings_table, format_price};

mod plotters_chart;

use plotters_chart::PriceHistogramChart;

const FIELD_COUNT: usize = 5;

/// Start the TUI.
pub fn run(ctx: AppContext) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(ctx);
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!("Failed to enter alternate screen: {e}")));
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Town,
    FlatType,
    StoreyRange,
    FloorArea,
    LeaseYear,
}

impl Field {
    fn from_index(i: usize) -> Self {
        match i {
            0 => Field::Town,
            1 => Field::FlatType,
            2 => Field::StoreyRange,
            3 => Field::FloorArea,
            _ => Field::LeaseYear,
        }
    }
}

/// Which comparable-listings table is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableMode {
    Latest,
    Closest,
}

struct App {
    ctx: AppContext,
    town: usize,
    flat_type: usize,
    storey_range: usize,
    floor_area: f64,
    lease_year: i32,
    selected_field: usize,
    table: TableMode,
    status: String,
    output: Option<PredictionOutput>,
}

impl App {
    fn new(ctx: AppContext) -> Self {
        let mut app = Self {
            ctx,
            town: 0,
            flat_type: 0,
            storey_range: 0,
            floor_area: DEFAULT_FLOOR_AREA,
            lease_year: DEFAULT_LEASE_YEAR,
            selected_field: 0,
            table: TableMode::Latest,
            status: "Ready.".to_string(),
            output: None,
        };
        app.recompute();
        app
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
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

    /// Apply a key press. Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down | KeyCode::Tab => {
                if self.selected_field + 1 < FIELD_COUNT {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::PageDown => self.adjust_field(-10),
            KeyCode::PageUp => self.adjust_field(10),
            KeyCode::Char('c') => {
                self.table = match self.table {
                    TableMode::Latest => TableMode::Closest,
                    TableMode::Closest => TableMode::Latest,
                };
            }
            _ => {}
        }
        false
    }

    fn adjust_field(&mut self, delta: i32) {
        let options = &self.ctx.dataset.options;
        match Field::from_index(self.selected_field) {
            Field::Town => self.town = cycle(self.town, options.towns.len(), delta),
            Field::FlatType => self.flat_type = cycle(self.flat_type, options.flat_types.len(), delta),
            Field::StoreyRange => {
                self.storey_range = cycle(self.storey_range, options.storey_ranges.len(), delta)
            }
            Field::FloorArea => {
                self.floor_area = (self.floor_area + f64::from(delta))
                    .clamp(*FLOOR_AREA_RANGE.start(), *FLOOR_AREA_RANGE.end());
            }
            Field::LeaseYear => {
                self.lease_year =
                    (self.lease_year + delta).clamp(*LEASE_YEAR_RANGE.start(), *LEASE_YEAR_RANGE.end());
            }
        }
        self.recompute();
    }

    fn town_value(&self) -> &str {
        option_at(&self.ctx.dataset.options.towns, self.town)
    }

    fn flat_type_value(&self) -> &str {
        option_at(&self.ctx.dataset.options.flat_types, self.flat_type)
    }

    fn storey_range_value(&self) -> &str {
        option_at(&self.ctx.dataset.options.storey_ranges, self.storey_range)
    }

    fn recompute(&mut self) {
        let result = RawInput::new(
            self.town_value(),
            self.flat_type_value(),
            self.storey_range_value(),
            self.floor_area,
            self.lease_year,
        )
        .and_then(|input| run_prediction(&self.ctx, input));

        match result {
            Ok(output) => {
                debug!(price = output.price, "tui prediction");
                self.status = format!("Predicted {}", format_price(output.price));
                self.output = Some(output);
            }
            Err(err) => {
                warn!(error = %err, "prediction failed");
                self.status = format!("Prediction failed: {err}");
                self.output = None;
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let stats = &self.ctx.dataset.stats;
        let lines = vec![
            Line::from(vec![
                Span::styled("resale", Style::default().fg(Color::Cyan)),
                Span::raw(" | flat resale price predictor"),
            ]),
            Line::from(Span::styled(
                format!(
                    "listings: {} | months: {} to {} | model: {} | columns: {}",
                    stats.rows_used,
                    stats.month_min.format("%Y-%m"),
                    stats.month_max.format("%Y-%m"),
                    self.ctx.model.model.display_name(),
                    self.ctx.schema.len(),
                ),
                Style::default().fg(Color::Gray),
            )),
        ];

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(7), Constraint::Min(0), Constraint::Length(9)])
            .split(area);
        let top = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(44), Constraint::Min(0)])
            .split(rows[0]);

        self.draw_form(frame, top[0]);
        self.draw_result(frame, top[1]);
        self.draw_chart(frame, rows[1]);
        self.draw_table(frame, rows[2]);
    }

    fn draw_form(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let items = vec![
            ListItem::new(format!("{}: {}", CategoricalField::Town.display_name(), self.town_value())),
            ListItem::new(format!(
                "{}: {}",
                CategoricalField::FlatType.display_name(),
                self.flat_type_value()
            )),
            ListItem::new(format!(
                "{}: {}",
                CategoricalField::StoreyRange.display_name(),
                self.storey_range_value()
            )),
            ListItem::new(format!("Floor Area: {:.0} sqm", self.floor_area)),
            ListItem::new(format!("Lease Commence Date: {}", self.lease_year)),
        ];

        let list = List::new(items)
            .block(Block::default().title("Flat").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_result(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        match &self.output {
            Some(output) => {
                lines.push(Line::from(vec![
                    Span::raw("Predicted resale price: "),
                    Span::styled(
                        format_price(output.price),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    ),
                ]));
                let placement = match output.price_bin {
                    Some(bin) => format!("histogram bin {} of {}", bin + 1, self.ctx.histogram.bins()),
                    None => "outside the historical price range".to_string(),
                };
                lines.push(Line::from(Span::styled(placement, Style::default().fg(Color::Gray))));
                for u in &output.aligned.unmatched {
                    lines.push(Line::from(Span::styled(
                        format!("{} '{}' unknown to the model", u.field.display_name(), u.value),
                        Style::default().fg(Color::Yellow),
                    )));
                }
            }
            None => lines.push(Line::from(Span::styled(
                "No prediction.",
                Style::default().fg(Color::Yellow),
            ))),
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().title("Prediction").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Resale price distribution").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let prediction = self.output.as_ref().map(|o| o.price);
        let (bars, x_bounds, y_bounds) = chart_series(&self.ctx.histogram, prediction);

        let (chart_rect, insets) = chart_layout(inner);
        let widget = PriceHistogramChart {
            bars: &bars,
            prediction,
            x_bounds,
            y_bounds,
            x_label: "resale price",
            y_label: "listings",
            fmt_x: fmt_axis_price,
            fmt_y: fmt_axis_count,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, x_bounds, y_bounds);
        }
    }

    fn draw_table(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let town = self.town_value();
        let (title, rows) = match (&self.output, self.table) {
            (Some(o), TableMode::Latest) => (format!("Latest listings in {town}"), o.latest.as_slice()),
            (Some(o), TableMode::Closest) => (
                format!("Closest to {:.0} sqm in {town}", self.floor_area),
                o.closest.as_slice(),
            ),
            (None, _) => (format!("Listings in {town}"), &[][..]),
        };

        let p = Paragraph::new(format_listings_table(rows))
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  PgUp/PgDn ±10  c latest/closest  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Step through `len` options with wrap-around.
fn cycle(current: usize, len: usize, delta: i32) -> usize {
    if len == 0 {
        return 0;
    }
    let len = len as i64;
    (current as i64 + i64::from(delta)).rem_euclid(len) as usize
}

fn option_at(options: &[String], i: usize) -> &str {
    options.get(i).map(String::as_str).unwrap_or("")
}

/// Build bar rectangles and bounds for Plotters.
fn chart_series(
    hist: &crate::report::Histogram,
    prediction: Option<f64>,
) -> (Vec<(f64, f64, usize)>, [f64; 2], [f64; 2]) {
    let edges = hist.edges();
    let bars = edges
        .windows(2)
        .zip(hist.counts.iter().copied())
        .map(|(w, count)| (w[0], w[1], count))
        .collect();

    let [mut x0, mut x1] = hist.x_bounds_with(prediction.unwrap_or(f64::NAN));
    let pad = ((x1 - x0).abs() * 0.02).max(1e-9);
    x0 -= pad;
    x1 += pad;

    let y1 = (hist.max_count().max(1) as f64) * 1.1;
    (bars, [x0, x1], [0.0, y1])
}

fn fmt_axis_price(v: f64) -> String {
    format!("{:.0}k", v / 1000.0)
}

fn fmt_axis_count(v: f64) -> String {
    format!("{v:.0}")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10 || inner.height <= insets.top + insets.bottom + 5 {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = fmt_axis_price(x_val);
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = fmt_axis_count(y_val);
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("resale price ($)")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new("count").style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}
