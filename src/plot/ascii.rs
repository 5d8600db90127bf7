//! ASCII histogram for terminal output.
//!
//! This is intentionally "dumb" (fixed-size grid), optimized for:
//! - quick visual sanity checks in a terminal
//! - deterministic output (helpful for golden tests)
//!
//! Plot elements:
//! - price bins: `#` bars
//! - predicted price: `|` column with a `^` pointer below the axis

use crate::report::{Histogram, format_price};

/// Render the price histogram with the prediction marked.
///
/// The x-range is widened to include `prediction` when it falls outside the
/// historical prices.
pub fn render_ascii_histogram(hist: &Histogram, prediction: f64, width: usize, height: usize) -> String {
    let width = width.max(10);
    let height = height.max(3);

    let [x_min, x_max] = hist.x_bounds_with(prediction);
    let peak = hist.max_count().max(1);

    let mut grid = vec![vec![' '; width]; height];
    for col in 0..width {
        let x = x_min + (col as f64 + 0.5) / width as f64 * (x_max - x_min);
        let count = hist.bin_of(x).map(|i| hist.counts[i]).unwrap_or(0);
        let bar = bar_height(count, peak, height);
        for row in grid.iter_mut().skip(height - bar) {
            row[col] = '#';
        }
    }

    let marker = prediction
        .is_finite()
        .then(|| map_x(prediction, x_min, x_max, width));
    if let Some(col) = marker {
        for row in grid.iter_mut() {
            row[col] = '|';
        }
    }

    let total: usize = hist.counts.iter().sum();
    let mut out = String::new();
    out.push_str(&format!(
        "Histogram: price=[{}, {}] | n={total} | bins={} | peak={}\n",
        format_price(hist.min),
        format_price(hist.max),
        hist.bins(),
        hist.max_count()
    ));

    for row in grid {
        out.push_str(row.into_iter().collect::<String>().trim_end());
        out.push('\n');
    }

    out.push_str(&"-".repeat(width));
    out.push('\n');
    let lo = format_price(x_min);
    let hi = format_price(x_max);
    let gap = width.saturating_sub(lo.len() + hi.len()).max(1);
    out.push_str(&format!("{lo}{}{hi}\n", " ".repeat(gap)));

    if let Some(col) = marker {
        out.push_str(&format!("{}^ predicted {}\n", " ".repeat(col), format_price(prediction)));
    }

    out
}

fn bar_height(count: usize, peak: usize, height: usize) -> usize {
    if count == 0 {
        return 0;
    }
    let h = (count as f64 / peak as f64 * height as f64).round() as usize;
    h.clamp(1, height)
}

fn map_x(x: f64, x_min: f64, x_max: f64, width: usize) -> usize {
    if x_max <= x_min {
        return 0;
    }
    let u = ((x - x_min) / (x_max - x_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}
