//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the encoding/modeling code stays clean and testable
//! - output changes are localized

use crate::app::pipeline::PredictionOutput;
use crate::domain::Listing;
use crate::features::Unmatched;
use crate::io::Dataset;
use crate::model::ModelArtifact;

/// Currency string with thousands separators, e.g. `$1,234,567.89`.
pub fn format_price(value: f64) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let frac = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac:02}")
}

/// Header block: dataset and model provenance.
pub fn format_context_summary(dataset: &Dataset, model: &ModelArtifact) -> String {
    let mut out = String::new();
    let stats = &dataset.stats;

    out.push_str("=== resale - Flat Resale Price Predictor ===\n");
    out.push_str(&format!(
        "Listings: n={} (skipped {}) | months=[{}, {}]\n",
        stats.rows_used,
        stats.rows_read - stats.rows_used,
        stats.month_min.format("%Y-%m"),
        stats.month_max.format("%Y-%m"),
    ));
    out.push_str(&format!(
        "Prices: [{}, {}]\n",
        format_price(stats.price_min),
        format_price(stats.price_max)
    ));
    out.push_str(&format!(
        "Model: {} | columns={}\n",
        model.model.display_name(),
        model.columns.len()
    ));
    if let Some(training) = &model.training {
        out.push_str(&format!(
            "Trained: {} | {}\n",
            training.trained_at.format("%Y-%m-%d %H:%M UTC"),
            training.params
        ));
    }
    out
}

/// Prediction block: the request, the price and any unmatched values.
pub fn format_prediction(output: &PredictionOutput) -> String {
    let mut out = String::new();
    let input = &output.input;

    out.push_str("\nRequest:\n");
    out.push_str(&format!("- town          : {}\n", input.town()));
    out.push_str(&format!("- flat type     : {}\n", input.flat_type()));
    out.push_str(&format!("- storey range  : {}\n", input.storey_range()));
    out.push_str(&format!("- floor area    : {:.1} sqm\n", input.floor_area_sqm()));
    out.push_str(&format!("- lease started : {}\n", input.lease_commence_date()));

    out.push_str(&format!("\nPredicted resale price: {}\n", format_price(output.price)));
    out.push_str(&format_unmatched(&output.aligned.unmatched));
    out
}

/// One warning line per categorical value the model has never seen.
pub fn format_unmatched(unmatched: &[Unmatched]) -> String {
    let mut out = String::new();
    for u in unmatched {
        out.push_str(&format!(
            "warning: {} '{}' is not a model column; its indicators are all zero\n",
            u.field.display_name(),
            u.value
        ));
    }
    out
}

/// Both comparable-listing tables.
pub fn format_comparables(output: &PredictionOutput) -> String {
    let mut out = String::new();
    let town = output.input.town();

    out.push_str(&format!("\nLatest listings in {town}:\n"));
    out.push_str(&format_listings_table(&output.latest));
    out.push('\n');

    out.push_str(&format!(
        "Closest floor area to {:.1} sqm in {town}:\n",
        output.input.floor_area_sqm()
    ));
    out.push_str(&format_listings_table(&output.closest));
    out
}

pub fn format_listings_table(rows: &[Listing]) -> String {
    if rows.is_empty() {
        return "(no listings)\n".to_string();
    }

    let mut out = String::new();
    out.push_str(
        format!(
            "{:<7} {:<16} {:<16} {:<8} {:>6} {:>5} {:>14}",
            "month", "town", "flat_type", "storey", "sqm", "lease", "resale_price"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(&format!(
        "{:-<7} {:-<16} {:-<16} {:-<8} {:-<6} {:-<5} {:-<14}\n",
        "", "", "", "", "", "", ""
    ));

    for l in rows {
        out.push_str(
            format!(
                "{:<7} {:<16} {:<16} {:<8} {:>6.1} {:>5} {:>14}",
                l.month.format("%Y-%m"),
                truncate(&l.town, 16),
                truncate(&l.flat_type, 16),
                truncate(&l.storey_range, 8),
                l.floor_area_sqm,
                l.lease_commence_date,
                format_price(l.resale_price),
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_prediction;
    use crate::app::pipeline::tests::context;
    use crate::domain::RawInput;
    use chrono::NaiveDate;

    #[test]
    fn price_formatting() {
        assert_eq!(format_price(0.0), "$0.00");
        assert_eq!(format_price(999.5), "$999.50");
        assert_eq!(format_price(1000.0), "$1,000.00");
        assert_eq!(format_price(1_234_567.891), "$1,234,567.89");
        assert_eq!(format_price(-45_000.0), "-$45,000.00");
        assert_eq!(format_price(f64::NAN), "n/a");
    }

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("BEDOK", 8), "BEDOK");
        assert_eq!(truncate("KALLANG/WHAMPOA", 8), "KALLANG.");
    }

    #[test]
    fn listings_table_layout() {
        let rows = vec![Listing {
            month: NaiveDate::from_ymd_opt(2017, 3, 1).unwrap(),
            town: "BEDOK".to_string(),
            flat_type: "4 ROOM".to_string(),
            storey_range: "04 TO 06".to_string(),
            flat_model: None,
            floor_area_sqm: 92.0,
            lease_commence_date: 1990,
            resale_price: 410_000.0,
        }];
        let txt = format_listings_table(&rows);
        let lines: Vec<&str> = txt.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("month"));
        assert!(lines[2].starts_with("2017-03 BEDOK"));
        assert!(lines[2].ends_with("$410,000.00"));

        assert_eq!(format_listings_table(&[]), "(no listings)\n");
    }

    #[test]
    fn prediction_block_warns_on_unseen_town() {
        let ctx = context();
        let input = RawInput::new("ATLANTIS", "4 ROOM", "04 TO 06", 92.0, 1990).unwrap();
        let out = run_prediction(&ctx, input).unwrap();

        let txt = format_prediction(&out);
        assert!(txt.contains("Predicted resale price: $"));
        assert!(txt.contains("warning: Town 'ATLANTIS'"));
        assert!(format_comparables(&out).contains("(no listings)"));
    }

    #[test]
    fn context_summary_mentions_model() {
        let ctx = context();
        let txt = format_context_summary(&ctx.dataset, &ctx.model);
        assert!(txt.contains("Listings: n=6 (skipped 0)"));
        assert!(txt.contains("months=[2017-01, 2017-03]"));
        assert!(txt.contains("Prices: [$250,000.00, $700,000.00]"));
        assert!(txt.contains("columns=73"));
    }
}
