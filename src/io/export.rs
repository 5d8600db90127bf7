//! Export a prediction report to JSON.
//!
//! The export is meant to be easy to consume in downstream scripts.

use std::path::Path;

use serde::Serialize;

use crate::app::pipeline::PredictionOutput;
use crate::error::AppError;
use crate::report::Histogram;

#[derive(Debug, Serialize)]
struct PredictionExport<'a> {
    #[serde(flatten)]
    prediction: &'a PredictionOutput,
    histogram: &'a Histogram,
}

/// Write one prediction (inputs, encoding, price, comparables, histogram) to `path`.
pub fn write_prediction_json(path: &Path, output: &PredictionOutput, histogram: &Histogram) -> Result<(), AppError> {
    let export = PredictionExport {
        prediction: output,
        histogram,
    };
    let json = serde_json::to_string_pretty(&export)
        .map_err(|e| AppError::runtime(format!("Failed to serialize prediction export: {e}")))?;

    std::fs::write(path, json)
        .map_err(|e| AppError::input(format!("Failed to write export JSON '{}': {e}", path.display())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::pipeline::run_prediction;
    use crate::app::pipeline::tests::context;
    use crate::domain::RawInput;

    #[test]
    fn export_contains_price_and_histogram() {
        let ctx = context();
        let input = RawInput::new("BEDOK", "4 ROOM", "04 TO 06", 90.0, 1995).unwrap();
        let out = run_prediction(&ctx, input).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prediction.json");
        write_prediction_json(&path, &out, &ctx.histogram).unwrap();

        let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["price"].as_f64(), Some(out.price));
        assert_eq!(value["input"]["town"], "BEDOK");
        assert_eq!(value["histogram"]["counts"].as_array().unwrap().len(), 20);
        assert_eq!(value["latest"].as_array().unwrap().len(), 3);
        assert_eq!(
            value["aligned"]["vector"]["values"].as_array().unwrap().len(),
            ctx.schema.len()
        );
    }
}
