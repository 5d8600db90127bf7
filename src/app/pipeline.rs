//! Shared prediction pipeline used by both CLI and TUI front-ends.
//!
//! Start-up loads the read-only inputs once into an `AppContext`:
//! dataset CSV -> model artifact -> schema (artifact columns, or an override
//! that must match them) -> price histogram.
//!
//! Each interaction then runs:
//! RawInput -> aligned feature vector -> prediction -> comparable listings

use serde::Serialize;
use tracing::{debug, info};

use crate::config::ResolvedPaths;
use crate::domain::{Listing, RawInput};
use crate::error::AppError;
use crate::features::{AlignReport, FeatureSchema, align};
use crate::io::{Dataset, load_dataset, read_artifact_json};
use crate::model::ModelArtifact;
use crate::report::{COMPARABLE_COUNT, DEFAULT_BINS, Histogram, closest_listings, latest_listings};

/// Immutable handles to everything a prediction needs.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub dataset: Dataset,
    pub model: ModelArtifact,
    pub schema: FeatureSchema,
    pub histogram: Histogram,
}

impl AppContext {
    /// Load dataset, model and schema from disk.
    pub fn load(paths: &ResolvedPaths) -> Result<Self, AppError> {
        let dataset = load_dataset(&paths.data)?;
        let model = read_artifact_json(&paths.model)?;
        let schema = match &paths.schema {
            Some(path) => Some(FeatureSchema::read_json(path)?),
            None => None,
        };
        Self::from_parts(dataset, model, schema)
    }

    /// Assemble a context from already-loaded parts.
    ///
    /// An explicit schema must match the model's columns exactly.
    pub fn from_parts(
        dataset: Dataset,
        model: ModelArtifact,
        schema: Option<FeatureSchema>,
    ) -> Result<Self, AppError> {
        let schema = match schema {
            Some(schema) => {
                model.check_schema(&schema)?;
                schema
            }
            None => model.schema()?,
        };

        let histogram = Histogram::from_values(dataset.prices(), DEFAULT_BINS)
            .ok_or_else(|| AppError::no_data("Dataset has no finite resale prices."))?;

        info!(
            listings = dataset.listings.len(),
            columns = schema.len(),
            model = model.model.display_name(),
            "context ready"
        );

        Ok(Self {
            dataset,
            model,
            schema,
            histogram,
        })
    }
}

/// All computed outputs of a single prediction.
#[derive(Debug, Clone, Serialize)]
pub struct PredictionOutput {
    pub input: RawInput,
    pub aligned: AlignReport,
    pub price: f64,
    /// Histogram bin holding `price` (`None` when outside the historical range).
    pub price_bin: Option<usize>,
    pub latest: Vec<Listing>,
    pub closest: Vec<Listing>,
}

/// Run the full pipeline for one request.
pub fn run_prediction(ctx: &AppContext, input: RawInput) -> Result<PredictionOutput, AppError> {
    let aligned = align(&input, &ctx.schema);
    let price = ctx.model.predict_checked(aligned.vector.as_slice())?;
    debug!(town = input.town(), price, "prediction");

    let latest = latest_listings(&ctx.dataset.listings, input.town(), COMPARABLE_COUNT);
    let closest = closest_listings(
        &ctx.dataset.listings,
        input.town(),
        input.floor_area_sqm(),
        COMPARABLE_COUNT,
    );

    Ok(PredictionOutput {
        price_bin: ctx.histogram.bin_of(price),
        input,
        aligned,
        price,
        latest,
        closest,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::io::read_dataset;
    use crate::model::{TrainConfig, train_artifact};

    pub(crate) const CSV: &str = "\
month,town,flat_type,storey_range,floor_area_sqm,flat_model,lease_commence_date,resale_price
2017-01,BEDOK,4 ROOM,04 TO 06,90,Model A,1995,300000
2017-02,BEDOK,4 ROOM,07 TO 09,95,Model A,1995,310000
2017-03,BEDOK,3 ROOM,01 TO 03,67,Improved,1978,250000
2017-01,BISHAN,4 ROOM,04 TO 06,92,Model A,1990,600000
2017-02,BISHAN,5 ROOM,10 TO 12,120,Improved,1988,700000
2017-03,BISHAN,4 ROOM,04 TO 06,90,Model A,1992,610000
";

    pub(crate) fn context() -> AppContext {
        let dataset = read_dataset(CSV.as_bytes()).unwrap();
        let config = TrainConfig {
            test_fraction: 0.0,
            ..TrainConfig::default()
        };
        let model = train_artifact(&dataset.listings, &FeatureSchema::default_resale(), &config).unwrap();
        AppContext::from_parts(dataset, model, None).unwrap()
    }

    #[test]
    fn prediction_uses_model_schema_and_comparables() {
        let ctx = context();
        assert_eq!(ctx.schema, FeatureSchema::default_resale());

        let input = RawInput::new("BISHAN", "4 ROOM", "04 TO 06", 92.0, 1990).unwrap();
        let out = run_prediction(&ctx, input).unwrap();

        assert!(out.price >= 600_000.0 && out.price <= 700_000.0, "price {}", out.price);
        assert!(out.price_bin.is_some());
        assert!(out.aligned.unmatched.is_empty());
        assert_eq!(out.latest.len(), 3);
        assert!(out.latest.iter().all(|l| l.town == "BISHAN"));
        assert_eq!(out.latest[0].resale_price, 610_000.0);
        assert_eq!(out.closest[0].floor_area_sqm, 92.0);
    }

    #[test]
    fn explicit_schema_must_match_model() {
        let dataset = read_dataset(CSV.as_bytes()).unwrap();
        let model = context().model;
        let wrong = FeatureSchema::from_names(["town_BEDOK", "floor_area_sqm"]).unwrap();

        let err = AppContext::from_parts(dataset, model, Some(wrong)).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn unknown_town_still_predicts() {
        let ctx = context();
        let input = RawInput::new("ATLANTIS", "4 ROOM", "04 TO 06", 92.0, 1990).unwrap();
        let out = run_prediction(&ctx, input).unwrap();

        assert!(out.price.is_finite());
        assert_eq!(out.aligned.unmatched.len(), 1);
        assert!(out.latest.is_empty());
        assert!(out.closest.is_empty());
    }
}
