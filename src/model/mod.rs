//! Regression models and the on-disk model artifact.
//!
//! The artifact records the ordered columns the model was fit on, so a schema
//! mismatch is caught at load time instead of producing a silently wrong price.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::features::FeatureSchema;

pub mod linear;
pub mod train;
pub mod tree;

pub use linear::LinearModel;
pub use train::*;
pub use tree::{RegressionTree, TreeNode, TreeParams};

/// Current artifact format.
pub const FORMAT_VERSION: u32 = 1;

/// A model that maps one dense feature row to a price.
pub trait Regressor {
    fn n_features(&self) -> usize;
    fn predict(&self, features: &[f64]) -> f64;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Model {
    DecisionTree(RegressionTree),
    Linear(LinearModel),
}

impl Model {
    pub fn display_name(&self) -> &'static str {
        match self {
            Model::DecisionTree(_) => "decision tree",
            Model::Linear(_) => "linear",
        }
    }

    fn validate(&self) -> Result<(), AppError> {
        match self {
            Model::DecisionTree(tree) => tree.validate(),
            Model::Linear(linear) => linear.validate(),
        }
    }
}

impl Regressor for Model {
    fn n_features(&self) -> usize {
        match self {
            Model::DecisionTree(tree) => tree.n_features(),
            Model::Linear(linear) => linear.n_features(),
        }
    }

    fn predict(&self, features: &[f64]) -> f64 {
        match self {
            Model::DecisionTree(tree) => tree.predict(features),
            Model::Linear(linear) => linear.predict(features),
        }
    }
}

/// Holdout metrics recorded at training time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub rmse: f64,
    pub mae: f64,
    /// Absent when the holdout targets have zero variance.
    pub r2: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingInfo {
    pub trained_at: DateTime<Utc>,
    pub params: String,
    pub rows_train: usize,
    pub rows_test: usize,
    pub holdout: Option<Metrics>,
}

/// The serialized model file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub columns: Vec<String>,
    #[serde(default)]
    pub training: Option<TrainingInfo>,
    pub model: Model,
}

impl ModelArtifact {
    pub fn new(schema: &FeatureSchema, model: Model, training: Option<TrainingInfo>) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            columns: schema.names().map(str::to_string).collect(),
            training,
            model,
        }
    }

    /// Check internal consistency (format, column count, model structure).
    pub fn validate(&self) -> Result<(), AppError> {
        if self.format_version != FORMAT_VERSION {
            return Err(AppError::input(format!(
                "Unsupported model format_version {} (expected {FORMAT_VERSION}).",
                self.format_version
            )));
        }
        if self.columns.is_empty() {
            return Err(AppError::input("Model artifact lists no columns."));
        }
        if self.model.n_features() != self.columns.len() {
            return Err(AppError::input(format!(
                "Model expects {} features but the artifact lists {} columns.",
                self.model.n_features(),
                self.columns.len()
            )));
        }
        self.model.validate()
    }

    /// The schema this model was fit on.
    pub fn schema(&self) -> Result<FeatureSchema, AppError> {
        FeatureSchema::from_names(&self.columns)
    }

    /// Fail unless `schema` has exactly the artifact's columns in the same order.
    pub fn check_schema(&self, schema: &FeatureSchema) -> Result<(), AppError> {
        let names: Vec<&str> = schema.names().collect();
        let first_diff = self
            .columns
            .iter()
            .zip(&names)
            .position(|(a, b)| a != b);

        match first_diff {
            Some(i) => Err(AppError::input(format!(
                "Schema mismatch at column {i}: model has `{}`, schema has `{}`.",
                self.columns[i], names[i]
            ))),
            None if self.columns.len() != names.len() => Err(AppError::input(format!(
                "Schema mismatch: model has {} columns, schema has {}.",
                self.columns.len(),
                names.len()
            ))),
            None => Ok(()),
        }
    }

    /// Predict and require a finite result.
    pub fn predict_checked(&self, features: &[f64]) -> Result<f64, AppError> {
        let y = self.model.predict(features);
        if !y.is_finite() {
            return Err(AppError::runtime("Model produced a non-finite prediction."));
        }
        Ok(y)
    }
}

impl Regressor for ModelArtifact {
    fn n_features(&self) -> usize {
        self.model.n_features()
    }

    fn predict(&self, features: &[f64]) -> f64 {
        self.model.predict(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny_schema() -> FeatureSchema {
        FeatureSchema::from_names(["town_BEDOK", "floor_area_sqm"]).unwrap()
    }

    fn tiny_artifact() -> ModelArtifact {
        ModelArtifact::new(
            &tiny_schema(),
            Model::Linear(LinearModel {
                intercept: 1000.0,
                coefficients: vec![500.0, 10.0],
            }),
            None,
        )
    }

    #[test]
    fn artifact_round_trips_through_json() {
        let artifact = tiny_artifact();
        let json = serde_json::to_string(&artifact).unwrap();
        assert!(json.contains(r#""kind":"linear""#));
        let back: ModelArtifact = serde_json::from_str(&json).unwrap();
        assert_eq!(back, artifact);
    }

    #[test]
    fn check_schema_accepts_identical() {
        tiny_artifact().check_schema(&tiny_schema()).unwrap();
    }

    #[test]
    fn check_schema_reports_reordering() {
        let swapped = FeatureSchema::from_names(["floor_area_sqm", "town_BEDOK"]).unwrap();
        let err = tiny_artifact().check_schema(&swapped).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("column 0"));
    }

    #[test]
    fn check_schema_reports_missing_columns() {
        let longer = FeatureSchema::from_names(["town_BEDOK", "floor_area_sqm", "lease_commence_date"]).unwrap();
        let err = tiny_artifact().check_schema(&longer).unwrap_err();
        assert!(err.message().contains("2 columns"));
    }

    #[test]
    fn validate_rejects_feature_count_mismatch() {
        let mut artifact = tiny_artifact();
        artifact.columns.push("lease_commence_date".to_string());
        assert!(artifact.validate().is_err());
    }

    #[test]
    fn predict_checked_rejects_nan() {
        let artifact = tiny_artifact();
        assert_eq!(artifact.predict_checked(&[1.0, 90.0]).unwrap(), 2400.0);
        assert_eq!(artifact.predict_checked(&[1.0]).unwrap_err().exit_code(), 4);
    }
}
