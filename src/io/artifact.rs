//! Read/write model artifact JSON files.
//!
//! The artifact is the portable representation of a trained model:
//! - the ordered schema columns it was fit on
//! - training metadata (parameters, holdout metrics)
//! - the model itself (tree nodes or linear coefficients)
//!
//! The schema is defined by `model::ModelArtifact`.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use tracing::info;

use crate::error::AppError;
use crate::model::{ModelArtifact, Regressor};

/// Write a model artifact as pretty JSON.
pub fn write_artifact_json(path: &Path, artifact: &ModelArtifact) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create model file '{}': {e}", path.display())))?;

    serde_json::to_writer_pretty(BufWriter::new(file), artifact)
        .map_err(|e| AppError::input(format!("Failed to write model JSON: {e}")))?;

    info!(path = %path.display(), kind = artifact.model.display_name(), "model written");
    Ok(())
}

/// Read and validate a model artifact.
pub fn read_artifact_json(path: &Path) -> Result<ModelArtifact, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open model '{}': {e}", path.display())))?;
    let artifact: ModelArtifact = serde_json::from_reader(std::io::BufReader::new(file))
        .map_err(|e| AppError::input(format!("Invalid model JSON '{}': {e}", path.display())))?;
    artifact.validate()?;

    info!(
        path = %path.display(),
        kind = artifact.model.display_name(),
        features = artifact.n_features(),
        "model loaded"
    );
    Ok(artifact)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureSchema;
    use crate::model::{Model, RegressionTree, TreeNode};

    #[test]
    fn write_then_read() {
        let schema = FeatureSchema::from_names(["town_BEDOK", "floor_area_sqm"]).unwrap();
        let artifact = ModelArtifact::new(
            &schema,
            Model::DecisionTree(RegressionTree {
                n_features: 2,
                nodes: vec![
                    TreeNode::Split {
                        feature: 0,
                        threshold: 0.5,
                        left: 1,
                        right: 2,
                    },
                    TreeNode::Leaf { value: 400_000.0, samples: 3 },
                    TreeNode::Leaf { value: 350_000.0, samples: 2 },
                ],
            }),
            None,
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        write_artifact_json(&path, &artifact).unwrap();

        let back = read_artifact_json(&path).unwrap();
        assert_eq!(back, artifact);
        assert_eq!(back.predict(&[1.0, 80.0]), 350_000.0);
    }

    #[test]
    fn read_rejects_invalid_structure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(
            &path,
            r#"{"format_version":1,"columns":["a"],"model":{"kind":"linear","intercept":0.0,"coefficients":[1.0,2.0]}}"#,
        )
        .unwrap();

        let err = read_artifact_json(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.message().contains("expects 2 features"));
    }

    #[test]
    fn read_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "not json").unwrap();
        assert!(read_artifact_json(&path).unwrap_err().message().contains("Invalid model JSON"));
    }
}
