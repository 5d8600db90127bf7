//! Fit a model artifact from historical listings.
//!
//! Workflow: encode listings -> seeded shuffle -> train/holdout split -> fit ->
//! holdout metrics -> artifact.

use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::domain::{Listing, ModelChoice};
use crate::error::AppError;
use crate::features::{FeatureSchema, encode_listings};
use crate::model::{
    LinearModel, Metrics, Model, ModelArtifact, RegressionTree, Regressor, TrainingInfo, TreeParams,
};

#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub model: ModelChoice,
    pub tree: TreeParams,
    /// Share of rows held out for evaluation, in `[0, 1)`.
    pub test_fraction: f64,
    pub seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            model: ModelChoice::Tree,
            tree: TreeParams::default(),
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

impl TrainConfig {
    fn describe(&self) -> String {
        match self.model {
            ModelChoice::Tree => format!(
                "tree(max_depth={}, min_samples_split={}, min_samples_leaf={}, seed={})",
                self.tree.max_depth, self.tree.min_samples_split, self.tree.min_samples_leaf, self.seed
            ),
            ModelChoice::Linear => format!("linear(seed={})", self.seed),
        }
    }
}

/// Train a model on `listings` encoded with `schema`.
pub fn train_artifact(
    listings: &[Listing],
    schema: &FeatureSchema,
    config: &TrainConfig,
) -> Result<ModelArtifact, AppError> {
    if !(0.0..1.0).contains(&config.test_fraction) {
        return Err(AppError::input(format!(
            "test_fraction must be in [0, 1), got {}.",
            config.test_fraction
        )));
    }
    if listings.is_empty() {
        return Err(AppError::no_data("No listings to train on."));
    }

    let rows = encode_listings(listings, schema);
    let targets: Vec<f64> = listings.iter().map(|l| l.resale_price).collect();

    let (train_idx, test_idx) = split_indices(listings.len(), config.test_fraction, config.seed);
    info!(
        train = train_idx.len(),
        test = test_idx.len(),
        features = schema.len(),
        "training {}",
        config.describe()
    );

    let x_train: Vec<Vec<f64>> = train_idx.iter().map(|&i| rows[i].clone()).collect();
    let y_train: Vec<f64> = train_idx.iter().map(|&i| targets[i]).collect();

    let model = match config.model {
        ModelChoice::Tree => {
            let tree = RegressionTree::fit(&x_train, &y_train, config.tree)?;
            debug!(nodes = tree.nodes.len(), depth = tree.depth(), leaves = tree.leaf_count(), "tree grown");
            Model::DecisionTree(tree)
        }
        ModelChoice::Linear => Model::Linear(LinearModel::fit(&x_train, &y_train)?),
    };

    let holdout = if test_idx.is_empty() {
        None
    } else {
        let predicted: Vec<f64> = test_idx.iter().map(|&i| model.predict(&rows[i])).collect();
        let actual: Vec<f64> = test_idx.iter().map(|&i| targets[i]).collect();
        Some(compute_metrics(&actual, &predicted))
    };
    if let Some(m) = &holdout {
        info!(rmse = m.rmse, mae = m.mae, r2 = ?m.r2, "holdout metrics");
    }

    let training = TrainingInfo {
        trained_at: Utc::now(),
        params: config.describe(),
        rows_train: train_idx.len(),
        rows_test: test_idx.len(),
        holdout,
    };

    let artifact = ModelArtifact::new(schema, model, Some(training));
    artifact.validate()?;
    Ok(artifact)
}

/// Deterministic shuffle + split. At least one row always stays in training.
fn split_indices(n: usize, test_fraction: f64, seed: u64) -> (Vec<usize>, Vec<usize>) {
    let mut idx: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    idx.shuffle(&mut rng);

    let n_test = ((n as f64) * test_fraction).round() as usize;
    let n_test = n_test.min(n.saturating_sub(1));
    let test = idx.split_off(n - n_test);
    (idx, test)
}

pub fn compute_metrics(actual: &[f64], predicted: &[f64]) -> Metrics {
    let n = actual.len().max(1) as f64;
    let mut sse = 0.0;
    let mut sae = 0.0;
    for (a, p) in actual.iter().zip(predicted) {
        sse += (a - p).powi(2);
        sae += (a - p).abs();
    }

    let mean = actual.iter().sum::<f64>() / n;
    let sst: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let r2 = (sst > 0.0).then(|| 1.0 - sse / sst);

    Metrics {
        rmse: (sse / n).sqrt(),
        mae: sae / n,
        r2,
    }
}
