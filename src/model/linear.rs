//! Linear regression model (intercept + one coefficient per column).

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::math::fit_ols_with_intercept;
use crate::model::Regressor;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl LinearModel {
    pub fn fit(rows: &[Vec<f64>], y: &[f64]) -> Result<Self, AppError> {
        if rows.is_empty() || rows.len() != y.len() {
            return Err(AppError::runtime(format!(
                "Cannot fit linear model: {} rows vs {} targets.",
                rows.len(),
                y.len()
            )));
        }
        let (intercept, coefficients) = fit_ols_with_intercept(rows, y)
            .ok_or_else(|| AppError::runtime("Least squares solve failed (ill-conditioned design)."))?;
        Ok(Self {
            intercept,
            coefficients,
        })
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !self.intercept.is_finite() || self.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(AppError::input("Linear model has non-finite parameters."));
        }
        Ok(())
    }
}

impl Regressor for LinearModel {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[f64]) -> f64 {
        if features.len() != self.coefficients.len() {
            return f64::NAN;
        }
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(b, x)| b * x)
                .sum::<f64>()
    }
}
