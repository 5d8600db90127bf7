//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - built from form selections or CLI flags
//! - encoded into feature vectors
//! - exported to JSON alongside a prediction

use std::ops::RangeInclusive;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Valid floor areas (square metres).
pub const FLOOR_AREA_RANGE: RangeInclusive<f64> = 30.0..=370.0;

/// Valid lease commencement years.
pub const LEASE_YEAR_RANGE: RangeInclusive<i32> = 1930..=2020;

/// Initial floor area shown in the form.
pub const DEFAULT_FLOOR_AREA: f64 = 100.0;

/// Initial lease commencement year shown in the form.
pub const DEFAULT_LEASE_YEAR: i32 = 2000;

/// A categorical attribute that is one-hot encoded into indicator columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoricalField {
    Town,
    FlatType,
    StoreyRange,
    /// Present in the dataset and the schema, never supplied by a request.
    FlatModel,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 4] = [
        CategoricalField::Town,
        CategoricalField::FlatType,
        CategoricalField::StoreyRange,
        CategoricalField::FlatModel,
    ];

    /// Column name prefix used by the indicator columns (`town_BEDOK`).
    pub fn prefix(self) -> &'static str {
        match self {
            CategoricalField::Town => "town_",
            CategoricalField::FlatType => "flat_type_",
            CategoricalField::StoreyRange => "storey_range_",
            CategoricalField::FlatModel => "flat_model_",
        }
    }

    /// Dataset column holding the raw value.
    pub fn column(self) -> &'static str {
        match self {
            CategoricalField::Town => "town",
            CategoricalField::FlatType => "flat_type",
            CategoricalField::StoreyRange => "storey_range",
            CategoricalField::FlatModel => "flat_model",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            CategoricalField::Town => "Town",
            CategoricalField::FlatType => "Flat Type",
            CategoricalField::StoreyRange => "Storey Range",
            CategoricalField::FlatModel => "Flat Model",
        }
    }
}

/// A numeric attribute copied verbatim into the feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    FloorAreaSqm,
    LeaseCommenceDate,
}

impl NumericField {
    pub const ALL: [NumericField; 2] = [NumericField::FloorAreaSqm, NumericField::LeaseCommenceDate];

    /// Schema column name (identical to the dataset column name).
    pub fn column(self) -> &'static str {
        match self {
            NumericField::FloorAreaSqm => "floor_area_sqm",
            NumericField::LeaseCommenceDate => "lease_commence_date",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.column() == name)
    }
}

/// Which regression model `train` fits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelChoice {
    /// CART regression tree.
    Tree,
    /// Ordinary least squares with intercept.
    Linear,
}

/// One prediction request.
///
/// Built once per interaction and never mutated; bounds are checked at
/// construction so everything downstream can assume valid values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawInput {
    town: String,
    flat_type: String,
    storey_range: String,
    floor_area_sqm: f64,
    lease_commence_date: i32,
}

impl RawInput {
    pub fn new(
        town: impl Into<String>,
        flat_type: impl Into<String>,
        storey_range: impl Into<String>,
        floor_area_sqm: f64,
        lease_commence_date: i32,
    ) -> Result<Self, AppError> {
        if !floor_area_sqm.is_finite() || !FLOOR_AREA_RANGE.contains(&floor_area_sqm) {
            return Err(AppError::input(format!(
                "Floor area {floor_area_sqm} sqm is outside {}..={}.",
                FLOOR_AREA_RANGE.start(),
                FLOOR_AREA_RANGE.end()
            )));
        }
        if !LEASE_YEAR_RANGE.contains(&lease_commence_date) {
            return Err(AppError::input(format!(
                "Lease commence date {lease_commence_date} is outside {}..={}.",
                LEASE_YEAR_RANGE.start(),
                LEASE_YEAR_RANGE.end()
            )));
        }

        Ok(Self {
            town: town.into(),
            flat_type: flat_type.into(),
            storey_range: storey_range.into(),
            floor_area_sqm,
            lease_commence_date,
        })
    }

    pub fn town(&self) -> &str {
        &self.town
    }

    pub fn flat_type(&self) -> &str {
        &self.flat_type
    }

    pub fn storey_range(&self) -> &str {
        &self.storey_range
    }

    pub fn floor_area_sqm(&self) -> f64 {
        self.floor_area_sqm
    }

    pub fn lease_commence_date(&self) -> i32 {
        self.lease_commence_date
    }

    /// Value supplied for a categorical field, if the request carries it.
    pub fn categorical(&self, field: CategoricalField) -> Option<&str> {
        match field {
            CategoricalField::Town => Some(&self.town),
            CategoricalField::FlatType => Some(&self.flat_type),
            CategoricalField::StoreyRange => Some(&self.storey_range),
            CategoricalField::FlatModel => None,
        }
    }

    pub fn numeric(&self, field: NumericField) -> f64 {
        match field {
            NumericField::FloorAreaSqm => self.floor_area_sqm,
            NumericField::LeaseCommenceDate => f64::from(self.lease_commence_date),
        }
    }
}

/// A historical resale transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    /// First day of the transaction month.
    pub month: NaiveDate,
    pub town: String,
    pub flat_type: String,
    pub storey_range: String,
    pub flat_model: Option<String>,
    pub floor_area_sqm: f64,
    pub lease_commence_date: i32,
    pub resale_price: f64,
}

impl Listing {
    pub fn categorical(&self, field: CategoricalField) -> Option<&str> {
        match field {
            CategoricalField::Town => Some(&self.town),
            CategoricalField::FlatType => Some(&self.flat_type),
            CategoricalField::StoreyRange => Some(&self.storey_range),
            CategoricalField::FlatModel => self.flat_model.as_deref(),
        }
    }

    pub fn numeric(&self, field: NumericField) -> f64 {
        match field {
            NumericField::FloorAreaSqm => self.floor_area_sqm,
            NumericField::LeaseCommenceDate => f64::from(self.lease_commence_date),
        }
    }
}
