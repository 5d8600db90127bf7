//! Feature alignment: sparse record -> dense one-hot vector in schema order.
//!
//! For each schema column:
//!
//! - `Indicator { field, value }`: `1.0` if the record's field equals `value`, else `0.0`
//! - `Numeric(field)`: the record's value, unchanged
//! - `Other`: `0.0`
//!
//! A categorical value with no matching indicator column leaves its whole block
//! at zero. That is not an error; the field is reported in `AlignReport::unmatched`
//! so callers can surface it.

use serde::Serialize;
use tracing::warn;

use crate::domain::{CategoricalField, Listing, NumericField, RawInput};
use crate::features::schema::{ColumnKind, FeatureSchema};

/// Anything that can be encoded against a schema.
pub trait FeatureSource {
    fn categorical(&self, field: CategoricalField) -> Option<&str>;
    fn numeric(&self, field: NumericField) -> f64;
}

impl FeatureSource for RawInput {
    fn categorical(&self, field: CategoricalField) -> Option<&str> {
        RawInput::categorical(self, field)
    }

    fn numeric(&self, field: NumericField) -> f64 {
        RawInput::numeric(self, field)
    }
}

impl FeatureSource for Listing {
    fn categorical(&self, field: CategoricalField) -> Option<&str> {
        Listing::categorical(self, field)
    }

    fn numeric(&self, field: NumericField) -> f64 {
        Listing::numeric(self, field)
    }
}

/// Dense feature row, one entry per schema column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    values: Vec<f64>,
}

impl FeatureVector {
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_inner(self) -> Vec<f64> {
        self.values
    }

    /// Value of a named column.
    pub fn get(&self, schema: &FeatureSchema, name: &str) -> Option<f64> {
        schema.position(name).and_then(|i| self.values.get(i).copied())
    }

    /// `(column, value)` pairs for every non-zero entry, in schema order.
    pub fn non_zero<'a>(&'a self, schema: &'a FeatureSchema) -> Vec<(&'a str, f64)> {
        schema
            .names()
            .zip(self.values.iter().copied())
            .filter(|(_, v)| *v != 0.0)
            .collect()
    }
}

/// A categorical value the schema has no indicator column for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Unmatched {
    pub field: CategoricalField,
    pub value: String,
}

/// Aligned vector plus the values that fell outside the schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlignReport {
    pub vector: FeatureVector,
    pub unmatched: Vec<Unmatched>,
}

/// Encode a record against the schema.
pub fn encode<S: FeatureSource + ?Sized>(record: &S, schema: &FeatureSchema) -> FeatureVector {
    let values = schema
        .columns()
        .iter()
        .map(|column| match &column.kind {
            ColumnKind::Indicator { field, value } => {
                if record.categorical(*field) == Some(value.as_str()) {
                    1.0
                } else {
                    0.0
                }
            }
            ColumnKind::Numeric(field) => record.numeric(*field),
            ColumnKind::Other => 0.0,
        })
        .collect();

    FeatureVector { values }
}

/// Categorical values of `record` that the schema declares indicators for the
/// field, but not for this value.
pub fn unmatched_values<S: FeatureSource + ?Sized>(record: &S, schema: &FeatureSchema) -> Vec<Unmatched> {
    CategoricalField::ALL
        .into_iter()
        .filter_map(|field| {
            let value = record.categorical(field)?;
            let declared = !schema.indicator_values(field).is_empty();
            (declared && !schema.has_indicator(field, value)).then(|| Unmatched {
                field,
                value: value.to_string(),
            })
        })
        .collect()
}

/// Align a single request (the inference path).
pub fn align(input: &RawInput, schema: &FeatureSchema) -> AlignReport {
    let vector = encode(input, schema);
    let unmatched = unmatched_values(input, schema);

    for u in &unmatched {
        warn!(
            field = u.field.column(),
            value = %u.value,
            "value has no schema column; indicator block left at zero"
        );
    }

    AlignReport { vector, unmatched }
}

/// Encode many listings into a row-major design matrix (the training path).
pub fn encode_listings(listings: &[Listing], schema: &FeatureSchema) -> Vec<Vec<f64>> {
    listings
        .iter()
        .map(|l| encode(l, schema).into_inner())
        .collect()
}
