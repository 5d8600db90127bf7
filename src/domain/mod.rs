//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the categorical/numeric fields a flat is described by (`CategoricalField`, `NumericField`)
//! - a single user request (`RawInput`) and its validated bounds
//! - historical listings (`Listing`) read from the dataset

pub mod types;

pub use types::*;
