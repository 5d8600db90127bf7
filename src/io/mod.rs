//! Input/output helpers.
//!
//! - dataset CSV ingest + validation (`dataset`)
//! - model artifact JSON read/write (`artifact`)
//! - prediction report export (`export`)

pub mod artifact;
pub mod dataset;
pub mod export;

pub use artifact::*;
pub use dataset::*;
pub use export::*;
