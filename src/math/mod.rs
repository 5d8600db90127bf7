//! Numerical utilities.

pub mod ols;

pub use ols::*;
