//! Feature schema and alignment.

pub mod align;
pub mod schema;

pub use align::*;
pub use schema::*;
