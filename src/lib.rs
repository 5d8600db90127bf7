//! `resale-price` library crate.
//!
//! The binary (`resale`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the CLI and the TUI share one prediction pipeline
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod features;
pub mod io;
pub mod logging;
pub mod math;
pub mod model;
pub mod plot;
pub mod report;
pub mod tui;
