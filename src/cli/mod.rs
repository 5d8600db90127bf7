//! Command-line parsing for the resale price predictor.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the encoding/modeling code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{DEFAULT_FLOOR_AREA, DEFAULT_LEASE_YEAR, ModelChoice};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "resale", version, about = "Flat resale price predictor")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Predict a resale price and print comparable listings and the price distribution.
    Predict(PredictArgs),
    /// Print the feature vector a request encodes to (non-zero columns).
    Encode(EncodeArgs),
    /// Print the feature schema columns.
    Schema(SchemaArgs),
    /// Fit a model artifact from the listings dataset.
    Train(TrainArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same prediction pipeline as `resale predict`, but renders the
    /// form and results in a terminal UI using Ratatui.
    Tui(DataArgs),
}

/// Locations of the read-only inputs (flag > env > default).
#[derive(Debug, Args, Clone, Default)]
pub struct DataArgs {
    /// Listings CSV (env: RESALE_DATA, default: resale.csv).
    #[arg(long, value_name = "CSV")]
    pub data: Option<PathBuf>,

    /// Model artifact JSON (env: RESALE_MODEL, default: model.json).
    #[arg(long, value_name = "JSON")]
    pub model: Option<PathBuf>,

    /// Schema override: JSON array of column names (env: RESALE_SCHEMA).
    #[arg(long, value_name = "JSON")]
    pub schema: Option<PathBuf>,
}

/// Attributes of the flat to price.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Town (e.g. "BEDOK").
    #[arg(long)]
    pub town: String,

    /// Flat type (e.g. "4 ROOM").
    #[arg(long)]
    pub flat_type: String,

    /// Storey range (e.g. "04 TO 06").
    #[arg(long)]
    pub storey_range: String,

    /// Floor area in square metres (30-370).
    #[arg(long, default_value_t = DEFAULT_FLOOR_AREA)]
    pub floor_area: f64,

    /// Lease commencement year (1930-2020).
    #[arg(long, default_value_t = DEFAULT_LEASE_YEAR)]
    pub lease_year: i32,
}

#[derive(Debug, Args, Clone)]
pub struct PredictArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub input: InputArgs,

    /// Disable the terminal histogram.
    #[arg(long)]
    pub no_plot: bool,

    /// Histogram width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Histogram height (rows).
    #[arg(long, default_value_t = 15)]
    pub height: usize,

    /// Write the prediction report to JSON.
    #[arg(long, value_name = "JSON")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct EncodeArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Take the schema from this model artifact.
    #[arg(long, value_name = "JSON")]
    pub model: Option<PathBuf>,

    /// Take the schema from this JSON array of column names.
    #[arg(long, value_name = "JSON", conflicts_with = "model")]
    pub schema: Option<PathBuf>,

    /// Print every column, including zeros.
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Args, Clone)]
pub struct SchemaArgs {
    /// Print the columns of this model artifact instead of the built-in schema.
    #[arg(long, value_name = "JSON")]
    pub model: Option<PathBuf>,
}

#[derive(Debug, Args, Clone)]
pub struct TrainArgs {
    /// Listings CSV (env: RESALE_DATA, default: resale.csv).
    #[arg(long, value_name = "CSV")]
    pub data: Option<PathBuf>,

    /// Schema to encode with (JSON array of column names); built-in schema if omitted.
    #[arg(long, value_name = "JSON")]
    pub schema: Option<PathBuf>,

    /// Output model artifact.
    #[arg(long, value_name = "JSON", default_value = "model.json")]
    pub out: PathBuf,

    /// Model family.
    #[arg(long, value_enum, default_value_t = ModelChoice::Tree)]
    pub kind: ModelChoice,

    /// Maximum tree depth.
    #[arg(long, default_value_t = 12)]
    pub max_depth: usize,

    /// Minimum rows a node needs before it may split.
    #[arg(long, default_value_t = 2)]
    pub min_samples_split: usize,

    /// Minimum rows per leaf.
    #[arg(long, default_value_t = 1)]
    pub min_samples_leaf: usize,

    /// Share of rows held out for evaluation.
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    /// Shuffle seed for the holdout split.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predict_parses_input_flags() {
        let cli = Cli::try_parse_from([
            "resale",
            "predict",
            "--town",
            "BEDOK",
            "--flat-type",
            "4 ROOM",
            "--storey-range",
            "04 TO 06",
            "--floor-area",
            "90",
            "--lease-year",
            "1995",
            "--model",
            "m.json",
        ])
        .unwrap();

        let Command::Predict(args) = cli.command else {
            panic!("expected predict");
        };
        assert_eq!(args.input.town, "BEDOK");
        assert_eq!(args.input.floor_area, 90.0);
        assert_eq!(args.input.lease_year, 1995);
        assert_eq!(args.data.model, Some(PathBuf::from("m.json")));
        assert_eq!(args.data.data, None);
        assert!(!args.no_plot);
    }

    #[test]
    fn train_defaults() {
        let cli = Cli::try_parse_from(["resale", "train"]).unwrap();
        let Command::Train(args) = cli.command else {
            panic!("expected train");
        };
        assert_eq!(args.kind, ModelChoice::Tree);
        assert_eq!(args.out, PathBuf::from("model.json"));
        assert_eq!(args.max_depth, 12);
        assert_eq!(args.test_fraction, 0.2);
    }

    #[test]
    fn encode_rejects_model_and_schema_together() {
        let res = Cli::try_parse_from([
            "resale", "encode", "--town", "BEDOK", "--flat-type", "4 ROOM", "--storey-range", "04 TO 06",
            "--model", "a.json", "--schema", "b.json",
        ]);
        assert!(res.is_err());
    }
}
