//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - loads the dataset and model artifact
//! - prints predictions, comparables and the price histogram
//! - trains model artifacts

use clap::Parser;
use tracing::info;

use crate::cli::{Command, DataArgs, EncodeArgs, InputArgs, PredictArgs, SchemaArgs, TrainArgs};
use crate::config::{load_dotenv, log_dir, resolve_paths};
use crate::domain::RawInput;
use crate::error::AppError;
use crate::features::{ColumnKind, FeatureSchema, align};
use crate::io::{load_dataset, read_artifact_json, write_artifact_json, write_prediction_json};
use crate::model::{TrainConfig, TreeParams, train_artifact};

pub mod pipeline;

use pipeline::{AppContext, run_prediction};

/// Entry point for the `resale` binary.
pub fn run() -> Result<(), AppError> {
    load_dotenv();

    // We want `resale` and `resale --data x.csv` to behave like `resale tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing.
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    // The TUI owns the terminal and sets up file logging itself.
    if !matches!(cli.command, Command::Tui(_)) {
        crate::logging::init_cli_logging();
    }

    match cli.command {
        Command::Tui(args) => handle_tui(args),
        Command::Predict(args) => handle_predict(args),
        Command::Encode(args) => handle_encode(args),
        Command::Schema(args) => handle_schema(args),
        Command::Train(args) => handle_train(args),
    }
}

fn handle_tui(args: DataArgs) -> Result<(), AppError> {
    crate::logging::init_tui_logging(&log_dir());
    let paths = resolve_paths(&args);
    let ctx = AppContext::load(&paths)?;
    crate::tui::run(ctx)
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let paths = resolve_paths(&args.data);
    let ctx = AppContext::load(&paths)?;
    let input = raw_input_from_args(&args.input)?;
    let output = run_prediction(&ctx, input)?;

    println!("{}", crate::report::format_context_summary(&ctx.dataset, &ctx.model));
    print!("{}", crate::report::format_prediction(&output));
    println!("{}", crate::report::format_comparables(&output));

    if !args.no_plot {
        let plot = crate::plot::render_ascii_histogram(&ctx.histogram, output.price, args.width, args.height);
        println!("{plot}");
    }

    if let Some(path) = &args.export {
        write_prediction_json(path, &output, &ctx.histogram)?;
        info!(path = %path.display(), "prediction exported");
    }
    Ok(())
}

fn handle_encode(args: EncodeArgs) -> Result<(), AppError> {
    let schema = match (&args.model, &args.schema) {
        (Some(model), _) => read_artifact_json(model)?.schema()?,
        (None, Some(path)) => FeatureSchema::read_json(path)?,
        (None, None) => FeatureSchema::default_resale(),
    };
    let input = raw_input_from_args(&args.input)?;
    let report = align(&input, &schema);

    println!("Vector length: {}", report.vector.len());
    if args.all {
        for (name, value) in schema.names().zip(report.vector.as_slice()) {
            println!("{name:<40} {value}");
        }
    } else {
        for (name, value) in report.vector.non_zero(&schema) {
            println!("{name:<40} {value}");
        }
    }
    eprint!("{}", crate::report::format_unmatched(&report.unmatched));
    Ok(())
}

fn handle_schema(args: SchemaArgs) -> Result<(), AppError> {
    let schema = match &args.model {
        Some(path) => read_artifact_json(path)?.schema()?,
        None => FeatureSchema::default_resale(),
    };

    println!("Columns: {}", schema.len());
    for (i, column) in schema.columns().iter().enumerate() {
        let kind = match &column.kind {
            ColumnKind::Indicator { field, .. } => format!("indicator ({})", field.column()),
            ColumnKind::Numeric(_) => "numeric".to_string(),
            ColumnKind::Other => "unused".to_string(),
        };
        println!("{i:>3} {:<40} {kind}", column.name);
    }
    Ok(())
}

fn handle_train(args: TrainArgs) -> Result<(), AppError> {
    let paths = resolve_paths(&DataArgs {
        data: args.data.clone(),
        ..DataArgs::default()
    });
    let dataset = load_dataset(&paths.data)?;
    let schema = match &args.schema {
        Some(path) => FeatureSchema::read_json(path)?,
        None => FeatureSchema::default_resale(),
    };

    let config = train_config_from_args(&args);
    let artifact = train_artifact(&dataset.listings, &schema, &config)?;
    write_artifact_json(&args.out, &artifact)?;

    println!("{}", crate::report::format_context_summary(&dataset, &artifact));
    if let Some(training) = &artifact.training {
        println!("Rows: train={} test={}", training.rows_train, training.rows_test);
        match &training.holdout {
            Some(m) => {
                let r2 = m.r2.map(|v| format!("{v:.4}")).unwrap_or_else(|| "n/a".to_string());
                println!(
                    "Holdout: RMSE={} MAE={} R2={r2}",
                    crate::report::format_price(m.rmse),
                    crate::report::format_price(m.mae)
                );
            }
            None => println!("Holdout: none (test fraction 0)"),
        }
    }
    println!("Wrote {}", args.out.display());
    Ok(())
}

fn raw_input_from_args(args: &InputArgs) -> Result<RawInput, AppError> {
    RawInput::new(
        args.town.trim(),
        args.flat_type.trim(),
        args.storey_range.trim(),
        args.floor_area,
        args.lease_year,
    )
}

pub fn train_config_from_args(args: &TrainArgs) -> TrainConfig {
    TrainConfig {
        model: args.kind,
        tree: TreeParams {
            max_depth: args.max_depth,
            min_samples_split: args.min_samples_split,
            min_samples_leaf: args.min_samples_leaf,
        },
        test_fraction: args.test_fraction,
        seed: args.seed,
    }
}

/// Rewrite argv so `resale` defaults to `resale tui`.
///
/// Rules:
/// - `resale`                      -> `resale tui`
/// - `resale --data x.csv ...`     -> `resale tui --data x.csv ...`
/// - `resale --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "tui" | "predict" | "encode" | "schema" | "train");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_tui() {
        assert_eq!(rewrite_args(args(&["resale"])), args(&["resale", "tui"]));
    }

    #[test]
    fn leading_flag_goes_to_tui() {
        assert_eq!(
            rewrite_args(args(&["resale", "--data", "x.csv"])),
            args(&["resale", "tui", "--data", "x.csv"])
        );
    }

    #[test]
    fn subcommands_and_help_untouched() {
        for v in [
            &["resale", "predict", "--town", "BEDOK"][..],
            &["resale", "train"][..],
            &["resale", "--help"][..],
            &["resale", "-V"][..],
        ] {
            assert_eq!(rewrite_args(args(v)), args(v));
        }
    }

    #[test]
    fn train_config_maps_flags() {
        let cli = crate::cli::Cli::try_parse_from([
            "resale", "train", "--kind", "linear", "--max-depth", "4", "--test-fraction", "0.1", "--seed", "7",
        ])
        .unwrap();
        let Command::Train(train) = cli.command else {
            panic!("expected train");
        };
        let config = train_config_from_args(&train);
        assert_eq!(config.model, crate::domain::ModelChoice::Linear);
        assert_eq!(config.tree.max_depth, 4);
        assert_eq!(config.test_fraction, 0.1);
        assert_eq!(config.seed, 7);
    }

    #[test]
    fn input_args_are_trimmed_and_bounded() {
        let good = InputArgs {
            town: " BEDOK ".to_string(),
            flat_type: "4 ROOM".to_string(),
            storey_range: "04 TO 06".to_string(),
            floor_area: 90.0,
            lease_year: 1995,
        };
        assert_eq!(raw_input_from_args(&good).unwrap().town(), "BEDOK");

        let bad = InputArgs {
            floor_area: 5.0,
            ..good
        };
        assert_eq!(raw_input_from_args(&bad).unwrap_err().exit_code(), 2);
    }
}
