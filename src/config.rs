//! Input path resolution.
//!
//! Each path is taken from the CLI flag when given, else from the environment
//! (a `.env` file in the working directory is honored), else a default.

use std::path::PathBuf;

use crate::cli::DataArgs;

pub const ENV_DATA: &str = "RESALE_DATA";
pub const ENV_MODEL: &str = "RESALE_MODEL";
pub const ENV_SCHEMA: &str = "RESALE_SCHEMA";
pub const ENV_LOG_DIR: &str = "RESALE_LOG_DIR";

pub const DEFAULT_DATA: &str = "resale.csv";
pub const DEFAULT_MODEL: &str = "model.json";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Fully resolved input locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub data: PathBuf,
    pub model: PathBuf,
    /// Optional schema override; `None` uses the model artifact's columns.
    pub schema: Option<PathBuf>,
}

/// Load `.env` (if present) into the process environment.
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Resolve paths against the process environment.
pub fn resolve_paths(args: &DataArgs) -> ResolvedPaths {
    resolve_paths_with(args, |key| std::env::var(key).ok())
}

/// Resolve paths with an explicit environment lookup.
pub fn resolve_paths_with(args: &DataArgs, env: impl Fn(&str) -> Option<String>) -> ResolvedPaths {
    let lookup = |flag: &Option<PathBuf>, key: &str| -> Option<PathBuf> {
        flag.clone()
            .or_else(|| env(key).filter(|v| !v.trim().is_empty()).map(PathBuf::from))
    };

    ResolvedPaths {
        data: lookup(&args.data, ENV_DATA).unwrap_or_else(|| PathBuf::from(DEFAULT_DATA)),
        model: lookup(&args.model, ENV_MODEL).unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL)),
        schema: lookup(&args.schema, ENV_SCHEMA),
    }
}

/// Directory for TUI log files.
pub fn log_dir() -> PathBuf {
    std::env::var(ENV_LOG_DIR)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn defaults_when_nothing_set() {
        let paths = resolve_paths_with(&DataArgs::default(), no_env);
        assert_eq!(paths.data, PathBuf::from("resale.csv"));
        assert_eq!(paths.model, PathBuf::from("model.json"));
        assert_eq!(paths.schema, None);
    }

    #[test]
    fn env_overrides_default_and_flag_overrides_env() {
        let env = |key: &str| match key {
            ENV_DATA => Some("/data/hdb.csv".to_string()),
            ENV_MODEL => Some("/models/tree.json".to_string()),
            ENV_SCHEMA => Some("  ".to_string()),
            _ => None,
        };
        let args = DataArgs {
            data: Some(PathBuf::from("local.csv")),
            model: None,
            schema: None,
        };

        let paths = resolve_paths_with(&args, env);
        assert_eq!(paths.data, PathBuf::from("local.csv"));
        assert_eq!(paths.model, PathBuf::from("/models/tree.json"));
        assert_eq!(paths.schema, None);
    }
}
