//! `tracing` subscriber set-up.
//!
//! CLI commands log to stderr. The TUI owns the terminal, so it logs to a daily
//! rolling file instead (or not at all when the directory is not writable).

use std::path::Path;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "warn,resale_price=info";

const LOG_FILE_PREFIX: &str = "resale.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Stderr logging for one-shot commands.
pub fn init_cli_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// File logging for the TUI. Returns `false` when file logging is disabled.
pub fn init_tui_logging(log_dir: &Path) -> bool {
    // `rolling::daily` panics if it cannot create the first file, so check first.
    if let Err(e) = ensure_writable(log_dir) {
        eprintln!(
            "Warning: Could not write to log directory {} ({e}), file logging disabled",
            log_dir.display()
        );
        return false;
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    // Flushes on drop; the TUI runs until process exit.
    Box::leak(Box::new(guard));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .try_init()
        .is_ok()
}

fn ensure_writable(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let probe = dir.join(".resale_write_test");
    std::fs::OpenOptions::new().create(true).append(true).open(&probe)?;
    let _ = std::fs::remove_file(&probe);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writable_dir_passes_preflight() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("logs").join("tui");
        ensure_writable(&nested).unwrap();
        assert!(nested.is_dir());
        assert!(!nested.join(".resale_write_test").exists());
    }

    #[test]
    fn file_in_the_way_fails_preflight() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("logs");
        std::fs::write(&blocker, "not a directory").unwrap();
        assert!(ensure_writable(&blocker).is_err());
    }
}
