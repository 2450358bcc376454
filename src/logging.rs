//! Logging setup built on `tracing-subscriber`.
//!
//! Log output always goes to stderr so stdout stays clean for listings and
//! `--json` payloads. `RUST_LOG` takes precedence over the verbosity flags.

use anyhow::Context;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::{Arc, Once};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{EnvFilter, fmt};

static TEST_INIT: Once = Once::new();

/// Map `-v` count and `--quiet` to a default filter directive.
#[must_use]
pub const fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Initialize the global subscriber for the CLI.
///
/// When `log_file` is given, events are also appended there without ANSI
/// escapes.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a global subscriber
/// is already installed.
pub fn init_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("opening log file {}", path.display()))?;
        let writer = std::io::stderr.and(Arc::new(file));
        fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .with_target(false)
            .try_init()
            .map_err(|e| anyhow::anyhow!("{e}"))?;
    } else {
        fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init()
            .map_err(|e| anyhow::anyhow!("{e}"))?;
    }

    Ok(())
}

/// Install a test-writer subscriber once per test binary.
pub fn init_test_logging() {
    TEST_INIT.call_once(|| {
        let _ = fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_test_writer()
            .try_init();
    });
}
