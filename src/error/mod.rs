//! Error types and handling for `xcresult_triage`.
//!
//! # Design
//!
//! - Uses `thiserror` for derive-based error types
//! - Wraps `anyhow` errors for one-off failures at the edges
//! - Provides recovery hints for user-facing errors
//! - Provides structured JSON output for scripted callers
//!
//! A resolver miss is not an error: lookups return `Option` and the caller
//! prints numbering guidance instead. Pattern extraction misses inside the
//! diagnostics rules never surface here either.

mod structured;

pub use structured::{ErrorCode, StructuredError, find_similar_ids};

use std::path::PathBuf;
use thiserror::Error;

/// Primary error type for `xcresult_triage` operations.
#[derive(Error, Debug)]
pub enum TriageError {
    // === Result-store tool errors ===
    /// The result-store tool exited with a non-zero status.
    #[error("Result-store tool failed ({command}): exit code {}", display_exit_code(.exit_code))]
    ToolFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The result-store tool exceeded its wall-clock budget and was killed.
    #[error("Result-store tool timed out after {timeout_secs}s ({command})")]
    ToolTimeout { command: String, timeout_secs: u64 },

    /// The result-store tool binary could not be launched.
    #[error("Result-store tool not found: {program}")]
    ToolNotFound { program: String },

    // === Document errors ===
    /// A primary document failed to decode, even after float normalization.
    #[error("Malformed {document} document: {reason}")]
    MalformedDocument { document: String, reason: String },

    /// The result bundle or export directory does not exist.
    #[error("Result bundle not found at '{path}'")]
    BundleNotFound { path: PathBuf },

    /// Directory search found no result bundles.
    #[error("No result bundles found under '{path}'")]
    NoResultBundles { path: PathBuf },

    // === Configuration Errors ===
    /// Configuration file or value error.
    #[error("Configuration error: {0}")]
    Config(String),

    // === I/O Errors ===
    /// File system I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Wrapped anyhow error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[allow(clippy::ref_option)]
fn display_exit_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "signal".to_string(), |c| c.to_string())
}

impl TriageError {
    /// Soft failures degrade a single section instead of aborting the query.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::ToolTimeout { .. })
    }

    /// Human-friendly suggestion for fixing this error.
    #[must_use]
    pub const fn suggestion(&self) -> Option<&'static str> {
        match self {
            Self::ToolNotFound { .. } => {
                Some("Install the Xcode command line tools or pass --xcrun <path>")
            }
            Self::ToolTimeout { .. } => Some("Retry with a larger --timeout"),
            Self::BundleNotFound { .. } => {
                Some("Pass a .xcresult bundle or a directory with summary.json and tests.json")
            }
            Self::NoResultBundles { .. } => {
                Some("Run the tests first, or point find at a DerivedData/Logs/Test directory")
            }
            Self::MalformedDocument { .. } => {
                Some("Check that the bundle was produced by a compatible Xcode version")
            }
            _ => None,
        }
    }

    /// Build a malformed-document error for the named document.
    #[must_use]
    pub fn malformed(document: impl Into<String>, reason: impl ToString) -> Self {
        Self::MalformedDocument {
            document: document.into(),
            reason: reason.to_string(),
        }
    }
}

/// Result type using `TriageError`.
pub type Result<T> = std::result::Result<T, TriageError>;
