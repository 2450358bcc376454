//! Structured error output for scripted callers.
//!
//! Provides machine-parseable error information with:
//! - Error codes for categorization
//! - Hints for self-correction
//! - Retryability flags
//! - Context for debugging

use crate::error::TriageError;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Machine-readable error codes.
///
/// These codes are stable and can be used for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // === Tool Errors (exit code 2) ===
    /// Result-store tool exited non-zero
    ToolFailed,
    /// Result-store tool exceeded its timeout
    ToolTimeout,
    /// Result-store tool binary missing
    ToolNotFound,

    // === Document Errors (exit code 3) ===
    /// Primary document failed to decode
    MalformedDocument,

    // === Input Errors (exit code 4) ===
    /// Bundle path does not exist
    BundleNotFound,
    /// Directory search came up empty
    NoResultBundles,

    // === Config Errors (exit code 7) ===
    /// Configuration error
    ConfigError,

    // === I/O Errors (exit code 8) ===
    /// File I/O error
    IoError,
    /// JSON serialization error
    JsonError,
    /// YAML parsing error
    YamlError,

    // === Internal Errors (exit code 1) ===
    /// Unexpected internal error
    InternalError,
}

impl ErrorCode {
    /// Get the string representation for JSON output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ToolFailed => "TOOL_FAILED",
            Self::ToolTimeout => "TOOL_TIMEOUT",
            Self::ToolNotFound => "TOOL_NOT_FOUND",
            Self::MalformedDocument => "MALFORMED_DOCUMENT",
            Self::BundleNotFound => "BUNDLE_NOT_FOUND",
            Self::NoResultBundles => "NO_RESULT_BUNDLES",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::YamlError => "YAML_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Whether this error is potentially retryable.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ToolTimeout | Self::ToolFailed)
    }

    /// Get the exit code for this error category.
    ///
    /// - 1: Internal/unknown errors
    /// - 2: Result-store tool errors
    /// - 3: Document errors
    /// - 4: Input errors
    /// - 7: Config errors
    /// - 8: I/O errors
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ToolFailed | Self::ToolTimeout | Self::ToolNotFound => 2,
            Self::MalformedDocument => 3,
            Self::BundleNotFound | Self::NoResultBundles => 4,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError | Self::YamlError => 8,
            Self::InternalError => 1,
        }
    }
}

/// Structured error for machine-parseable output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructuredError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional hint for fixing the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether the operation can be retried
    pub retryable: bool,
    /// Additional context data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl StructuredError {
    /// Create a new structured error from a `TriageError`.
    #[must_use]
    pub fn from_error(err: &TriageError) -> Self {
        let (code, context) = Self::extract_code_and_context(err);
        let hint = Self::generate_hint(err);

        Self {
            code,
            message: err.to_string(),
            hint,
            retryable: code.is_retryable(),
            context,
        }
    }

    /// Serialize to JSON value.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": {
                "code": self.code.as_str(),
                "message": self.message,
                "hint": self.hint,
                "retryable": self.retryable,
                "context": self.context,
            }
        })
    }

    /// Format for human-readable output.
    #[must_use]
    pub fn to_human(&self, color: bool) -> String {
        let mut output = String::new();

        if color {
            output.push_str("\x1b[31mError:\x1b[0m ");
        } else {
            output.push_str("Error: ");
        }

        output.push_str(&self.message);

        if let Some(hint) = &self.hint {
            output.push('\n');
            if color {
                output.push_str("\x1b[33mHint:\x1b[0m ");
            } else {
                output.push_str("Hint: ");
            }
            output.push_str(hint);
        }

        output
    }

    fn extract_code_and_context(err: &TriageError) -> (ErrorCode, Option<Value>) {
        match err {
            TriageError::ToolFailed {
                command,
                exit_code,
                stderr,
            } => (
                ErrorCode::ToolFailed,
                Some(json!({
                    "command": command,
                    "exit_code": exit_code,
                    "stderr": stderr.trim(),
                })),
            ),
            TriageError::ToolTimeout {
                command,
                timeout_secs,
            } => (
                ErrorCode::ToolTimeout,
                Some(json!({"command": command, "timeout_secs": timeout_secs})),
            ),
            TriageError::ToolNotFound { program } => {
                (ErrorCode::ToolNotFound, Some(json!({"program": program})))
            }
            TriageError::MalformedDocument { document, reason } => (
                ErrorCode::MalformedDocument,
                Some(json!({"document": document, "reason": reason})),
            ),
            TriageError::BundleNotFound { path } => (
                ErrorCode::BundleNotFound,
                Some(json!({"path": path.display().to_string()})),
            ),
            TriageError::NoResultBundles { path } => (
                ErrorCode::NoResultBundles,
                Some(json!({"path": path.display().to_string()})),
            ),
            TriageError::Config(_) => (ErrorCode::ConfigError, None),
            TriageError::Io(_) => (ErrorCode::IoError, None),
            TriageError::Json(_) => (ErrorCode::JsonError, None),
            TriageError::Yaml(_) => (ErrorCode::YamlError, None),
            TriageError::Other(_) => (ErrorCode::InternalError, None),
        }
    }

    fn generate_hint(err: &TriageError) -> Option<String> {
        if let Some(suggestion) = err.suggestion() {
            return Some(suggestion.to_string());
        }

        match err {
            TriageError::ToolFailed { stderr, .. } => stderr
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty())
                .map(|line| format!("Tool reported: {line}")),
            _ => None,
        }
    }
}

fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_len = a.chars().count();
    let b_len = b.chars().count();

    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let b_chars: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b_len).collect();
    let mut current = vec![0; b_len + 1];

    for (i, a_char) in a.chars().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != *b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_len]
}

/// Find identifiers similar to the searched one using Levenshtein distance.
///
/// Returns up to `max_suggestions` identifiers with distance <= 3.
pub fn find_similar_ids<'a, I>(searched: &str, existing: I, max_suggestions: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut candidates: Vec<(usize, &str)> = existing
        .into_iter()
        .map(|id| (levenshtein_distance(searched, id), id))
        .filter(|(dist, _)| *dist <= 3)
        .collect();

    candidates.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    candidates.dedup_by(|a, b| a.1 == b.1);

    candidates
        .into_iter()
        .take(max_suggestions)
        .map(|(_, id)| id.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_error_code_as_str() {
        assert_eq!(ErrorCode::ToolTimeout.as_str(), "TOOL_TIMEOUT");
        assert_eq!(ErrorCode::MalformedDocument.as_str(), "MALFORMED_DOCUMENT");
    }

    #[test]
    fn test_exit_codes_grouped_by_category() {
        assert_eq!(ErrorCode::ToolFailed.exit_code(), 2);
        assert_eq!(ErrorCode::MalformedDocument.exit_code(), 3);
        assert_eq!(ErrorCode::BundleNotFound.exit_code(), 4);
        assert_eq!(ErrorCode::ConfigError.exit_code(), 7);
        assert_eq!(ErrorCode::JsonError.exit_code(), 8);
        assert_eq!(ErrorCode::InternalError.exit_code(), 1);
    }

    #[test]
    fn test_from_error_tool_failed_uses_stderr_hint() {
        let err = TriageError::ToolFailed {
            command: "xcrun xcresulttool get test-results summary".to_string(),
            exit_code: Some(64),
            stderr: "\nError: unknown option --bogus\n".to_string(),
        };
        let structured = StructuredError::from_error(&err);
        assert_eq!(structured.code, ErrorCode::ToolFailed);
        assert!(structured.retryable);
        assert_eq!(
            structured.hint.as_deref(),
            Some("Tool reported: Error: unknown option --bogus")
        );
        let ctx = structured.context.expect("context");
        assert_eq!(ctx["exit_code"], 64);
    }

    #[test]
    fn test_to_json_shape() {
        let err = TriageError::BundleNotFound {
            path: PathBuf::from("/tmp/none.xcresult"),
        };
        let json = StructuredError::from_error(&err).to_json();
        assert_eq!(json["error"]["code"], "BUNDLE_NOT_FOUND");
        assert_eq!(json["error"]["context"]["path"], "/tmp/none.xcresult");
        assert_eq!(json["error"]["retryable"], false);
    }

    #[test]
    fn test_to_human_without_color() {
        let err = TriageError::ToolNotFound {
            program: "xcrun".to_string(),
        };
        let human = StructuredError::from_error(&err).to_human(false);
        assert!(human.starts_with("Error: Result-store tool not found: xcrun"));
        assert!(human.contains("\nHint: "));
    }

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("same", "same"), 0);
    }

    #[test]
    fn test_find_similar_ids() {
        let existing = [
            "LoginTests/testLogin()",
            "LoginTests/testLogout()",
            "ProfileTests/testAvatar()",
        ];
        let similar = find_similar_ids("LoginTests/testLogn()", existing, 3);
        assert_eq!(similar.first().map(String::as_str), Some("LoginTests/testLogin()"));
        assert!(!similar.contains(&"ProfileTests/testAvatar()".to_string()));
    }
}
