//! Document loading for result-store JSON.
//!
//! The result-store tool emits timestamps with more fractional digits than a
//! strict decoder is happy with, so raw text is normalized before decoding:
//! any numeric literal with ten or more fractional digits is rounded to six.
//! Both primary documents are decoded before a [`ResultDocument`] exists, so
//! a half-built tree is never exposed to the resolver.

use crate::error::{Result, TriageError};
use crate::model::{TestResults, TestResultsSummary};
use crate::store::ResultStore;
use regex::Regex;
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::sync::LazyLock;
use tracing::{debug, info};

/// Fractional digits kept when rounding overly precise literals.
pub const NORMALIZED_FRACTION_DIGITS: usize = 6;

/// A JSON string literal, or a number with ten or more fractional digits.
/// Strings are matched only so they can be skipped.
static STRING_OR_PRECISE_FLOAT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*"|-?\d+\.\d{10,}"#).expect("float precision pattern is valid")
});

/// Round numeric literals with ten or more fractional digits to six digits.
///
/// Digits inside string values are left as they are. Text without such
/// literals is returned borrowed and unchanged.
#[must_use]
pub fn normalize_float_precision(raw: &str) -> Cow<'_, str> {
    let mut normalized = String::new();
    let mut copied_to = 0;

    for token in STRING_OR_PRECISE_FLOAT.find_iter(raw) {
        if token.as_str().starts_with('"') {
            continue;
        }
        let Ok(value) = token.as_str().parse::<f64>() else {
            continue;
        };
        normalized.push_str(&raw[copied_to..token.start()]);
        normalized.push_str(&format!("{value:.prec$}", prec = NORMALIZED_FRACTION_DIGITS));
        copied_to = token.end();
    }

    if copied_to == 0 {
        return Cow::Borrowed(raw);
    }
    normalized.push_str(&raw[copied_to..]);
    Cow::Owned(normalized)
}

/// Normalize and decode one named document.
pub(crate) fn decode<T: DeserializeOwned>(document: &str, raw: &str) -> Result<T> {
    let normalized = normalize_float_precision(raw);
    if let Cow::Owned(_) = normalized {
        debug!(document, "normalized overly precise float literals");
    }
    serde_json::from_str(&normalized).map_err(|e| TriageError::malformed(document, e))
}

/// Decode the summary document.
///
/// # Errors
///
/// Returns `MalformedDocument` if the JSON does not decode.
pub fn parse_summary(raw: &str) -> Result<TestResultsSummary> {
    decode("summary", raw)
}

/// Decode the tests document.
///
/// # Errors
///
/// Returns `MalformedDocument` if the JSON does not decode.
pub fn parse_tests(raw: &str) -> Result<TestResults> {
    decode("tests", raw)
}

/// The two primary documents of one analysis session.
#[derive(Debug, Clone)]
pub struct ResultDocument {
    pub summary: TestResultsSummary,
    pub tests: TestResults,
}

impl ResultDocument {
    /// Decode both primary documents from raw JSON text.
    ///
    /// # Errors
    ///
    /// Returns `MalformedDocument` naming whichever document failed.
    pub fn from_json(summary_raw: &str, tests_raw: &str) -> Result<Self> {
        let summary = parse_summary(summary_raw)?;
        let tests = parse_tests(tests_raw)?;
        Ok(Self { summary, tests })
    }

    /// Fetch and decode both primary documents from a result store.
    ///
    /// # Errors
    ///
    /// Any tool or decoding failure is fatal for the whole query.
    pub fn load(store: &dyn ResultStore) -> Result<Self> {
        let summary_raw = store.summary_json()?;
        let tests_raw = store.tests_json()?;
        let document = Self::from_json(&summary_raw, &tests_raw)?;
        info!(
            roots = document.tests.test_nodes.len(),
            failures = document.summary.test_failures.len(),
            "Loaded result documents"
        );
        Ok(document)
    }
}
