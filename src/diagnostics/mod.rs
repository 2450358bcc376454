//! Failure classification and remediation hints.
//!
//! Failure text from the result store is unstructured, so classification is
//! an ordered table of [`FailureRule`]s:
//!
//! - The first rule that matches *and* describes the text supplies the
//!   analysis. Advisory rules (suite hints) describe nothing and never win.
//! - Suggestions are cumulative: every matching rule contributes, in table
//!   order.
//! - No match yields the verbatim fallback analysis and no suggestions.
//!
//! Everything here is a pure function of the input text.

mod rules;

pub use rules::{
    DataCorruptedRule, InvalidEnumValueRule, MissingKeyRule, SuiteHint, SuiteHintRule,
    TypeMismatchRule,
};

use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Diagnostic category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    MissingKey,
    InvalidEnumValue,
    DataCorrupted,
    TypeMismatch,
    SuiteHint,
    Unclassified,
}

impl FailureCategory {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingKey => "missing_key",
            Self::InvalidEnumValue => "invalid_enum_value",
            Self::DataCorrupted => "data_corrupted",
            Self::TypeMismatch => "type_mismatch",
            Self::SuiteHint => "suite_hint",
            Self::Unclassified => "unclassified",
        }
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the classification table.
pub trait FailureRule: Send + Sync {
    /// Short stable name, used in logs.
    fn name(&self) -> &str;

    fn category(&self) -> FailureCategory;

    fn matches(&self, text: &str) -> bool;

    /// Analysis text, or `None` for advisory rules.
    fn describe(&self, text: &str) -> Option<String>;

    fn suggest(&self, text: &str) -> Vec<String>;
}

/// Category plus human-readable analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub category: FailureCategory,
    pub analysis: String,
}

/// Full diagnostic output for one failure text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureReport {
    pub category: FailureCategory,
    pub analysis: String,
    pub suggestions: Vec<String>,
}

/// Ordered rule table.
pub struct DiagnosticsEngine {
    rules: Vec<Box<dyn FailureRule>>,
}

impl Default for DiagnosticsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DiagnosticsEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|rule| rule.name()))
            .finish()
    }
}

impl DiagnosticsEngine {
    /// Engine with the built-in decoding rules.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(MissingKeyRule),
                Box::new(InvalidEnumValueRule),
                Box::new(DataCorruptedRule),
                Box::new(TypeMismatchRule),
            ],
        }
    }

    /// Engine with the built-in rules plus one advisory rule per suite hint.
    #[must_use]
    pub fn with_suite_hints(hints: &[SuiteHint]) -> Self {
        let mut engine = Self::new();
        for hint in hints {
            engine.push_rule(Box::new(SuiteHintRule::new(hint.clone())));
        }
        engine
    }

    /// Engine with exactly the given rules, in order.
    #[must_use]
    pub fn from_rules(rules: Vec<Box<dyn FailureRule>>) -> Self {
        Self { rules }
    }

    /// Append a rule after the existing ones.
    pub fn push_rule(&mut self, rule: Box<dyn FailureRule>) {
        self.rules.push(rule);
    }

    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Classify failure text; the first describing rule wins.
    #[must_use]
    pub fn classify(&self, text: &str) -> Classification {
        for rule in &self.rules {
            if !rule.matches(text) {
                continue;
            }
            if let Some(analysis) = rule.describe(text) {
                debug!(rule = rule.name(), "failure classified");
                return Classification {
                    category: rule.category(),
                    analysis,
                };
            }
        }

        Classification {
            category: FailureCategory::Unclassified,
            analysis: format!("Test failed with error: {text}"),
        }
    }

    /// Collect suggestions from every matching rule, in table order.
    #[must_use]
    pub fn suggest(&self, text: &str) -> Vec<String> {
        self.rules
            .iter()
            .filter(|rule| rule.matches(text))
            .flat_map(|rule| rule.suggest(text))
            .collect()
    }

    /// Classification and suggestions together.
    #[must_use]
    pub fn analyze(&self, text: &str) -> FailureReport {
        let Classification { category, analysis } = self.classify(text);
        FailureReport {
            category,
            analysis,
            suggestions: self.suggest(text),
        }
    }
}
