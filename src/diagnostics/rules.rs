//! Built-in classification rules.
//!
//! Each rule pairs substring markers with optional capture patterns. A capture
//! that misses degrades to generic wording for that rule.

use super::{FailureCategory, FailureRule};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

const MISSING_KEY_MARKER: &str = "keyNotFound";
const TYPE_MISMATCH_MARKER: &str = "typeMismatch";
const INVALID_STRING_VALUE_PHRASE: &str = "invalid string value";

const CORRUPTION_MARKER: &str = "dataCorrupted";

static MISSING_KEY_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r#"keyNotFound\(\s*CodingKeys\(\s*stringValue:\s*\\?"([^"\\]+)"#,
        r#"No value associated with key\s+(?:CodingKeys\(\s*stringValue:\s*\\?")?([A-Za-z_][A-Za-z0-9_]*)"#,
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("missing key pattern is valid"))
    .collect()
});

static ENUM_TYPE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"Cannot initialize (.+?) from invalid String value ")
        .expect("enum type pattern is valid")
});

static ENUM_VALUE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"from invalid String value ([^,"]+)"#).expect("enum value pattern is valid")
});

fn has_corruption_marker(text: &str) -> bool {
    text.contains(CORRUPTION_MARKER)
}

fn has_invalid_string_value(text: &str) -> bool {
    text.to_lowercase().contains(INVALID_STRING_VALUE_PHRASE)
}

fn extract_missing_key(text: &str) -> Option<String> {
    let key = MISSING_KEY_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(text))
        .map(|caps| caps[1].trim().to_string())
        .filter(|key| !key.is_empty());
    if key.is_none() {
        debug!("missing key name not captured; using generic wording");
    }
    key
}

fn extract_enum_type(text: &str) -> Option<String> {
    ENUM_TYPE_PATTERN
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|name| !name.is_empty())
}

fn extract_enum_value(text: &str) -> Option<String> {
    ENUM_VALUE_PATTERN
        .captures(text)
        .map(|caps| caps[1].trim().trim_end_matches('\\').trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Decoding failed because a required key was absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingKeyRule;

impl FailureRule for MissingKeyRule {
    fn name(&self) -> &str {
        "missing-key"
    }

    fn category(&self) -> FailureCategory {
        FailureCategory::MissingKey
    }

    fn matches(&self, text: &str) -> bool {
        text.contains(MISSING_KEY_MARKER)
    }

    fn describe(&self, text: &str) -> Option<String> {
        Some(extract_missing_key(text).map_or_else(
            || "Missing Required Key: A required key is missing from the decoded data".to_string(),
            |key| format!("Missing Required Key: The decoded data is missing the required key '{key}'"),
        ))
    }

    fn suggest(&self, text: &str) -> Vec<String> {
        if let Some(key) = extract_missing_key(text) {
            vec![
                format!("Make '{key}' optional in the model if the payload may omit it"),
                format!("Provide a default value for '{key}' in a custom decoding initializer"),
                format!("Check the mock or fixture data used by this test and add the '{key}' field"),
                format!("Verify whether the API contract changed and '{key}' was renamed or removed"),
            ]
        } else {
            vec![
                "Make the missing property optional in the model if the payload may omit it"
                    .to_string(),
                "Provide a default value in a custom decoding initializer".to_string(),
                "Check the mock or fixture data used by this test for missing fields".to_string(),
                "Verify whether the API contract changed and a field was renamed or removed"
                    .to_string(),
            ]
        }
    }
}

/// An enum decoded from a raw string it has no case for.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvalidEnumValueRule;

impl FailureRule for InvalidEnumValueRule {
    fn name(&self) -> &str {
        "invalid-enum-value"
    }

    fn category(&self) -> FailureCategory {
        FailureCategory::InvalidEnumValue
    }

    /// The enum initializer message counts on its own; other text needs the
    /// corruption marker as well.
    fn matches(&self, text: &str) -> bool {
        ENUM_TYPE_PATTERN.is_match(text)
            || (has_corruption_marker(text) && has_invalid_string_value(text))
    }

    fn describe(&self, text: &str) -> Option<String> {
        Some(match (extract_enum_type(text), extract_enum_value(text)) {
            (Some(type_name), Some(value)) => {
                format!("Data Corruption: Invalid enum value '{value}' for type '{type_name}'")
            }
            _ => {
                debug!("enum type or value not captured; using generic wording");
                "Data Corruption: An enum received a value it has no case for".to_string()
            }
        })
    }

    fn suggest(&self, text: &str) -> Vec<String> {
        match (extract_enum_type(text), extract_enum_value(text)) {
            (Some(type_name), Some(value)) => vec![
                format!("Add '{value}' as a new case to '{type_name}'"),
                format!(
                    "Add a fallback case to '{type_name}' with a custom decoder so unknown values don't fail decoding"
                ),
                format!("Investigate why the upstream data produced '{value}' for '{type_name}'"),
            ],
            _ => vec![
                "Add the unexpected raw value as a new enum case".to_string(),
                "Add a fallback case with a custom decoder so unknown values don't fail decoding"
                    .to_string(),
                "Investigate why the upstream data produced an unexpected value".to_string(),
            ],
        }
    }
}

/// Data corruption without the enum-specific phrase.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataCorruptedRule;

impl FailureRule for DataCorruptedRule {
    fn name(&self) -> &str {
        "data-corrupted"
    }

    fn category(&self) -> FailureCategory {
        FailureCategory::DataCorrupted
    }

    fn matches(&self, text: &str) -> bool {
        has_corruption_marker(text) && !has_invalid_string_value(text)
    }

    fn describe(&self, _text: &str) -> Option<String> {
        Some(
            "Data Corruption: The data format is corrupted or doesn't match the expected structure"
                .to_string(),
        )
    }

    fn suggest(&self, _text: &str) -> Vec<String> {
        vec![
            "Validate that the JSON structure matches the model definition".to_string(),
            "Check the test data for malformed values such as invalid dates or numbers"
                .to_string(),
            "Log the raw payload before decoding to inspect the actual data".to_string(),
        ]
    }
}

/// Decoded value had a different type than the model expects.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeMismatchRule;

impl FailureRule for TypeMismatchRule {
    fn name(&self) -> &str {
        "type-mismatch"
    }

    fn category(&self) -> FailureCategory {
        FailureCategory::TypeMismatch
    }

    fn matches(&self, text: &str) -> bool {
        text.contains(TYPE_MISMATCH_MARKER)
    }

    fn describe(&self, _text: &str) -> Option<String> {
        Some(
            "Type Mismatch: The expected type doesn't match the actual type in the data"
                .to_string(),
        )
    }

    fn suggest(&self, _text: &str) -> Vec<String> {
        Vec::new()
    }
}

/// Configured review suggestions for failures mentioning a suite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuiteHint {
    /// Substring to look for in the failure text.
    #[serde(rename = "match", alias = "pattern")]
    pub pattern: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

/// Advisory rule built from a [`SuiteHint`]; contributes suggestions only.
#[derive(Debug, Clone)]
pub struct SuiteHintRule {
    hint: SuiteHint,
}

impl SuiteHintRule {
    #[must_use]
    pub const fn new(hint: SuiteHint) -> Self {
        Self { hint }
    }
}

impl FailureRule for SuiteHintRule {
    fn name(&self) -> &str {
        &self.hint.pattern
    }

    fn category(&self) -> FailureCategory {
        FailureCategory::SuiteHint
    }

    fn matches(&self, text: &str) -> bool {
        !self.hint.pattern.is_empty() && text.contains(&self.hint.pattern)
    }

    fn describe(&self, _text: &str) -> Option<String> {
        None
    }

    fn suggest(&self, _text: &str) -> Vec<String> {
        self.hint.suggestions.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_capture_variants() {
        assert_eq!(
            extract_missing_key(r#"keyNotFound(CodingKeys(stringValue: "userId", intValue: nil)"#)
                .as_deref(),
            Some("userId")
        );
        assert_eq!(
            extract_missing_key(r#"keyNotFound(CodingKeys(stringValue: \"email\", intValue: nil)"#)
                .as_deref(),
            Some("email")
        );
        assert_eq!(
            extract_missing_key("keyNotFound: No value associated with key createdAt").as_deref(),
            Some("createdAt")
        );
        assert_eq!(extract_missing_key("keyNotFound(somethingElse)"), None);
    }

    #[test]
    fn missing_key_degrades_to_generic_wording() {
        let rule = MissingKeyRule;
        let text = "keyNotFound(unparseable)";
        assert!(rule.matches(text));
        assert_eq!(
            rule.describe(text).as_deref(),
            Some("Missing Required Key: A required key is missing from the decoded data")
        );
        assert_eq!(rule.suggest(text).len(), 4);
    }

    #[test]
    fn enum_value_stops_at_quote() {
        let text = r#"dataCorrupted(debugDescription: "Cannot initialize Status from invalid String value archived", underlyingError: nil)"#;
        assert_eq!(extract_enum_type(text).as_deref(), Some("Status"));
        assert_eq!(extract_enum_value(text).as_deref(), Some("archived"));
    }

    #[test]
    fn enum_value_strips_escaped_quote() {
        let text = r#"debugDescription: \"Cannot initialize Kind from invalid String value beta\""#;
        assert_eq!(extract_enum_value(text).as_deref(), Some("beta"));
    }

    #[test]
    fn enum_rule_generic_when_type_missing() {
        let rule = InvalidEnumValueRule;
        let text = "dataCorrupted: invalid String value somewhere";
        assert!(rule.matches(text));
        assert_eq!(
            rule.describe(text).as_deref(),
            Some("Data Corruption: An enum received a value it has no case for")
        );
        assert!(rule.suggest(text)[0].starts_with("Add the unexpected raw value"));
    }

    #[test]
    fn corruption_rules_are_exclusive() {
        let enum_text = "dataCorrupted: Cannot initialize A from invalid String value b";
        let generic_text = "dataCorrupted: The given data was not valid JSON.";
        assert!(InvalidEnumValueRule.matches(enum_text));
        assert!(!DataCorruptedRule.matches(enum_text));
        assert!(DataCorruptedRule.matches(generic_text));
        assert!(!InvalidEnumValueRule.matches(generic_text));
    }

    #[test]
    fn suite_hint_deserializes_match_key() {
        let hint: SuiteHint =
            serde_yaml::from_str("match: CheckoutTests\nsuggestions:\n  - Review cart fixtures\n")
                .expect("hint yaml");
        assert_eq!(hint.pattern, "CheckoutTests");
        assert_eq!(hint.suggestions, vec!["Review cart fixtures"]);

        let empty = SuiteHintRule::new(SuiteHint {
            pattern: String::new(),
            suggestions: vec!["never".to_string()],
        });
        assert!(!empty.matches("anything"));
    }
}
