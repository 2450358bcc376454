//! Property-based tests for float-precision normalization.
//!
//! Uses proptest to verify that:
//! - literals with ten or more fractional digits are rounded to six
//! - shorter literals and non-numeric text pass through untouched
//! - normalized documents still decode

use proptest::prelude::*;
use std::borrow::Cow;
use tracing::info;

use xcresult_triage::loader::{NORMALIZED_FRACTION_DIGITS, normalize_float_precision, parse_summary};

/// Initialize test logging for proptest
fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 100,
        ..Default::default()
    })]

    /// Property: overly precise literals come back with six fractional digits
    #[test]
    fn long_fractions_are_rounded(
        whole in 0u64..2_000_000_000,
        fraction in "[0-9]{10,20}",
    ) {
        init_test_logging();

        let literal = format!("{whole}.{fraction}");
        info!("proptest_long_fraction: literal={literal}");
        let normalized = normalize_float_precision(&literal);

        let (_, digits) = normalized.split_once('.').expect("still a decimal");
        prop_assert_eq!(digits.len(), NORMALIZED_FRACTION_DIGITS);

        let original: f64 = literal.parse().expect("valid literal");
        let rounded: f64 = normalized.parse().expect("valid normalized literal");
        prop_assert!((original - rounded).abs() <= 1e-6 * original.abs().max(1.0));
    }

    /// Property: literals with fewer than ten fractional digits are untouched
    #[test]
    fn short_fractions_are_borrowed(
        whole in 0u64..1_000_000,
        fraction in "[0-9]{1,9}",
    ) {
        init_test_logging();

        let text = format!("{{\"startTime\": {whole}.{fraction}}}");
        let normalized = normalize_float_precision(&text);
        prop_assert!(matches!(normalized, Cow::Borrowed(_)));
        prop_assert_eq!(normalized.as_ref(), text.as_str());
    }

    /// Property: long fractions inside string values are never rewritten
    #[test]
    fn quoted_long_fractions_are_untouched(
        whole in 0u64..1_000_000,
        fraction in "[0-9]{10,20}",
    ) {
        init_test_logging();

        let text = format!("{{\"failureText\": \"expected {whole}.{fraction}\"}}");
        let normalized = normalize_float_precision(&text);
        prop_assert!(matches!(normalized, Cow::Borrowed(_)));
    }

    /// Property: text without decimals is never rewritten
    #[test]
    fn text_without_decimals_is_unchanged(text in "[a-zA-Z :,{}\"]{0,64}") {
        init_test_logging();

        let normalized = normalize_float_precision(&text);
        prop_assert_eq!(normalized.as_ref(), text.as_str());
    }

    /// Property: a summary with precise timestamps still decodes
    #[test]
    fn precise_summary_decodes(
        start in 1_600_000_000u64..1_800_000_000,
        fraction in "[0-9]{10,18}",
        span in 1u64..10_000,
    ) {
        init_test_logging();

        let raw = format!(
            "{{\"title\": \"Run\", \"totalTestCount\": 1, \"passedTests\": 1, \
              \"startTime\": {start}.{fraction}, \"finishTime\": {}.{fraction}}}",
            start + span
        );
        let summary = parse_summary(&raw);
        prop_assert!(summary.is_ok(), "summary should decode: {raw}");
        let duration = summary.unwrap().duration_secs().expect("both ends present");
        prop_assert!((duration - span as f64).abs() < 1e-3);
    }
}
