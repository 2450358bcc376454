//! Core data types for `xcresult_triage`.
//!
//! This module defines the read model built from the result-store documents:
//! - `TestNode` - One node of the hierarchical test tree
//! - `NodeType` - Kinds of nodes (plans, bundles, suites, cases, diagnostics)
//! - `ResultKind` - Pass/fail/skip classification of free-text results
//! - `TestCounts` - Pass/fail/total roll-ups
//! - `TestResultsSummary` / `TestFailure` - Document-level statistics
//!
//! The tree is built once per query and never mutated afterwards.

mod lenient;

pub use lenient::{lenient_f64, lenient_u64};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// Kind of node in the test tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum NodeType {
    #[serde(rename = "Test Plan")]
    TestPlan,
    #[serde(rename = "Unit test bundle")]
    UnitTestBundle,
    #[serde(rename = "UI test bundle")]
    UiTestBundle,
    #[serde(rename = "Test Target")]
    TestTarget,
    #[default]
    #[serde(rename = "Test Suite")]
    TestSuite,
    #[serde(rename = "Test Case")]
    TestCase,
    #[serde(rename = "Test Case Run")]
    TestCaseRun,
    #[serde(rename = "Repetition")]
    Repetition,
    #[serde(rename = "Device")]
    Device,
    #[serde(rename = "Arguments")]
    Arguments,
    #[serde(rename = "Failure Message")]
    FailureMessage,
    #[serde(rename = "Source Code Reference")]
    SourceCodeReference,
    #[serde(rename = "Attachment")]
    Attachment,
    #[serde(rename = "Activity")]
    Activity,
    #[serde(rename = "Runtime Warning")]
    RuntimeWarning,
    #[serde(untagged)]
    Custom(String),
}

impl NodeType {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::TestPlan => "Test Plan",
            Self::UnitTestBundle => "Unit test bundle",
            Self::UiTestBundle => "UI test bundle",
            Self::TestTarget => "Test Target",
            Self::TestSuite => "Test Suite",
            Self::TestCase => "Test Case",
            Self::TestCaseRun => "Test Case Run",
            Self::Repetition => "Repetition",
            Self::Device => "Device",
            Self::Arguments => "Arguments",
            Self::FailureMessage => "Failure Message",
            Self::SourceCodeReference => "Source Code Reference",
            Self::Attachment => "Attachment",
            Self::Activity => "Activity",
            Self::RuntimeWarning => "Runtime Warning",
            Self::Custom(value) => value,
        }
    }

    #[must_use]
    pub const fn is_test_case(&self) -> bool {
        matches!(self, Self::TestCase)
    }

    /// Diagnostic sub-nodes hang off test cases and never count as tests.
    #[must_use]
    pub const fn is_diagnostic(&self) -> bool {
        matches!(
            self,
            Self::FailureMessage
                | Self::SourceCodeReference
                | Self::Attachment
                | Self::Activity
                | Self::RuntimeWarning
        )
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classified outcome of a free-text result string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    Passed,
    Failed,
    Skipped,
    Unknown,
}

impl ResultKind {
    /// Classify a result string by case-insensitive substring match.
    ///
    /// Order matters: "pass"/"success" wins over "fail", which wins over "skip".
    #[must_use]
    pub fn classify(result: &str) -> Self {
        let lower = result.to_lowercase();
        if lower.contains("pass") || lower.contains("success") {
            Self::Passed
        } else if lower.contains("fail") {
            Self::Failed
        } else if lower.contains("skip") {
            Self::Skipped
        } else {
            Self::Unknown
        }
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pass/fail/total roll-up for a subtree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestCounts {
    pub passed: u64,
    pub failed: u64,
    pub total: u64,
}

impl TestCounts {
    #[must_use]
    pub const fn new(passed: u64, failed: u64, total: u64) -> Self {
        Self {
            passed,
            failed,
            total,
        }
    }

    /// Contribution of a single test case with the given outcome.
    #[must_use]
    pub fn single(kind: ResultKind) -> Self {
        Self {
            passed: u64::from(kind == ResultKind::Passed),
            failed: u64::from(kind == ResultKind::Failed),
            total: 1,
        }
    }

    /// Pass rate as a percentage; zero when there are no tests.
    #[must_use]
    pub fn pass_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.passed as f64 / self.total as f64 * 100.0
        }
    }

    /// Tests that neither passed nor failed (skipped or unrecognized).
    #[must_use]
    pub const fn other(&self) -> u64 {
        self.total.saturating_sub(self.passed + self.failed)
    }
}

impl Add for TestCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            passed: self.passed + rhs.passed,
            failed: self.failed + rhs.failed,
            total: self.total + rhs.total,
        }
    }
}

impl AddAssign for TestCounts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for TestCounts {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

/// Render a pass rate with one decimal place, e.g. `66.7%`.
#[must_use]
pub fn format_pass_rate(counts: &TestCounts) -> String {
    format!("{:.1}%", counts.pass_rate())
}

/// A node in the result tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TestNode {
    pub name: String,
    #[serde(default)]
    pub node_type: NodeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration_in_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Self>,
}

impl TestNode {
    #[must_use]
    pub fn result_kind(&self) -> ResultKind {
        self.result
            .as_deref()
            .map_or(ResultKind::Unknown, ResultKind::classify)
    }

    #[must_use]
    pub const fn is_test_case(&self) -> bool {
        self.node_type.is_test_case()
    }

    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Roll up pass/fail/total counts for this subtree.
    ///
    /// A test case counts as exactly one test; its own children are diagnostic
    /// sub-nodes and are not descended into. Grouping nodes sum their children.
    /// Uses an explicit stack so pathological nesting cannot overflow.
    #[must_use]
    pub fn aggregate(&self) -> TestCounts {
        let mut counts = TestCounts::default();
        let mut stack: Vec<&Self> = vec![self];

        while let Some(node) = stack.pop() {
            if node.is_test_case() {
                counts += TestCounts::single(node.result_kind());
            } else {
                stack.extend(node.children.iter());
            }
        }

        counts
    }

    /// Failure-message children attached directly to this node.
    pub fn failure_messages(&self) -> impl Iterator<Item = &Self> {
        self.children
            .iter()
            .filter(|child| child.node_type == NodeType::FailureMessage)
    }
}

/// Roll up counts across a forest of root nodes.
#[must_use]
pub fn aggregate_forest(roots: &[TestNode]) -> TestCounts {
    roots.iter().map(TestNode::aggregate).sum()
}

/// The "tests" document: a forest of test nodes plus opaque device info.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    #[serde(default)]
    pub test_nodes: Vec<TestNode>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub devices: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub test_plan_configurations: Value,
}

impl TestResults {
    #[must_use]
    pub fn counts(&self) -> TestCounts {
        aggregate_forest(&self.test_nodes)
    }
}

/// One failure record from the summary document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TestFailure {
    #[serde(default)]
    pub test_name: String,
    #[serde(default)]
    pub target_name: String,
    #[serde(default)]
    pub failure_text: String,
    #[serde(default)]
    pub test_identifier_string: String,
}

/// Document-level statistics and failure list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TestResultsSummary {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub result: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_test_count: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub passed_tests: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub failed_tests: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub skipped_tests: u64,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub expected_failures: u64,
    #[serde(
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub start_time: Option<f64>,
    #[serde(
        default,
        deserialize_with = "lenient_f64",
        skip_serializing_if = "Option::is_none"
    )]
    pub finish_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment_description: Option<String>,
    #[serde(default)]
    pub test_failures: Vec<TestFailure>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub devices_and_configurations: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub top_insights: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub statistics: Value,
}

impl TestResultsSummary {
    /// First failure recorded for the identifier, in document order.
    #[must_use]
    pub fn failure_for(&self, identifier: &str) -> Option<&TestFailure> {
        self.test_failures
            .iter()
            .find(|failure| failure.test_identifier_string == identifier)
    }

    /// Wall-clock duration of the run in seconds, when both ends are known.
    #[must_use]
    pub fn duration_secs(&self) -> Option<f64> {
        match (self.start_time, self.finish_time) {
            (Some(start), Some(finish)) if finish >= start => Some(finish - start),
            _ => None,
        }
    }

    #[must_use]
    pub fn counts(&self) -> TestCounts {
        TestCounts::new(self.passed_tests, self.failed_tests, self.total_test_count)
    }
}
