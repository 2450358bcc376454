use crate::diagnostics::FailureReport;
use crate::loader::ResultDocument;
use crate::model::{ResultKind, TestCounts, TestNode, TestResultsSummary, format_pass_rate};
use crate::resolve::{MatchType, walk};
use crate::timeline::{SectionContent, TimelineReport, TimelineSection};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Run-level header shown above listings.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub title: String,
    pub result: String,
    pub counts: TestCounts,
    pub skipped: u64,
    pub expected_failures: u64,
    pub pass_rate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

impl RunSummary {
    /// Header for a document. Counts come from the tree so they always agree
    /// with the listing below them.
    #[must_use]
    pub fn new(summary: &TestResultsSummary, counts: TestCounts) -> Self {
        Self {
            title: summary.title.clone(),
            result: summary.result.clone(),
            counts,
            skipped: summary.skipped_tests,
            expected_failures: summary.expected_failures,
            pass_rate: format_pass_rate(&counts),
            duration_secs: summary.duration_secs(),
            environment: summary.environment_description.clone(),
        }
    }
}

/// One row of the tree listing.
#[derive(Debug, Clone, Serialize)]
pub struct ListingEntry {
    pub depth: usize,
    /// 1-based test-case index, reusable as a selector.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    pub name: String,
    pub node_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub result: ResultKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    /// Roll-up for grouping nodes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<TestCounts>,
}

/// Whole-tree listing view.
#[derive(Debug, Clone, Serialize)]
pub struct TreeListing {
    pub summary: RunSummary,
    pub entries: Vec<ListingEntry>,
}

impl TreeListing {
    /// Build the listing in resolver order. Diagnostic sub-nodes under a test
    /// case are omitted, but nested test cases are kept so every index the
    /// resolver accepts appears in the listing.
    #[must_use]
    pub fn build(document: &ResultDocument) -> Self {
        let roots = &document.tests.test_nodes;
        let mut entries = Vec::new();
        let mut case_depth: Option<usize> = None;

        for entry in walk(roots) {
            if let Some(depth) = case_depth {
                if entry.depth <= depth {
                    case_depth = None;
                } else if entry.index.is_none() {
                    continue;
                }
            }
            let node = entry.node;
            if node.is_test_case() && case_depth.is_none() {
                case_depth = Some(entry.depth);
            }
            entries.push(ListingEntry {
                depth: entry.depth,
                index: entry.index,
                name: node.name.clone(),
                node_type: node.node_type.as_str().to_string(),
                identifier: node.node_identifier.clone(),
                result: node.result_kind(),
                duration: node_duration(node),
                counts: (!node.is_test_case()).then(|| node.aggregate()),
            });
        }

        Self {
            summary: RunSummary::new(&document.summary, document.tests.counts()),
            entries,
        }
    }
}

/// Display duration: the document's own string, else derived from seconds.
#[must_use]
pub fn node_duration(node: &TestNode) -> Option<String> {
    node.duration
        .clone()
        .or_else(|| node.duration_in_seconds.map(super::format_duration))
}

/// Failure text plus its analysis.
#[derive(Debug, Clone, Serialize)]
pub struct FailureView {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(flatten)]
    pub report: FailureReport,
}

/// Single-node view.
#[derive(Debug, Clone, Serialize)]
pub struct NodeDetails {
    pub name: String,
    pub node_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub matched_by: MatchType,
    pub result: ResultKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    pub counts: TestCounts,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailureView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Vec<TimelineSectionView>>,
}

impl NodeDetails {
    #[must_use]
    pub fn new(node: &TestNode, matched_by: MatchType) -> Self {
        Self {
            name: node.name.clone(),
            node_type: node.node_type.as_str().to_string(),
            identifier: node.node_identifier.clone(),
            matched_by,
            result: node.result_kind(),
            raw_result: node.result.clone(),
            duration: node_duration(node),
            counts: node.aggregate(),
            tags: node.tags.clone(),
            details: node.details.clone(),
            failures: Vec::new(),
            timeline: None,
        }
    }
}

/// One timeline section in serializable form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineSectionView {
    pub title: String,
    /// `ok`, `empty` or `timed_out`.
    pub status: &'static str,
    pub lines: Vec<String>,
}

impl From<&TimelineSection> for TimelineSectionView {
    fn from(section: &TimelineSection) -> Self {
        let (status, lines) = match &section.content {
            SectionContent::Lines(lines) => ("ok", lines.clone()),
            SectionContent::Empty => ("empty", Vec::new()),
            SectionContent::TimedOut => ("timed_out", Vec::new()),
        };
        Self {
            title: section.kind.title().to_string(),
            status,
            lines,
        }
    }
}

impl TimelineSectionView {
    #[must_use]
    pub fn from_report(report: &TimelineReport) -> Vec<Self> {
        report.sections.iter().map(Self::from).collect()
    }
}

/// A discovered result bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleEntry {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: DateTime<Utc>,
}
