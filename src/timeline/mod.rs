//! Activity timeline reconstruction.
//!
//! Activities arrive in several upstream dialects (see [`sources`]). Each one
//! is decoded on its own and normalized into [`ActivityRecord`] trees before
//! formatting, so dialect field names never reach the formatter.
//!
//! Formatting is a pre-order walk that emits one line per activity:
//!
//! ```text
//!      +0.00s Start Test at 10:00
//! ✗    +5.00s   Tap "Login"
//! ```
//!
//! Offsets are relative to the start time of the top-level "Start Test"
//! activity. Without one, every offset column shows a placeholder.

pub mod sources;

use crate::error::Result;
use crate::store::ResultStore;
use serde::Serialize;
use tracing::{debug, info, warn};

/// Minimum width of the offset column, e.g. `  +12.34s`. Wider offsets
/// widen the column for the whole block.
pub const OFFSET_WIDTH: usize = 9;
/// Spaces added per nesting level.
pub const INDENT_WIDTH: usize = 2;
pub const FAILURE_MARKER: &str = "✗ ";
pub const BLANK_MARKER: &str = "  ";
/// Title prefix of the activity that marks test start.
pub const TEST_START_MARKER: &str = "start test";

/// One normalized activity, with owned children.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ActivityRecord {
    pub title: String,
    pub start_time: Option<f64>,
    pub is_associated_with_failure: bool,
    pub child_activities: Vec<Self>,
}

impl ActivityRecord {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub const fn at(mut self, start_time: f64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    #[must_use]
    pub const fn failing(mut self) -> Self {
        self.is_associated_with_failure = true;
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<Self>) -> Self {
        self.child_activities = children;
        self
    }

    fn is_test_start(&self) -> bool {
        self.title.to_lowercase().starts_with(TEST_START_MARKER)
    }
}

/// Start time of the first top-level "Start Test" activity.
#[must_use]
pub fn find_baseline(records: &[ActivityRecord]) -> Option<f64> {
    records
        .iter()
        .find(|record| record.is_test_start())
        .and_then(|record| record.start_time)
}

/// A signed offset such as `+5.00s`, or `-` without a time or baseline.
fn offset_text(start_time: Option<f64>, baseline: Option<f64>) -> String {
    match (start_time, baseline) {
        (Some(time), Some(base)) => format!("{:+.2}s", time - base),
        _ => "-".to_string(),
    }
}

/// Format a record forest using its own baseline.
#[must_use]
pub fn format_activities(records: &[ActivityRecord]) -> Vec<String> {
    format_with_baseline(records, find_baseline(records))
}

/// Format a record forest against an explicit baseline.
///
/// Pre-order and depth-first with an explicit stack; children are indented
/// one level deeper than their parent. The offset column is as wide as the
/// widest offset, and never narrower than [`OFFSET_WIDTH`].
#[must_use]
pub fn format_with_baseline(records: &[ActivityRecord], baseline: Option<f64>) -> Vec<String> {
    let mut rows: Vec<(usize, &ActivityRecord, String)> = Vec::new();
    let mut stack: Vec<(usize, &ActivityRecord)> =
        records.iter().rev().map(|record| (0, record)).collect();

    while let Some((depth, record)) = stack.pop() {
        rows.push((depth, record, offset_text(record.start_time, baseline)));
        stack.extend(
            record
                .child_activities
                .iter()
                .rev()
                .map(|child| (depth + 1, child)),
        );
    }

    let width = rows
        .iter()
        .map(|(_, _, offset)| offset.len())
        .fold(OFFSET_WIDTH, usize::max);

    rows.into_iter()
        .map(|(depth, record, offset)| {
            let marker = if record.is_associated_with_failure {
                FAILURE_MARKER
            } else {
                BLANK_MARKER
            };
            format!(
                "{marker}{offset:>width$} {indent}{title}",
                indent = " ".repeat(depth * INDENT_WIDTH),
                title = record.title,
            )
        })
        .collect()
}

/// Labeled sections, always emitted in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    Activities,
    Attachments,
    ConsoleLog,
}

impl SectionKind {
    pub const ALL: [Self; 3] = [Self::Activities, Self::Attachments, Self::ConsoleLog];

    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Activities => "Activities",
            Self::Attachments => "Attachments",
            Self::ConsoleLog => "Console Log",
        }
    }
}

/// What one source contributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "lines")]
pub enum SectionContent {
    Lines(Vec<String>),
    /// Source missing, failed, or decoded to nothing.
    Empty,
    /// The retrieval hit its wall-clock budget.
    TimedOut,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineSection {
    pub kind: SectionKind,
    pub content: SectionContent,
}

impl TimelineSection {
    /// Header followed by the section body.
    #[must_use]
    pub fn render(&self) -> Vec<String> {
        let mut lines = vec![format!("--- {} ---", self.kind.title())];
        match &self.content {
            SectionContent::Lines(body) => lines.extend(body.iter().cloned()),
            SectionContent::Empty => lines.push("  (no data)".to_string()),
            SectionContent::TimedOut => {
                lines.push(format!("  ({} retrieval timed out)", self.kind.title()));
            }
        }
        lines
    }
}

/// All sections for one test, concatenated rather than time-merged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TimelineReport {
    pub sections: Vec<TimelineSection>,
}

impl TimelineReport {
    #[must_use]
    pub fn render(&self) -> Vec<String> {
        self.sections
            .iter()
            .flat_map(TimelineSection::render)
            .collect()
    }

    #[must_use]
    pub fn section(&self, kind: SectionKind) -> Option<&TimelineSection> {
        self.sections.iter().find(|section| section.kind == kind)
    }
}

/// Outcome of fetching and normalizing one source.
enum Fetched {
    Blocks(Vec<Block>),
    TimedOut,
    Failed,
}

/// A run of records with an optional label line (multi-run feeds).
struct Block {
    label: Option<String>,
    records: Vec<ActivityRecord>,
}

impl Block {
    fn unlabeled(records: Vec<ActivityRecord>) -> Self {
        Self {
            label: None,
            records,
        }
    }
}

fn fetch(kind: SectionKind, result: Result<Vec<Block>>) -> Fetched {
    match result {
        Ok(blocks) => Fetched::Blocks(blocks),
        Err(err) if err.is_timeout() => {
            warn!(section = kind.title(), error = %err, "timeline source timed out");
            Fetched::TimedOut
        }
        Err(err) => {
            warn!(section = kind.title(), error = %err, "timeline source unavailable");
            Fetched::Failed
        }
    }
}

fn has_records(fetched: &Fetched) -> bool {
    matches!(fetched, Fetched::Blocks(blocks) if blocks.iter().any(|b| !b.records.is_empty()))
}

/// Render fetched blocks; `own_baseline` re-derives the baseline per block.
fn to_section(
    kind: SectionKind,
    fetched: Fetched,
    shared_baseline: Option<f64>,
    own_baseline: bool,
) -> TimelineSection {
    let content = match fetched {
        Fetched::TimedOut => SectionContent::TimedOut,
        Fetched::Failed => SectionContent::Empty,
        Fetched::Blocks(blocks) => {
            let mut lines = Vec::new();
            for block in blocks {
                if let Some(label) = block.label {
                    lines.push(label);
                }
                let baseline = if own_baseline {
                    find_baseline(&block.records)
                } else {
                    shared_baseline
                };
                lines.extend(format_with_baseline(&block.records, baseline));
            }
            if lines.is_empty() {
                SectionContent::Empty
            } else {
                SectionContent::Lines(lines)
            }
        }
    };
    TimelineSection { kind, content }
}

fn first_baseline(fetched: &Fetched) -> Option<f64> {
    match fetched {
        Fetched::Blocks(blocks) => blocks.iter().find_map(|block| find_baseline(&block.records)),
        Fetched::TimedOut | Fetched::Failed => None,
    }
}

/// Build the full timeline report for one test.
///
/// Sources are queried in section order. A failing source degrades its own
/// section and never aborts the others. The compact activity feed is
/// preferred; the legacy object graph fills in when the feed yields nothing.
#[must_use]
pub fn collect(store: &dyn ResultStore, test_id: &str) -> TimelineReport {
    info!(test_id, "Reconstructing activity timeline");

    let mut activities = fetch(
        SectionKind::Activities,
        store.activities_json(test_id).and_then(|raw| {
            let feed = sources::ActivityFeed::parse(&raw)?;
            Ok(feed
                .into_runs()
                .into_iter()
                .map(|run| Block {
                    label: run.label,
                    records: run.records,
                })
                .collect())
        }),
    );

    if !has_records(&activities) && !matches!(activities, Fetched::TimedOut) {
        debug!(test_id, "activity feed empty; trying legacy object graph");
        let legacy = fetch(
            SectionKind::Activities,
            sources::legacy_activities(store, test_id).map(|records| vec![Block::unlabeled(records)]),
        );
        if has_records(&legacy) {
            activities = legacy;
        }
    }

    let attachments = fetch(
        SectionKind::Attachments,
        store.attachment_manifest_json(test_id).and_then(|raw| {
            let manifest = sources::AttachmentManifest::parse(&raw)?;
            Ok(vec![Block::unlabeled(manifest.records_for(test_id))])
        }),
    );

    let console = fetch(
        SectionKind::ConsoleLog,
        store.console_log_json().and_then(|raw| {
            let log = sources::ConsoleLog::parse(&raw)?;
            Ok(vec![Block::unlabeled(log.into_records())])
        }),
    );

    let baseline = first_baseline(&activities);
    debug!(?baseline, "timeline baseline");

    TimelineReport {
        sections: vec![
            to_section(SectionKind::Activities, activities, baseline, true),
            to_section(SectionKind::Attachments, attachments, baseline, false),
            to_section(SectionKind::ConsoleLog, console, baseline, false),
        ],
    }
}
