//! Upstream activity dialects.
//!
//! Each dialect gets its own serde types and a conversion into
//! [`ActivityRecord`]. Unknown fields are ignored and missing optional fields
//! default, so a dialect revision that adds data keeps decoding.

use super::ActivityRecord;
use crate::error::Result;
use crate::loader::decode;
use crate::model::lenient_f64;
use crate::store::ResultStore;
use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

// ---------------------------------------------------------------------------
// Compact activity feed
// ---------------------------------------------------------------------------

/// `get test-results activities` output.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFeed {
    #[serde(default)]
    pub test_identifier: Option<String>,
    #[serde(default)]
    pub test_name: Option<String>,
    #[serde(default)]
    pub test_runs: Vec<FeedRun>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedRun {
    #[serde(default)]
    pub device: Option<FeedDevice>,
    #[serde(default)]
    pub activities: Vec<FeedActivity>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedDevice {
    #[serde(default)]
    pub device_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedActivity {
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub is_associated_with_failure: bool,
    #[serde(default)]
    pub child_activities: Vec<Self>,
    #[serde(default)]
    pub attachments: Vec<FeedAttachment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedAttachment {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub timestamp: Option<f64>,
}

/// Records of one test run, labeled when the feed holds several runs.
#[derive(Debug, Clone, PartialEq)]
pub struct RunActivities {
    pub label: Option<String>,
    pub records: Vec<ActivityRecord>,
}

impl From<FeedActivity> for ActivityRecord {
    fn from(activity: FeedActivity) -> Self {
        let mut children: Vec<Self> = activity
            .child_activities
            .into_iter()
            .map(Self::from)
            .collect();
        children.extend(activity.attachments.into_iter().map(|attachment| Self {
            title: format!("Attachment: {}", attachment.name),
            start_time: attachment.timestamp,
            ..Self::default()
        }));
        Self {
            title: activity.title,
            start_time: activity.start_time,
            is_associated_with_failure: activity.is_associated_with_failure,
            child_activities: children,
        }
    }
}

impl ActivityFeed {
    /// # Errors
    ///
    /// Returns `MalformedDocument` if the feed does not decode.
    pub fn parse(raw: &str) -> Result<Self> {
        decode("activities", raw)
    }

    /// Normalize every run. A single run stays unlabeled.
    #[must_use]
    pub fn into_runs(self) -> Vec<RunActivities> {
        let labeled = self.test_runs.len() > 1;
        self.test_runs
            .into_iter()
            .enumerate()
            .map(|(i, run)| {
                let label = labeled.then(|| {
                    match run.device.and_then(|device| device.device_name) {
                        Some(device) => format!("Run {} ({device})", i + 1),
                        None => format!("Run {}", i + 1),
                    }
                });
                RunActivities {
                    label,
                    records: run.activities.into_iter().map(ActivityRecord::from).collect(),
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Attachment manifest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    #[serde(default)]
    pub test_identifier: String,
    #[serde(default)]
    pub attachments: Vec<ManifestAttachment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestAttachment {
    #[serde(default)]
    pub exported_file_name: String,
    #[serde(default)]
    pub suggested_human_readable_name: Option<String>,
    #[serde(default)]
    pub is_associated_with_failure: bool,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub timestamp: Option<f64>,
}

impl ManifestAttachment {
    fn title(&self) -> String {
        match self.suggested_human_readable_name.as_deref() {
            Some(name) if !name.is_empty() && name != self.exported_file_name => {
                format!("{name} ({})", self.exported_file_name)
            }
            _ => self.exported_file_name.clone(),
        }
    }
}

/// `manifest.json` written by `export attachments`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct AttachmentManifest {
    pub entries: Vec<ManifestEntry>,
}

impl AttachmentManifest {
    /// # Errors
    ///
    /// Returns `MalformedDocument` if the manifest does not decode.
    pub fn parse(raw: &str) -> Result<Self> {
        decode("attachments", raw)
    }

    /// Flat records for one test; an empty id keeps every entry.
    #[must_use]
    pub fn records_for(&self, test_id: &str) -> Vec<ActivityRecord> {
        self.entries
            .iter()
            .filter(|entry| test_id.is_empty() || entry.test_identifier == test_id)
            .flat_map(|entry| &entry.attachments)
            .map(|attachment| ActivityRecord {
                title: attachment.title(),
                start_time: attachment.timestamp,
                is_associated_with_failure: attachment.is_associated_with_failure,
                child_activities: Vec::new(),
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Console log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsoleEntry {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub timestamp: Option<f64>,
    #[serde(default, alias = "message")]
    pub content: String,
    #[serde(default)]
    pub kind: Option<String>,
}

impl ConsoleEntry {
    fn is_failure(&self) -> bool {
        self.kind.as_deref().is_some_and(|kind| {
            let kind = kind.to_lowercase();
            kind.contains("fail") || kind.contains("error")
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ConsoleDocument {
    Entries(Vec<ConsoleEntry>),
    Wrapped {
        #[serde(alias = "logs")]
        entries: Vec<ConsoleEntry>,
    },
}

/// `get log --type console` output.
#[derive(Debug, Clone, Default)]
pub struct ConsoleLog {
    pub entries: Vec<ConsoleEntry>,
}

impl ConsoleLog {
    /// # Errors
    ///
    /// Returns `MalformedDocument` if the log does not decode.
    pub fn parse(raw: &str) -> Result<Self> {
        let entries = match decode::<ConsoleDocument>("console log", raw)? {
            ConsoleDocument::Entries(entries) | ConsoleDocument::Wrapped { entries } => entries,
        };
        Ok(Self { entries })
    }

    /// One record per non-blank content line.
    #[must_use]
    pub fn into_records(self) -> Vec<ActivityRecord> {
        self.entries
            .iter()
            .flat_map(|entry| {
                let failed = entry.is_failure();
                entry
                    .content
                    .lines()
                    .map(str::trim_end)
                    .filter(|line| !line.trim().is_empty())
                    .map(move |line| ActivityRecord {
                        title: line.to_string(),
                        start_time: entry.timestamp,
                        is_associated_with_failure: failed,
                        child_activities: Vec::new(),
                    })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Legacy object graph
// ---------------------------------------------------------------------------

const LEGACY_TEST_METADATA: &str = "ActionTestMetadata";

/// Unwrap `{"_value": ...}` string wrappers.
fn legacy_str(value: &Value) -> Option<&str> {
    value
        .get("_value")
        .and_then(Value::as_str)
        .or_else(|| value.as_str())
}

/// Unwrap `{"_values": [...]}` array wrappers.
fn legacy_values(value: &Value) -> &[Value] {
    value
        .get("_values")
        .and_then(Value::as_array)
        .or_else(|| value.as_array())
        .map_or(&[], Vec::as_slice)
}

fn legacy_type_name(value: &Value) -> Option<&str> {
    value.get("_type")?.get("_name")?.as_str()
}

fn reference_id(value: &Value) -> Option<&str> {
    value.get("id").and_then(legacy_str)
}

#[allow(clippy::cast_precision_loss)]
fn parse_legacy_date(value: &Value) -> Option<f64> {
    if let Some(seconds) = value.get("_value").and_then(Value::as_f64) {
        return Some(seconds);
    }
    let raw = legacy_str(value)?;
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .map(|date| date.timestamp_millis() as f64 / 1000.0)
        .map_err(|e| debug!(raw, error = %e, "unparseable legacy date"))
        .ok()
}

fn legacy_activity(value: &Value) -> Option<ActivityRecord> {
    let title = legacy_str(value.get("title")?)?.to_string();
    let start_time = value.get("start").and_then(parse_legacy_date);
    let failed = value
        .get("failureSummaryIDs")
        .is_some_and(|ids| !legacy_values(ids).is_empty());
    let children = value
        .get("subactivities")
        .map(legacy_values)
        .unwrap_or_default()
        .iter()
        .filter_map(legacy_activity)
        .collect();
    Some(ActivityRecord {
        title,
        start_time,
        is_associated_with_failure: failed,
        child_activities: children,
    })
}

/// An `ActionTestSummary` from the legacy object graph.
#[derive(Debug, Clone, Default)]
pub struct LegacyActivityGraph {
    pub records: Vec<ActivityRecord>,
}

impl LegacyActivityGraph {
    /// # Errors
    ///
    /// Returns `MalformedDocument` if the object is not JSON.
    pub fn parse(raw: &str) -> Result<Self> {
        let value: Value = decode("legacy object", raw)?;
        Ok(Self::from_value(&value))
    }

    /// Normalize a summary object; anything without activities yields none.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let records = value
            .get("activitySummaries")
            .map(legacy_values)
            .unwrap_or_default()
            .iter()
            .filter_map(legacy_activity)
            .collect();
        Self { records }
    }

    fn is_summary(value: &Value) -> bool {
        value.get("activitySummaries").is_some()
    }
}

/// `summaryRef` id of the metadata object for `test_id`, if any.
fn find_summary_ref<'a>(value: &'a Value, test_id: &str) -> Option<&'a str> {
    let mut stack = vec![value];
    while let Some(current) = stack.pop() {
        match current {
            Value::Object(map) => {
                if legacy_type_name(current) == Some(LEGACY_TEST_METADATA)
                    && map.get("identifier").and_then(legacy_str) == Some(test_id)
                {
                    if let Some(id) = map.get("summaryRef").and_then(reference_id) {
                        return Some(id);
                    }
                }
                stack.extend(map.values());
            }
            Value::Array(items) => stack.extend(items),
            _ => {}
        }
    }
    None
}

/// `testsRef` ids of every action in an invocation record.
fn tests_ref_ids(root: &Value) -> Vec<String> {
    root.get("actions")
        .map(legacy_values)
        .unwrap_or_default()
        .iter()
        .filter_map(|action| action.get("actionResult")?.get("testsRef"))
        .filter_map(reference_id)
        .map(str::to_string)
        .collect()
}

/// Activities for one test from the legacy object graph.
///
/// The root object is either the test summary itself or an invocation
/// record, in which case the graph is followed through `testsRef` to the
/// test's metadata and then `summaryRef` to its summary.
///
/// # Errors
///
/// Propagates store and decoding failures.
pub fn legacy_activities(store: &dyn ResultStore, test_id: &str) -> Result<Vec<ActivityRecord>> {
    let root: Value = decode("legacy object", &store.legacy_object_json(None)?)?;
    if LegacyActivityGraph::is_summary(&root) {
        return Ok(LegacyActivityGraph::from_value(&root).records);
    }

    for tests_ref in tests_ref_ids(&root) {
        let plan: Value = decode("legacy object", &store.legacy_object_json(Some(&tests_ref))?)?;
        if let Some(summary_ref) = find_summary_ref(&plan, test_id) {
            debug!(test_id, summary_ref, "found legacy test summary");
            let summary = store.legacy_object_json(Some(summary_ref))?;
            return Ok(LegacyActivityGraph::parse(&summary)?.records);
        }
    }

    debug!(test_id, "test not present in legacy object graph");
    Ok(Vec::new())
}
