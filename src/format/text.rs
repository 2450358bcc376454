//! Text formatting functions for `xcresult_triage`.
//!
//! Provides terminal formatting with optional ANSI color:
//! - Result icons (✓ ✗ ⊘ ?)
//! - Durations and pass rates
//! - Tree listing, node details and bundle lines

use super::output::{BundleEntry, ListingEntry, NodeDetails, RunSummary, TreeListing};
use crate::model::{ResultKind, TestCounts, format_pass_rate};
use crate::resolve::MatchType;
use colored::Colorize;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Result icon characters.
pub mod icons {
    pub const PASSED: &str = "✓";
    pub const FAILED: &str = "✗";
    pub const SKIPPED: &str = "⊘";
    pub const UNKNOWN: &str = "?";
}

/// Formatting options for text output.
#[derive(Debug, Clone, Copy)]
pub struct TextFormatOptions {
    pub use_color: bool,
    pub max_width: Option<usize>,
}

impl TextFormatOptions {
    #[must_use]
    pub const fn plain() -> Self {
        Self {
            use_color: false,
            max_width: None,
        }
    }
}

/// Return the icon for a result kind.
#[must_use]
pub const fn format_result_icon(kind: ResultKind) -> &'static str {
    match kind {
        ResultKind::Passed => icons::PASSED,
        ResultKind::Failed => icons::FAILED,
        ResultKind::Skipped => icons::SKIPPED,
        ResultKind::Unknown => icons::UNKNOWN,
    }
}

/// Format result icon with optional color.
#[must_use]
pub fn format_result_icon_colored(kind: ResultKind, use_color: bool) -> String {
    let icon = format_result_icon(kind);
    if !use_color {
        return icon.to_string();
    }

    match kind {
        ResultKind::Passed => icon.green().to_string(),
        ResultKind::Failed => icon.red().bold().to_string(),
        ResultKind::Skipped => icon.yellow().to_string(),
        ResultKind::Unknown => icon.bright_black().to_string(),
    }
}

/// Format result label with optional color.
#[must_use]
pub fn format_result_label(kind: ResultKind, use_color: bool) -> String {
    let label = kind.as_str();
    if !use_color {
        return label.to_string();
    }

    match kind {
        ResultKind::Passed => label.green().to_string(),
        ResultKind::Failed => label.red().bold().to_string(),
        ResultKind::Skipped => label.yellow().to_string(),
        ResultKind::Unknown => label.normal().to_string(),
    }
}

/// Human duration: `0.42s`, `2m 05s`, `1h 03m`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_duration(secs: f64) -> String {
    if !secs.is_finite() || secs < 0.0 {
        return "-".to_string();
    }
    if secs < 60.0 {
        return format!("{secs:.2}s");
    }
    let whole = secs.round() as u64;
    if whole < 3600 {
        format!("{}m {:02}s", whole / 60, whole % 60)
    } else {
        format!("{}h {:02}m", whole / 3600, (whole % 3600) / 60)
    }
}

/// `2 passed, 1 failed, 3 total (66.7%)`
#[must_use]
pub fn format_counts(counts: &TestCounts, use_color: bool) -> String {
    let passed = format!("{} passed", counts.passed);
    let failed = format!("{} failed", counts.failed);
    let (passed, failed) = if use_color {
        let failed = if counts.failed > 0 {
            failed.red().to_string()
        } else {
            failed
        };
        (passed.green().to_string(), failed)
    } else {
        (passed, failed)
    };
    format!(
        "{passed}, {failed}, {} total ({})",
        counts.total,
        format_pass_rate(counts)
    )
}

/// Determine terminal width from environment (falls back to 80).
#[must_use]
pub fn terminal_width() -> usize {
    if let Ok(columns) = std::env::var("COLUMNS") {
        if let Ok(value) = columns.trim().parse::<usize>() {
            if value > 0 {
                return value;
            }
        }
    }
    80
}

/// Truncate a name to fit within `max_len` visible columns.
///
/// Handles wide characters (emojis, CJK) correctly using `unicode-width`.
#[must_use]
pub fn truncate_title(title: &str, max_len: usize) -> String {
    if max_len == 0 {
        return String::new();
    }
    if UnicodeWidthStr::width(title) <= max_len {
        return title.to_string();
    }

    let (target_len, ellipsis) = if max_len <= 3 {
        (max_len, "")
    } else {
        (max_len - 3, "...")
    };
    let mut w = 0;
    let mut s = String::new();
    for c in title.chars() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(0);
        if w + cw > target_len {
            break;
        }
        w += cw;
        s.push(c);
    }
    s.push_str(ellipsis);
    s
}

fn visible_len(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Width of the `[n]` column for a listing.
#[must_use]
pub fn index_column_width(entries: &[ListingEntry]) -> usize {
    entries
        .iter()
        .filter_map(|entry| entry.index)
        .max()
        .map_or(0, |max| visible_len(&format!("[{max}]")))
}

/// Format one listing row.
///
/// Format: `{[n] right-aligned} {indent}{icon} {name}  ({detail})`
#[must_use]
pub fn format_listing_line(
    entry: &ListingEntry,
    index_width: usize,
    options: TextFormatOptions,
) -> String {
    let index = entry.index.map(|n| format!("[{n}]")).unwrap_or_default();
    let indent = "  ".repeat(entry.depth);
    let icon = format_result_icon_colored(entry.result, options.use_color);

    let detail = match (&entry.counts, &entry.duration) {
        (Some(counts), _) => Some(format!("{}/{} passed", counts.passed, counts.total)),
        (None, Some(duration)) => Some(duration.clone()),
        (None, None) => None,
    };
    let detail_plain = detail.map(|d| format!("  ({d})")).unwrap_or_default();

    let prefix_len = index_width + 1 + visible_len(&indent) + visible_len(format_result_icon(entry.result)) + 1;
    let name = options.max_width.map_or_else(
        || entry.name.clone(),
        |width| {
            truncate_title(
                &entry.name,
                width.saturating_sub(prefix_len + visible_len(&detail_plain)),
            )
        },
    );
    let detail = if options.use_color && !detail_plain.is_empty() {
        detail_plain.bright_black().to_string()
    } else {
        detail_plain
    };

    format!("{index:>index_width$} {indent}{icon} {name}{detail}")
}

/// Header lines for a run.
#[must_use]
pub fn render_run_summary(summary: &RunSummary, options: TextFormatOptions) -> Vec<String> {
    let title = if summary.title.is_empty() {
        "Test results".to_string()
    } else {
        summary.title.clone()
    };
    let mut lines = vec![if options.use_color {
        title.bold().to_string()
    } else {
        title
    }];
    if !summary.result.is_empty() {
        lines.push(format!("Result:   {}", summary.result));
    }
    lines.push(format!(
        "Tests:    {}",
        format_counts(&summary.counts, options.use_color)
    ));
    if summary.skipped > 0 || summary.expected_failures > 0 {
        lines.push(format!(
            "Other:    {} skipped, {} expected failures",
            summary.skipped, summary.expected_failures
        ));
    }
    if let Some(secs) = summary.duration_secs {
        lines.push(format!("Duration: {}", format_duration(secs)));
    }
    if let Some(environment) = &summary.environment {
        lines.push(format!("Env:      {environment}"));
    }
    lines
}

/// Full listing: header, blank line, one row per entry.
#[must_use]
pub fn render_listing(listing: &TreeListing, options: TextFormatOptions) -> Vec<String> {
    let mut lines = render_run_summary(&listing.summary, options);
    lines.push(String::new());
    let index_width = index_column_width(&listing.entries);
    lines.extend(
        listing
            .entries
            .iter()
            .map(|entry| format_listing_line(entry, index_width, options)),
    );
    lines
}

/// Single-node details, with failure analysis and timeline when present.
#[must_use]
pub fn render_details(details: &NodeDetails, options: TextFormatOptions) -> Vec<String> {
    let heading = format!(
        "{} {}",
        format_result_icon_colored(details.result, options.use_color),
        details.name
    );
    let mut lines = vec![if options.use_color {
        heading.bold().to_string()
    } else {
        heading
    }];

    lines.push(format!("Type:       {}", details.node_type));
    if let Some(identifier) = &details.identifier {
        lines.push(format!("Identifier: {identifier}"));
    }
    if let MatchType::Index(n) = details.matched_by {
        lines.push(format!("Index:      {n}"));
    }
    lines.push(format!(
        "Result:     {}",
        format_result_label(details.result, options.use_color)
    ));
    if let Some(duration) = &details.duration {
        lines.push(format!("Duration:   {duration}"));
    }
    if details.counts.total > 1 {
        lines.push(format!(
            "Tests:      {}",
            format_counts(&details.counts, options.use_color)
        ));
    }
    if !details.tags.is_empty() {
        lines.push(format!("Tags:       {}", details.tags.join(", ")));
    }
    if let Some(extra) = &details.details {
        lines.push(format!("Details:    {extra}"));
    }

    for failure in &details.failures {
        lines.push(String::new());
        let header = match &failure.target {
            Some(target) => format!("Failure ({target}):"),
            None => "Failure:".to_string(),
        };
        lines.push(if options.use_color {
            header.red().bold().to_string()
        } else {
            header
        });
        lines.extend(failure.text.lines().map(|line| format!("  {line}")));
        lines.push(String::new());
        lines.push(format!("Analysis: {}", failure.report.analysis));
        if !failure.report.suggestions.is_empty() {
            lines.push("Suggestions:".to_string());
            lines.extend(
                failure
                    .report
                    .suggestions
                    .iter()
                    .map(|suggestion| format!("  - {suggestion}")),
            );
        }
    }

    if let Some(sections) = &details.timeline {
        for section in sections {
            lines.push(String::new());
            lines.push(format!("--- {} ---", section.title));
            match section.status {
                "ok" => lines.extend(section.lines.iter().cloned()),
                "timed_out" => lines.push(format!("  ({} retrieval timed out)", section.title)),
                _ => lines.push("  (no data)".to_string()),
            }
        }
    }

    lines
}

/// One row per bundle: `date  size  path`.
#[must_use]
pub fn render_bundles(bundles: &[BundleEntry]) -> Vec<String> {
    bundles
        .iter()
        .map(|bundle| {
            format!(
                "{}  {:>9}  {}",
                bundle.modified.format("%Y-%m-%d %H:%M"),
                format_size(bundle.size_bytes),
                bundle.path.display()
            )
        })
        .collect()
}

/// Binary size with one decimal: `512 B`, `1.5 KiB`, `12.0 MiB`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{FailureCategory, FailureReport};
    use crate::format::output::FailureView;

    fn entry(depth: usize, index: Option<usize>, name: &str, result: ResultKind) -> ListingEntry {
        ListingEntry {
            depth,
            index,
            name: name.to_string(),
            node_type: if index.is_some() { "Test Case" } else { "Test Suite" }.to_string(),
            identifier: None,
            result,
            duration: index.map(|_| "0.01s".to_string()),
            counts: index.is_none().then(|| TestCounts::new(2, 1, 3)),
        }
    }

    #[test]
    fn test_result_icons() {
        assert_eq!(format_result_icon(ResultKind::Passed), "✓");
        assert_eq!(format_result_icon(ResultKind::Failed), "✗");
        assert_eq!(format_result_icon(ResultKind::Skipped), "⊘");
        assert_eq!(format_result_icon(ResultKind::Unknown), "?");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.123), "0.12s");
        assert_eq!(format_duration(125.0), "2m 05s");
        assert_eq!(format_duration(3780.0), "1h 03m");
        assert_eq!(format_duration(-1.0), "-");
    }

    #[test]
    fn test_format_counts_plain() {
        assert_eq!(
            format_counts(&TestCounts::new(2, 1, 3), false),
            "2 passed, 1 failed, 3 total (66.7%)"
        );
        assert_eq!(
            format_counts(&TestCounts::default(), false),
            "0 passed, 0 failed, 0 total (0.0%)"
        );
    }

    #[test]
    fn test_listing_lines_align_indices() {
        let entries = vec![
            entry(0, None, "Suite", ResultKind::Failed),
            entry(1, Some(9), "testA()", ResultKind::Passed),
            entry(1, Some(10), "testB()", ResultKind::Failed),
        ];
        let width = index_column_width(&entries);
        assert_eq!(width, 4);
        let lines: Vec<String> = entries
            .iter()
            .map(|e| format_listing_line(e, width, TextFormatOptions::plain()))
            .collect();
        assert_eq!(lines[0], "     ✗ Suite  (2/3 passed)");
        assert_eq!(lines[1], " [9]   ✓ testA()  (0.01s)");
        assert_eq!(lines[2], "[10]   ✗ testB()  (0.01s)");
    }

    #[test]
    fn test_listing_line_truncates_name() {
        let mut long = entry(0, Some(1), "testAVeryLongNameThatKeepsGoing()", ResultKind::Passed);
        long.duration = None;
        let options = TextFormatOptions {
            use_color: false,
            max_width: Some(20),
        };
        let line = format_listing_line(&long, 3, options);
        assert!(line.ends_with("..."), "{line}");
        assert!(visible_len(&line) <= 20, "{line}");
    }

    #[test]
    fn test_render_details_with_failure() {
        let details = NodeDetails {
            name: "testC()".to_string(),
            node_type: "Test Case".to_string(),
            identifier: Some("Suite/testC()".to_string()),
            matched_by: MatchType::Index(3),
            result: ResultKind::Failed,
            raw_result: Some("Failed".to_string()),
            duration: None,
            counts: TestCounts::new(0, 1, 1),
            tags: vec![],
            details: None,
            failures: vec![FailureView {
                text: "typeMismatch".to_string(),
                target: Some("AppTests".to_string()),
                report: FailureReport {
                    category: FailureCategory::TypeMismatch,
                    analysis: "Type Mismatch".to_string(),
                    suggestions: vec!["Check the model".to_string()],
                },
            }],
            timeline: None,
        };
        let lines = render_details(&details, TextFormatOptions::plain());
        assert_eq!(lines[0], "✗ testC()");
        assert!(lines.contains(&"Index:      3".to_string()));
        assert!(lines.contains(&"Failure (AppTests):".to_string()));
        assert!(lines.contains(&"Analysis: Type Mismatch".to_string()));
        assert!(lines.contains(&"  - Check the model".to_string()));
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KiB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MiB");
    }

    #[test]
    fn test_truncate_title_adds_ellipsis() {
        assert_eq!(truncate_title("This is a long title", 10), "This is...");
        assert_eq!(truncate_title("short", 10), "short");
    }
}
