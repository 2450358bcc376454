//! Output formatting for `xcresult_triage`.
//!
//! Supports human-readable text output and machine-parseable JSON. JSON mode
//! sends clean payloads to stdout with diagnostics on stderr.
//!
//! # Output Types
//!
//! - [`TreeListing`] / [`ListingEntry`] - whole-tree listing with indices (show)
//! - [`NodeDetails`] / [`FailureView`] - one node with failure analysis (show)
//! - [`TimelineSectionView`] - one activity timeline section (show --console)
//! - [`BundleEntry`] - a discovered result bundle (find)

mod output;
mod text;

pub use output::{
    BundleEntry, FailureView, ListingEntry, NodeDetails, RunSummary, TimelineSectionView,
    TreeListing, node_duration,
};
pub use text::{
    TextFormatOptions, format_counts, format_duration, format_listing_line, format_result_icon,
    format_result_icon_colored, format_result_label, format_size, index_column_width,
    render_bundles, render_details, render_listing, render_run_summary, terminal_width,
    truncate_title,
};
