//! Shared utilities for `xcresult_triage`.
//!
//! Result bundle discovery: `.xcresult` directories under a search root,
//! sized and dated, newest first.

use crate::error::{Result, TriageError};
use crate::format::BundleEntry;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

pub const BUNDLE_EXTENSION: &str = "xcresult";

/// Does the path name a result bundle?
#[must_use]
pub fn is_result_bundle(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(BUNDLE_EXTENSION))
}

/// Total size of every file below `path`.
#[must_use]
pub fn dir_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

fn describe_bundle(path: &Path) -> Result<BundleEntry> {
    let modified: DateTime<Utc> = fs::metadata(path)?.modified()?.into();
    Ok(BundleEntry {
        path: path.to_path_buf(),
        size_bytes: dir_size(path),
        modified,
    })
}

/// Find result bundles under `dir`, newest first.
///
/// Bundles are not descended into.
///
/// # Errors
///
/// - `BundleNotFound` if `dir` is not a directory
/// - `NoResultBundles` if nothing was found
pub fn find_bundles(dir: &Path) -> Result<Vec<BundleEntry>> {
    if !dir.is_dir() {
        return Err(TriageError::BundleNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut bundles = Vec::new();
    let mut walker = WalkDir::new(dir).follow_links(false).into_iter();
    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if entry.depth() > 0 && entry.file_type().is_dir() && is_result_bundle(entry.path()) {
            bundles.push(describe_bundle(entry.path())?);
            walker.skip_current_dir();
        }
    }

    if bundles.is_empty() {
        return Err(TriageError::NoResultBundles {
            path: dir.to_path_buf(),
        });
    }

    bundles.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path)));
    info!(count = bundles.len(), dir = %dir.display(), "Found result bundles");
    Ok(bundles)
}

/// Most recently modified bundle under `dir`.
///
/// # Errors
///
/// Same as [`find_bundles`].
pub fn newest_bundle(dir: &Path) -> Result<PathBuf> {
    find_bundles(dir)?
        .into_iter()
        .next()
        .map(|bundle| bundle.path)
        .ok_or_else(|| TriageError::NoResultBundles {
            path: dir.to_path_buf(),
        })
}
