//! Result-store access.
//!
//! Everything above this module sees raw JSON text only. [`XcResultTool`]
//! shells out to `xcrun xcresulttool` with a wall-clock budget per query;
//! [`ExportDirStore`] reads documents exported earlier into a directory.

mod process;

pub use process::run_with_timeout;

use crate::config::TriageConfig;
use crate::error::{Result, TriageError};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

pub const SUMMARY_FILE: &str = "summary.json";
pub const TESTS_FILE: &str = "tests.json";
pub const ACTIVITIES_FILE: &str = "activities.json";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const CONSOLE_FILE: &str = "console.json";
pub const LEGACY_FILE: &str = "legacy.json";

/// Source of raw result-store documents.
pub trait ResultStore: Send + Sync {
    /// Human-readable location, for logs and headers.
    fn location(&self) -> &Path;

    /// # Errors
    /// Tool, timeout or I/O failure.
    fn summary_json(&self) -> Result<String>;

    /// # Errors
    /// Tool, timeout or I/O failure.
    fn tests_json(&self) -> Result<String>;

    /// Compact activity feed for one test.
    ///
    /// # Errors
    /// Tool, timeout or I/O failure.
    fn activities_json(&self, test_id: &str) -> Result<String>;

    /// Attachment export manifest for one test.
    ///
    /// # Errors
    /// Tool, timeout or I/O failure.
    fn attachment_manifest_json(&self, test_id: &str) -> Result<String>;

    /// # Errors
    /// Tool, timeout or I/O failure.
    fn console_log_json(&self) -> Result<String>;

    /// A legacy graph object; `None` is the root record.
    ///
    /// # Errors
    /// Tool, timeout or I/O failure.
    fn legacy_object_json(&self, id: Option<&str>) -> Result<String>;
}

/// `xcrun xcresulttool` against a `.xcresult` bundle.
#[derive(Debug, Clone)]
pub struct XcResultTool {
    bundle: PathBuf,
    program: String,
    query_timeout: Duration,
    log_timeout: Duration,
}

impl XcResultTool {
    #[must_use]
    pub fn new(bundle: impl Into<PathBuf>, config: &TriageConfig) -> Self {
        Self {
            bundle: bundle.into(),
            program: config.xcrun.clone(),
            query_timeout: config.query_timeout,
            log_timeout: config.log_timeout,
        }
    }

    fn run(&self, args: &[&str], timeout: Duration) -> Result<String> {
        let mut full: Vec<String> = Vec::with_capacity(args.len() + 3);
        full.push("xcresulttool".to_string());
        full.extend(args.iter().map(ToString::to_string));
        full.push("--path".to_string());
        full.push(self.bundle.display().to_string());
        run_with_timeout(&self.program, &full, timeout)
    }
}

impl ResultStore for XcResultTool {
    fn location(&self) -> &Path {
        &self.bundle
    }

    fn summary_json(&self) -> Result<String> {
        self.run(&["get", "test-results", "summary"], self.query_timeout)
    }

    fn tests_json(&self) -> Result<String> {
        self.run(&["get", "test-results", "tests"], self.query_timeout)
    }

    fn activities_json(&self, test_id: &str) -> Result<String> {
        self.run(
            &["get", "test-results", "activities", "--test-id", test_id],
            self.log_timeout,
        )
    }

    fn attachment_manifest_json(&self, test_id: &str) -> Result<String> {
        let out_dir = tempfile::tempdir()?;
        let out_path = out_dir.path().display().to_string();
        self.run(
            &[
                "export",
                "attachments",
                "--test-id",
                test_id,
                "--output-path",
                &out_path,
            ],
            self.log_timeout,
        )?;
        Ok(fs::read_to_string(out_dir.path().join(MANIFEST_FILE))?)
    }

    fn console_log_json(&self) -> Result<String> {
        self.run(&["get", "log", "--type", "console"], self.log_timeout)
    }

    fn legacy_object_json(&self, id: Option<&str>) -> Result<String> {
        let mut args = vec!["get", "object", "--legacy", "--format", "json"];
        if let Some(id) = id {
            args.extend(["--id", id]);
        }
        self.run(&args, self.log_timeout)
    }
}

/// A directory of previously exported JSON documents.
///
/// Legacy objects other than the root live in `legacy-<id>.json`.
#[derive(Debug, Clone)]
pub struct ExportDirStore {
    dir: PathBuf,
}

impl ExportDirStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Does `dir` hold both primary documents?
    #[must_use]
    pub fn is_export_dir(dir: &Path) -> bool {
        dir.join(SUMMARY_FILE).is_file() && dir.join(TESTS_FILE).is_file()
    }

    fn read(&self, name: &str) -> Result<String> {
        let path = self.dir.join(name);
        debug!(path = %path.display(), "Reading exported document");
        Ok(fs::read_to_string(path)?)
    }
}

impl ResultStore for ExportDirStore {
    fn location(&self) -> &Path {
        &self.dir
    }

    fn summary_json(&self) -> Result<String> {
        self.read(SUMMARY_FILE)
    }

    fn tests_json(&self) -> Result<String> {
        self.read(TESTS_FILE)
    }

    fn activities_json(&self, _test_id: &str) -> Result<String> {
        self.read(ACTIVITIES_FILE)
    }

    fn attachment_manifest_json(&self, _test_id: &str) -> Result<String> {
        self.read(MANIFEST_FILE)
    }

    fn console_log_json(&self) -> Result<String> {
        self.read(CONSOLE_FILE)
    }

    fn legacy_object_json(&self, id: Option<&str>) -> Result<String> {
        match id {
            None => self.read(LEGACY_FILE),
            Some(id) => self.read(&format!("legacy-{id}.json")),
        }
    }
}

/// Open the store behind `path`.
///
/// # Errors
///
/// Returns `BundleNotFound` if `path` does not exist.
pub fn open(path: &Path, config: &TriageConfig) -> Result<Box<dyn ResultStore>> {
    if !path.exists() {
        return Err(TriageError::BundleNotFound {
            path: path.to_path_buf(),
        });
    }

    if path.is_dir() && ExportDirStore::is_export_dir(path) {
        info!(path = %path.display(), "Using exported document directory");
        Ok(Box::new(ExportDirStore::new(path)))
    } else {
        info!(path = %path.display(), program = %config.xcrun, "Using xcresulttool");
        Ok(Box::new(XcResultTool::new(path, config)))
    }
}
