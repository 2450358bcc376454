#![allow(dead_code)]

use assert_cmd::Command;
use std::fs;
use std::path::Path;
use std::sync::Once;
use std::time::Instant;
use tempfile::TempDir;
use tracing::info;

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        xcresult_triage::logging::init_test_logging();
    });
}

pub struct TestLogGuard {
    name: String,
    start: Instant,
}

impl TestLogGuard {
    fn new(name: &str) -> Self {
        init_test_logging();
        info!("{name}: starting");
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }
}

impl Drop for TestLogGuard {
    fn drop(&mut self) {
        info!(
            "{}: assertions passed (elapsed {:?})",
            self.name,
            self.start.elapsed()
        );
    }
}

pub fn test_log(name: &str) -> TestLogGuard {
    TestLogGuard::new(name)
}

pub const MISSING_KEY_FAILURE: &str = r#"LoginTests.swift:42: XCTAssertNoThrow failed: threw error "keyNotFound(CodingKeys(stringValue: \"userId\", intValue: nil), Swift.DecodingError.Context(codingPath: [], debugDescription: \"No value associated with key CodingKeys(stringValue: \\\"userId\\\", intValue: nil) (\\\"userId\\\").\", underlyingError: nil))""#;

/// Tests document: one unit bundle with three cases (2 pass, 1 fail) and a UI
/// bundle with one skipped case. Index order: testA, testB, testC, testD.
pub fn tests_json() -> String {
    serde_json::json!({
        "testNodes": [{
            "name": "AppTests",
            "nodeType": "Test Plan",
            "result": "Failed",
            "children": [
                {
                    "name": "AppUnitTests",
                    "nodeType": "Unit test bundle",
                    "result": "Failed",
                    "children": [{
                        "name": "LoginTests",
                        "nodeType": "Test Suite",
                        "result": "Failed",
                        "nodeIdentifier": "LoginTests",
                        "children": [
                            {
                                "name": "testA()",
                                "nodeType": "Test Case",
                                "result": "Passed",
                                "nodeIdentifier": "LoginTests/testA()",
                                "duration": "0.01s",
                                "durationInSeconds": 0.01
                            },
                            {
                                "name": "testB()",
                                "nodeType": "Test Case",
                                "result": "Passed",
                                "nodeIdentifier": "LoginTests/testB()",
                                "durationInSeconds": "0.02"
                            },
                            {
                                "name": "testC()",
                                "nodeType": "Test Case",
                                "result": "Failed",
                                "nodeIdentifier": "LoginTests/testC()",
                                "durationInSeconds": 1.234_567_890_123_4,
                                "children": [{
                                    "name": "keyNotFound",
                                    "nodeType": "Failure Message",
                                    "result": "Failed"
                                }]
                            }
                        ]
                    }]
                },
                {
                    "name": "AppUITests",
                    "nodeType": "UI test bundle",
                    "result": "Skipped",
                    "children": [{
                        "name": "testD()",
                        "nodeType": "Test Case",
                        "result": "Skipped",
                        "nodeIdentifier": "LaunchTests/testD()"
                    }]
                }
            ]
        }]
    })
    .to_string()
}

pub fn summary_json() -> String {
    serde_json::json!({
        "title": "Test - App",
        "result": "Failed",
        "totalTestCount": 4,
        "passedTests": 2,
        "failedTests": 1,
        "skippedTests": 1,
        "expectedFailures": 0,
        "startTime": 1_712_345_600.123_456_789_012_3,
        "finishTime": 1_712_345_725.5,
        "environmentDescription": "App · Built with macOS 14.4",
        "testFailures": [{
            "testName": "testC()",
            "targetName": "AppUnitTests",
            "failureText": MISSING_KEY_FAILURE,
            "testIdentifierString": "LoginTests/testC()"
        }]
    })
    .to_string()
}

pub const ACTIVITIES_JSON: &str = r#"{
    "testIdentifier": "LoginTests/testC()",
    "testRuns": [{
        "activities": [{
            "title": "Start Test at 2024-04-05 19:33:20.000",
            "startTime": 100,
            "childActivities": [{
                "title": "Decode user payload",
                "startTime": 105,
                "isAssociatedWithFailure": true
            }]
        }]
    }]
}"#;

pub const CONSOLE_JSON: &str = r#"[{"timestamp": 106.25, "content": "decoder error", "kind": "testFailure"}]"#;

/// An exported-JSON directory with both primary documents.
pub struct ExportFixture {
    pub dir: TempDir,
}

impl ExportFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        fs::write(dir.path().join("summary.json"), summary_json()).expect("write summary");
        fs::write(dir.path().join("tests.json"), tests_json()).expect("write tests");
        Self { dir }
    }

    /// Also write the timeline documents.
    pub fn with_timeline() -> Self {
        let fixture = Self::new();
        fixture.write("activities.json", ACTIVITIES_JSON);
        fixture.write("console.json", CONSOLE_JSON);
        fixture
    }

    pub fn write(&self, name: &str, body: &str) {
        fs::write(self.dir.path().join(name), body).expect("write fixture");
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}

/// `xctriage` with a clean environment rooted at `cwd`.
pub fn xctriage(cwd: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("xctriage"));
    cmd.current_dir(cwd);
    cmd.env("NO_COLOR", "1");
    cmd.env("HOME", cwd);
    cmd.env_remove("RUST_LOG");
    cmd.env_remove("XCTRIAGE_XCRUN");
    cmd
}
