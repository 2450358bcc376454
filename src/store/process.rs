//! Bounded child-process execution.

use crate::error::{Result, TriageError};
use std::io::{ErrorKind, Read};
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join(handle: JoinHandle<Vec<u8>>) -> Result<Vec<u8>> {
    handle
        .join()
        .map_err(|_| TriageError::Other(anyhow::anyhow!("output reader thread panicked")))
}

/// Run `program args...` and return its stdout.
///
/// The child is killed once `timeout` elapses. Output pipes are drained on
/// reader threads so a chatty child never blocks on a full pipe.
///
/// # Errors
///
/// - `ToolNotFound` if the program cannot be launched
/// - `ToolTimeout` if the deadline passes first
/// - `ToolFailed` on a non-zero exit
pub fn run_with_timeout(program: &str, args: &[String], timeout: Duration) -> Result<String> {
    let command = format!("{program} {}", args.join(" "));
    debug!(%command, timeout_secs = timeout.as_secs(), "Running result-store tool");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => TriageError::ToolNotFound {
                program: program.to_string(),
            },
            _ => TriageError::Io(e),
        })?;

    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    let started_at = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if started_at.elapsed() >= timeout {
            let _ = child.kill();
            let _ = child.wait();
            // Readers are left detached: a grandchild may still hold the pipes.
            return Err(TriageError::ToolTimeout {
                command,
                timeout_secs: timeout.as_secs(),
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    let stdout = stdout.map(join).transpose()?.unwrap_or_default();
    let stderr = stderr.map(join).transpose()?.unwrap_or_default();
    trace!(
        elapsed_ms = started_at.elapsed().as_millis(),
        bytes = stdout.len(),
        "Result-store tool finished"
    );

    if !status.success() {
        return Err(TriageError::ToolFailed {
            command,
            exit_code: status.code(),
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&stdout).into_owned())
}
