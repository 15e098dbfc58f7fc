//! Bounded subprocess execution for history queries.
//!
//! Every git invocation goes through [`run_bounded`], which enforces a
//! wall-clock deadline and a cap on captured stdout. A query that hits
//! either bound has its child process killed before the error returns.

use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::error::HistoryError;

const STDERR_LIMIT: usize = 64 * 1024;
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Resource bounds applied to each history query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HistoryLimits {
    #[serde(rename = "timeout_secs", with = "crate::config::secs")]
    pub timeout: Duration,
    /// Maximum captured stdout, in bytes.
    #[serde(rename = "max_output_bytes")]
    pub max_output: usize,
}

impl Default for HistoryLimits {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            max_output: 10 * 1024 * 1024,
        }
    }
}

/// Captured result of a finished child process.
pub struct Output {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: String,
}

impl Output {
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }
}

enum Capped {
    Complete(Vec<u8>),
    Overflow,
}

fn read_capped<R: Read>(mut reader: R, limit: usize) -> io::Result<Capped> {
    let mut buf = Vec::new();
    reader
        .by_ref()
        .take(limit as u64 + 1)
        .read_to_end(&mut buf)?;
    if buf.len() > limit {
        Ok(Capped::Overflow)
    } else {
        Ok(Capped::Complete(buf))
    }
}

/// Keep at most `STDERR_LIMIT` bytes of stderr, draining the rest so the
/// child never blocks on a full pipe.
fn read_stderr<R: Read>(mut reader: R) -> String {
    let mut buf = Vec::new();
    let _ = reader
        .by_ref()
        .take(STDERR_LIMIT as u64)
        .read_to_end(&mut buf);
    let _ = io::copy(&mut reader, &mut io::sink());
    String::from_utf8_lossy(&buf).into_owned()
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn spawn_error(program: &str, err: io::Error) -> HistoryError {
    if err.kind() == io::ErrorKind::NotFound {
        HistoryError::Unavailable(format!("{program} executable not found"))
    } else {
        HistoryError::Unavailable(format!("cannot run {program}: {err}"))
    }
}

fn wait_until(
    child: &mut Child,
    deadline: Instant,
    timeout: Duration,
) -> Result<ExitStatus, HistoryError> {
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) if Instant::now() >= deadline => {
                kill(child);
                return Err(HistoryError::Timeout(timeout));
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(err) => {
                kill(child);
                return Err(HistoryError::Unavailable(format!("waiting for child: {err}")));
            }
        }
    }
}

/// Run `cmd` to completion under `limits`.
///
/// A non-zero exit status is not an error here; callers decide what a
/// failing query means.
pub fn run_bounded(cmd: &mut Command, limits: &HistoryLimits) -> Result<Output, HistoryError> {
    let program = cmd.get_program().to_string_lossy().into_owned();
    let deadline = Instant::now() + limits.timeout;

    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| spawn_error(&program, e))?;

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        kill(&mut child);
        return Err(HistoryError::Unavailable(format!(
            "{program}: output pipes not captured"
        )));
    };

    let (tx, rx) = mpsc::channel();
    let max_output = limits.max_output;
    thread::spawn(move || {
        let _ = tx.send(read_capped(stdout, max_output));
    });
    let stderr_reader = thread::spawn(move || read_stderr(stderr));

    let stdout = match rx.recv_timeout(limits.timeout) {
        Ok(Ok(Capped::Complete(bytes))) => bytes,
        Ok(Ok(Capped::Overflow)) => {
            kill(&mut child);
            return Err(HistoryError::OutputTooLarge(max_output));
        }
        Ok(Err(err)) => {
            kill(&mut child);
            return Err(HistoryError::Unavailable(format!(
                "reading {program} output: {err}"
            )));
        }
        Err(_) => {
            kill(&mut child);
            return Err(HistoryError::Timeout(limits.timeout));
        }
    };

    let status = wait_until(&mut child, deadline, limits.timeout)?;
    let stderr = stderr_reader.join().unwrap_or_default();

    Ok(Output {
        status,
        stdout,
        stderr,
    })
}

#[cfg(test)]
#[path = "process_test.rs"]
mod tests;
