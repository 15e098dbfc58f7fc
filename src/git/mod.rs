//! History queries against git.
//!
//! [`HistoryClient`] is the seam between the attribution pipeline and
//! version control. [`GitCli`] implements it by shelling out to the `git`
//! executable. Every query runs with the file's containing directory as
//! working directory and names the file by its bare file name, so the same
//! repository works when reached through different mount points.

pub mod process;

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::HistoryError;
pub use process::HistoryLimits;
use process::{Output, run_bounded};

/// Version-control capability needed by the attribution pipeline.
pub trait HistoryClient: Send + Sync {
    /// Whether `path` is tracked. Unknown paths answer `false`.
    fn is_under_version_control(&self, path: &Path) -> Result<bool, HistoryError>;

    /// Whether a tracked `path` differs from the last commit. Clean and
    /// untracked paths answer `false`.
    fn has_uncommitted_changes(&self, path: &Path) -> Result<bool, HistoryError>;

    /// Whether `path` lives inside a work tree.
    fn is_inside_repository(&self, path: &Path) -> Result<bool, HistoryError>;

    /// Raw line-porcelain attribution for `path`. When `substitute` is given,
    /// lines are attributed against its content instead of the file on disk.
    fn line_attribution(
        &self,
        path: &Path,
        substitute: Option<&Path>,
    ) -> Result<String, HistoryError>;

    fn repository_root(&self, path: &Path) -> Result<PathBuf, HistoryError>;

    /// Commit id of `HEAD`, or `None` before the first commit.
    fn current_revision(&self, path: &Path) -> Result<Option<String>, HistoryError>;
}

/// [`HistoryClient`] backed by the `git` command-line tool.
pub struct GitCli {
    program: OsString,
    limits: HistoryLimits,
}

impl GitCli {
    pub fn new(limits: HistoryLimits) -> Self {
        Self::with_program("git", limits)
    }

    pub fn with_program(program: impl Into<OsString>, limits: HistoryLimits) -> Self {
        Self {
            program: program.into(),
            limits,
        }
    }

    fn run<I, S>(&self, dir: &Path, args: I) -> Result<Output, HistoryError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        // Stable English diagnostics; several answers depend on stderr text.
        cmd.current_dir(dir)
            .args(args)
            .env("LC_ALL", "C")
            .env("GIT_OPTIONAL_LOCKS", "0");
        run_bounded(&mut cmd, &self.limits)
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new(HistoryLimits::default())
    }
}

/// Split `path` into (containing directory, file name).
fn split_path(path: &Path) -> Result<(PathBuf, OsString), HistoryError> {
    let name = path
        .file_name()
        .ok_or_else(|| HistoryError::Unavailable(format!("{}: no file name", path.display())))?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, name.to_os_string()))
}

fn failure(what: &str, out: &Output) -> HistoryError {
    let msg = out.stderr.trim();
    if msg.is_empty() {
        HistoryError::Unavailable(format!("git {what} failed ({})", out.status))
    } else {
        HistoryError::Unavailable(format!("git {what}: {msg}"))
    }
}

/// git's answer when a path (or the whole branch) has no history yet.
fn is_missing_history(stderr: &str) -> bool {
    let s = stderr.to_lowercase();
    s.contains("no such path") || s.contains("no such ref") || s.contains("bad revision 'head'")
}

/// True if `git status --porcelain` output reports a change other than
/// untracked or ignored.
fn has_tracked_changes(status: &str) -> bool {
    status
        .lines()
        .filter(|l| l.len() >= 2)
        .any(|l| !l.starts_with("??") && !l.starts_with("!!"))
}

impl HistoryClient for GitCli {
    fn is_under_version_control(&self, path: &Path) -> Result<bool, HistoryError> {
        let (dir, name) = split_path(path)?;
        let name = name.as_os_str();
        let out = self.run(
            &dir,
            [
                OsStr::new("ls-files"),
                OsStr::new("--error-unmatch"),
                OsStr::new("--"),
                name,
            ],
        )?;
        match out.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(failure("ls-files", &out)),
        }
    }

    fn has_uncommitted_changes(&self, path: &Path) -> Result<bool, HistoryError> {
        let (dir, name) = split_path(path)?;
        let name = name.as_os_str();
        let out = self.run(
            &dir,
            [
                OsStr::new("status"),
                OsStr::new("--porcelain"),
                OsStr::new("--"),
                name,
            ],
        )?;
        if !out.status.success() {
            return Err(failure("status", &out));
        }
        Ok(has_tracked_changes(&out.stdout_lossy()))
    }

    fn is_inside_repository(&self, path: &Path) -> Result<bool, HistoryError> {
        let (dir, _) = split_path(path)?;
        if !dir.is_dir() {
            return Ok(false);
        }
        let out = self.run(&dir, ["rev-parse", "--is-inside-work-tree"])?;
        Ok(out.status.success() && out.stdout_lossy().trim() == "true")
    }

    fn line_attribution(
        &self,
        path: &Path,
        substitute: Option<&Path>,
    ) -> Result<String, HistoryError> {
        let (dir, name) = split_path(path)?;
        let mut args: Vec<&OsStr> = vec![OsStr::new("blame"), OsStr::new("--line-porcelain")];
        if let Some(sub) = substitute {
            args.push(OsStr::new("--contents"));
            args.push(sub.as_os_str());
        }
        args.push(OsStr::new("--"));
        args.push(name.as_os_str());

        let out = self.run(&dir, args)?;
        if out.status.success() {
            return Ok(out.stdout_lossy());
        }
        if is_missing_history(&out.stderr) {
            debug!(path = %path.display(), "no history for path, attributing as uncommitted");
            return Ok(String::new());
        }
        Err(failure("blame", &out))
    }

    fn repository_root(&self, path: &Path) -> Result<PathBuf, HistoryError> {
        let (dir, _) = split_path(path)?;
        let out = self.run(&dir, ["rev-parse", "--show-toplevel"])?;
        if !out.status.success() {
            return Err(failure("rev-parse", &out));
        }
        Ok(PathBuf::from(out.stdout_lossy().trim()))
    }

    fn current_revision(&self, path: &Path) -> Result<Option<String>, HistoryError> {
        let (dir, _) = split_path(path)?;
        let out = self.run(&dir, ["rev-parse", "--verify", "-q", "HEAD"])?;
        match out.status.code() {
            Some(0) => Ok(Some(out.stdout_lossy().trim().to_string())),
            Some(1) => Ok(None),
            _ => Err(failure("rev-parse", &out)),
        }
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
