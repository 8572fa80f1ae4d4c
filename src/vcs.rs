//! Version-control collaborator.
//!
//! The content store only needs three things from git: a full clone, an
//! update of an existing clone, and the time of the last commit that
//! touched a file. [`GitCli`] provides them by shelling out to `git`;
//! tests substitute their own [`VersionControl`].

use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;
use std::process::{Command, Output};

use crate::error::SyncError;

pub trait VersionControl: Send + Sync {
    /// Clone `url` into `dest`. `dest` must not already hold a clone.
    fn clone_repo(&self, url: &str, branch: Option<&str>, dest: &Path) -> Result<(), SyncError>;

    /// Bring the clone at `repo_dir` up to date with its remote.
    fn pull(&self, repo_dir: &Path, branch: Option<&str>) -> Result<(), SyncError>;

    /// Commit time of the most recent commit touching `file`.
    ///
    /// Returns `None` when the file has no history (untracked, or the
    /// clone is unreadable).
    fn last_commit_time(&self, repo_dir: &Path, file: &Path) -> Option<DateTime<Utc>>;
}

/// [`VersionControl`] backed by the `git` executable.
#[derive(Debug, Clone, Default)]
pub struct GitCli;

impl GitCli {
    pub fn new() -> Self {
        Self
    }
}

impl VersionControl for GitCli {
    fn clone_repo(&self, url: &str, branch: Option<&str>, dest: &Path) -> Result<(), SyncError> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut cmd = Command::new("git");
        cmd.arg("clone");
        if let Some(branch) = branch {
            cmd.args(["--branch", branch, "--single-branch"]);
        }
        cmd.arg(url);
        cmd.arg(dest);

        let output = cmd.output()?;
        if !output.status.success() {
            return Err(SyncError::Clone(stderr_of(&output)));
        }

        Ok(())
    }

    fn pull(&self, repo_dir: &Path, branch: Option<&str>) -> Result<(), SyncError> {
        let mut fetch = Command::new("git");
        fetch.arg("fetch").arg("origin");
        if let Some(branch) = branch {
            fetch.arg(branch);
        }
        let output = fetch.current_dir(repo_dir).output()?;
        if !output.status.success() {
            return Err(SyncError::Pull(format!("fetch: {}", stderr_of(&output))));
        }

        // The mirror never carries local edits, so a hard reset is a safe merge.
        let target = match branch {
            Some(branch) => format!("origin/{}", branch),
            None => "@{upstream}".to_string(),
        };
        let output = Command::new("git")
            .args(["reset", "--hard", &target])
            .current_dir(repo_dir)
            .output()?;
        if !output.status.success() {
            return Err(SyncError::Pull(format!("reset: {}", stderr_of(&output))));
        }

        Ok(())
    }

    fn last_commit_time(&self, repo_dir: &Path, file: &Path) -> Option<DateTime<Utc>> {
        let output = Command::new("git")
            .args(["log", "-1", "--format=%ct", "--"])
            .arg(file)
            .current_dir(repo_dir)
            .output()
            .ok()?;

        if !output.status.success() {
            return None;
        }

        let secs = String::from_utf8_lossy(&output.stdout)
            .trim()
            .parse::<i64>()
            .ok()?;
        Utc.timestamp_opt(secs, 0).single()
    }
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}
