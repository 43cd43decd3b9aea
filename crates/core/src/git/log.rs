//! Asynchronous `git log` reader.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use super::parser::parse_log;
use crate::errors::GitError;
use crate::events::EventSink;
use crate::identity::{build_unique_set, CommitterIdentity, IdentityMatch};

/// Format string producing one `email|name` line per commit.
const LOG_FORMAT: &str = "--pretty=format:%ae|%an";

/// What git prints, across versions, when `HEAD` has no commits to walk.
const EMPTY_HISTORY_MARKERS: &[&str] = &[
    "does not have any commits yet",
    "bad default revision 'HEAD'",
];

fn is_empty_history(stderr: &str) -> bool {
    EMPTY_HISTORY_MARKERS
        .iter()
        .any(|marker| stderr.contains(marker))
}

/// A validated Git working copy whose log can be read.
#[derive(Debug, Clone)]
pub struct GitLog {
    working_copy: PathBuf,
    git_dir: PathBuf,
    git_binary: String,
}

impl GitLog {
    /// Open the working copy at `path`.
    ///
    /// Fails with [`GitError::DirectoryNotFound`] if `path` is not a
    /// directory and [`GitError::RepositoryNotFound`] if it has no `.git`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GitError> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(GitError::DirectoryNotFound(path.to_path_buf()));
        }
        let working_copy = path.canonicalize()?;
        let git_dir = working_copy.join(".git");
        if !git_dir.exists() {
            return Err(GitError::RepositoryNotFound(path.to_path_buf()));
        }
        info!(path = %working_copy.display(), "opened git working copy");
        Ok(Self {
            working_copy,
            git_dir,
            git_binary: "git".into(),
        })
    }

    /// Use a different executable in place of `git`.
    pub fn with_git_binary(mut self, binary: impl Into<String>) -> Self {
        self.git_binary = binary.into();
        self
    }

    pub fn working_copy(&self) -> &Path {
        &self.working_copy
    }

    /// Run `git log` and return its raw output, one `email|name` per commit.
    ///
    /// A repository without commits yields an empty log.
    #[instrument(skip(self), fields(path = %self.working_copy.display()))]
    pub async fn read_log(&self) -> Result<String, GitError> {
        let git_dir = self.git_dir.to_string_lossy().to_string();
        let mut cmd = Command::new(&self.git_binary);
        cmd.arg("--git-dir")
            .arg(&git_dir)
            .args(["log", LOG_FORMAT])
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(binary = %self.git_binary, git_dir = %git_dir, "running git log");
        let output = cmd.output().await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                GitError::BinaryNotFound(self.git_binary.clone())
            } else {
                GitError::IoError(e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            if is_empty_history(&stderr) {
                info!("repository has no commits yet");
                return Ok(String::new());
            }
            let exit_code = output.status.code().unwrap_or(-1);
            warn!(exit_code, %stderr, "git log failed");
            return Err(GitError::CommandFailed { exit_code, stderr });
        }

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        debug!(bytes = stdout.len(), "read git log");
        Ok(stdout)
    }

    /// Read the log and fold it into the set of unique committers.
    pub async fn unique_committers(
        &self,
        rule: IdentityMatch,
        sink: Arc<dyn EventSink>,
    ) -> Result<(BTreeSet<CommitterIdentity>, usize), GitError> {
        let log = self.read_log().await?;
        Ok(build_unique_set(parse_log(&log), rule, sink))
    }
}
