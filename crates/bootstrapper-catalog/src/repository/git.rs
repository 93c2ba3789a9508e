//! Git command backend.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use crate::error::RepositoryError;

/// The git operations the repository manager needs.
#[async_trait]
pub trait GitBackend: Send + Sync {
    /// Clone `url` into `dest`. An empty `branch` checks out the remote default.
    async fn clone_repo(&self, url: &str, branch: &str, dest: &Path)
    -> Result<(), RepositoryError>;

    /// Fast-forward the checkout at `repo`.
    async fn pull(&self, repo: &Path) -> Result<(), RepositoryError>;

    async fn current_branch(&self, repo: &Path) -> Result<String, RepositoryError>;

    async fn origin_url(&self, repo: &Path) -> Result<String, RepositoryError>;
}

/// Runs the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
    timeout: Duration,
}

impl GitCli {
    pub fn new(timeout: Duration) -> Self {
        Self::with_program("git", timeout)
    }

    pub fn with_program(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    async fn run(&self, cwd: Option<&Path>, args: &[&str]) -> Result<String, RepositoryError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        debug!("Running {} {}", self.program, args.join(" "));

        let output = timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| RepositoryError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| RepositoryError::Git(format!("failed to run {}: {}", self.program, e)))?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
        } else {
            let code = output.status.code().unwrap_or(-1);
            Err(RepositoryError::Git(format!(
                "{} {} exited with code {}: {}",
                self.program,
                args.first().copied().unwrap_or_default(),
                code,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }
}

#[async_trait]
impl GitBackend for GitCli {
    async fn clone_repo(
        &self,
        url: &str,
        branch: &str,
        dest: &Path,
    ) -> Result<(), RepositoryError> {
        let dest = dest.to_string_lossy();
        let mut args = vec!["clone", "--depth", "1"];
        if !branch.is_empty() {
            args.extend(["--branch", branch]);
        }
        args.extend(["--", url, &*dest]);
        self.run(None, &args).await.map(|_| ())
    }

    async fn pull(&self, repo: &Path) -> Result<(), RepositoryError> {
        self.run(Some(repo), &["pull", "--ff-only"]).await.map(|_| ())
    }

    async fn current_branch(&self, repo: &Path) -> Result<String, RepositoryError> {
        self.run(Some(repo), &["rev-parse", "--abbrev-ref", "HEAD"])
            .await
    }

    async fn origin_url(&self, repo: &Path) -> Result<String, RepositoryError> {
        self.run(Some(repo), &["remote", "get-url", "origin"]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program() {
        let git = GitCli::with_program("bootstrapper-no-such-git", Duration::from_secs(5));
        let result = git.run(None, &["--version"]).await;
        assert!(matches!(result, Err(RepositoryError::Git(msg)) if msg.contains("failed to run")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout() {
        let git = GitCli::with_program("sleep", Duration::from_millis(50));
        let result = git.run(None, &["5"]).await;
        assert!(matches!(result, Err(RepositoryError::Timeout(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit() {
        let git = GitCli::with_program("false", Duration::from_secs(5));
        let result = git.run(None, &["pull"]).await;
        assert!(matches!(result, Err(RepositoryError::Git(msg)) if msg.contains("exited with code 1")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_is_trimmed() {
        let git = GitCli::with_program("echo", Duration::from_secs(5));
        let out = git.run(None, &["main"]).await.unwrap();
        assert_eq!(out, "main");
    }
}
