use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// A git subcommand that did not complete successfully.
///
/// Callers decide recovery: the sync policy records these per repository,
/// it never retries them.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("git {command} failed in {dir}: {stderr}")]
    CommandFailed {
        command: String,
        dir: String,
        stderr: String,
    },

    #[error("failed to spawn git {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {command} timed out after {}s in {dir}", timeout.as_secs())]
    TimedOut {
        command: String,
        dir: String,
        timeout: Duration,
    },
}

/// Captured output of a git invocation that exited zero.
#[derive(Debug)]
pub struct GitOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Runs git subcommands against a working directory and captures their output.
#[derive(Debug, Clone)]
pub struct GitRunner {
    timeout: Duration,
}

impl GitRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Run `git <args>` with `dir` as the working directory.
    ///
    /// The child is placed in its own process group so an interrupt delivered
    /// to the terminal does not reach in-flight git subprocesses; the
    /// scheduler decides when to stop dispatching. Non-zero exit maps to
    /// [`GitError::CommandFailed`] carrying the captured stderr.
    pub async fn run(&self, args: &[&str], dir: &Path) -> Result<GitOutput, GitError> {
        let command = args.join(" ");
        debug!("running `git {}` in {}", command, dir.display());

        let mut cmd = Command::new("git");
        cmd.args(args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|source| GitError::Spawn {
                command: command.clone(),
                source,
            })?,
            Err(_) => {
                return Err(GitError::TimedOut {
                    command,
                    dir: dir.display().to_string(),
                    timeout: self.timeout,
                })
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if !output.status.success() {
            return Err(GitError::CommandFailed {
                command,
                dir: dir.display().to_string(),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(GitOutput { stdout, stderr })
    }
}

impl Default for GitRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn version_succeeds() {
        let runner = GitRunner::default();
        let output = runner
            .run(&["--version"], Path::new("."))
            .await
            .expect("git --version should succeed");
        assert!(output.stdout.starts_with("git version"));
    }

    #[tokio::test]
    async fn nonzero_exit_surfaces_stderr() {
        let temp = tempfile::tempdir().unwrap();
        let runner = GitRunner::default();

        // rev-parse outside any repository exits non-zero
        let err = runner
            .run(&["rev-parse", "--abbrev-ref", "HEAD"], temp.path())
            .await
            .expect_err("rev-parse outside a repo should fail");

        match err {
            GitError::CommandFailed { command, stderr, .. } => {
                assert_eq!(command, "rev-parse --abbrev-ref HEAD");
                assert!(!stderr.is_empty());
            }
            other => panic!("expected CommandFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn timeout_is_reported() {
        let runner = GitRunner::new(Duration::from_millis(0));
        let err = runner
            .run(&["--version"], Path::new("."))
            .await
            .expect_err("zero timeout should trip before git exits");
        assert!(matches!(err, GitError::TimedOut { .. }));
    }
}
