//! Shared fixtures for the integration tests: local upstream repositories
//! built with the real git binary, and a ready-made sync context.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use orgmirror::{GitRunner, Project, Report, SyncContext};

/// Run a git command in `dir` with a fixed identity, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args([
            "-c",
            "user.name=test",
            "-c",
            "user.email=test@example.com",
            "-c",
            "init.defaultBranch=main",
        ])
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");

    assert!(
        output.status.success(),
        "git {:?} failed in {}: {}",
        args,
        dir.display(),
        String::from_utf8_lossy(&output.stderr)
    );

    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Create an upstream repository with one commit on main, returning its path.
pub fn init_upstream(base: &Path, org: &str, name: &str) -> PathBuf {
    let dir = base.join(org).join(name);
    std::fs::create_dir_all(&dir).unwrap();
    git(&dir, &["init"]);
    std::fs::write(dir.join("README.md"), "seed\n").unwrap();
    git(&dir, &["add", "."]);
    git(&dir, &["commit", "-m", "initial commit"]);
    dir
}

/// Add a commit touching `file` to an existing repository.
pub fn commit_change(repo: &Path, file: &str, content: &str) {
    std::fs::write(repo.join(file), content).unwrap();
    git(repo, &["add", "."]);
    git(repo, &["commit", "-m", "update"]);
}

pub fn head_of(repo: &Path) -> String {
    git(repo, &["rev-parse", "HEAD"]).trim().to_string()
}

pub fn rev_of(repo: &Path, rev: &str) -> String {
    git(repo, &["rev-parse", rev]).trim().to_string()
}

pub fn project(org: &str, name: &str, git_uri: impl Into<String>) -> Project {
    Project {
        org: org.to_string(),
        name: name.to_string(),
        git_uri: git_uri.into(),
        recurse: false,
    }
}

pub fn context(root: &Path, ignore: &[&str]) -> Arc<SyncContext> {
    Arc::new(SyncContext {
        root: root.to_path_buf(),
        git: GitRunner::default(),
        ignore_orgs: ignore.iter().map(|s| s.to_string()).collect::<HashSet<_>>(),
        report: Report::new(),
    })
}
