//! Per-repository synchronization policy
//!
//! A [`Project`] describes one upstream repository and knows how to bring its
//! local clone up to date without ever rewriting history: fast-forward-only
//! pulls on a clean default branch, fetch-only everywhere else.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::git::{GitError, GitRunner};
use crate::report::Report;

/// One remote repository from the listing. Immutable after construction;
/// identity is the `(org, name)` pair.
#[derive(Debug, Clone)]
pub struct Project {
    pub org: String,
    pub name: String,
    pub git_uri: String,
    pub recurse: bool,
}

impl PartialEq for Project {
    fn eq(&self, other: &Self) -> bool {
        self.org == other.org && self.name == other.name
    }
}

impl Eq for Project {}

impl Hash for Project {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.org.hash(state);
        self.name.hash(state);
    }
}

/// Everything a worker needs to sync one project: the mirror root, the git
/// runner, the ignore set, and the shared report.
#[derive(Debug, Clone)]
pub struct SyncContext {
    pub root: PathBuf,
    pub git: GitRunner,
    pub ignore_orgs: HashSet<String>,
    pub report: Report,
}

impl SyncContext {
    pub fn is_ignored(&self, org: &str) -> bool {
        self.ignore_orgs.contains(org)
    }
}

impl Project {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.org, self.name)
    }

    /// The `org/name` directory this project's clone lives in.
    pub fn working_dir(&self, root: &Path) -> PathBuf {
        root.join(&self.org).join(&self.name)
    }

    /// Synchronize this project's local clone.
    ///
    /// Git failures are recorded in the report and swallowed; the run
    /// continues. An `Err` from this function means the program itself is
    /// broken and the whole run must abort.
    pub async fn sync(&self, ctx: &SyncContext) -> Result<()> {
        let dir = self.working_dir(&ctx.root);

        let outcome = if dir.exists() {
            self.update_existing(ctx, &dir).await
        } else if ctx.is_ignored(&self.org) {
            debug!("skipping {} (organization ignored, not cloned)", self.full_name());
            return Ok(());
        } else {
            self.clone_missing(ctx).await
        };

        if let Err(err) = outcome {
            warn!("{}: {}", self.full_name(), err);
            ctx.report.record_error(self.full_name());
        }

        Ok(())
    }

    /// Update a clone that already exists on disk.
    ///
    /// On master/main with a clean tree: fast-forward-only pull. A pull that
    /// cannot fast-forward is an error for this repository, never a merge.
    /// Dirty tree or any other branch: fetch only, local work untouched.
    async fn update_existing(&self, ctx: &SyncContext, dir: &Path) -> Result<(), GitError> {
        let head = ctx
            .git
            .run(&["rev-parse", "--abbrev-ref", "HEAD"], dir)
            .await?;
        let branch = head.stdout.trim().to_string();

        if branch == "master" || branch == "main" {
            if self.is_dirty(ctx, dir).await? {
                info!("{} has local changes, fetching only", self.full_name());
                ctx.git.run(&["fetch", "origin"], dir).await?;
            } else {
                ctx.git.run(&["pull", "--ff-only"], dir).await?;
                debug!("updated {}", self.full_name());
            }
        } else {
            info!("{} is on branch {}, fetching only", self.full_name(), branch);
            ctx.report.record_off_main(self.full_name(), branch);
            ctx.git.run(&["fetch", "origin"], dir).await?;
        }

        Ok(())
    }

    async fn is_dirty(&self, ctx: &SyncContext, dir: &Path) -> Result<bool, GitError> {
        let status = ctx
            .git
            .run(&["status", "--porcelain", "--untracked-files=no"], dir)
            .await?;
        Ok(!status.stdout.trim().is_empty())
    }

    /// Clone a repository that is not on disk yet. Runs in the mirror root so
    /// git creates the `org/` directory as needed.
    async fn clone_missing(&self, ctx: &SyncContext) -> Result<(), GitError> {
        info!("cloning {} from {}", self.full_name(), self.git_uri);

        let target = self.full_name();
        let mut args = vec!["clone"];
        if self.recurse {
            args.push("--recurse-submodules");
        }
        args.push(&self.git_uri);
        args.push(&target);

        ctx.git.run(&args, &ctx.root).await?;
        Ok(())
    }
}
