//! End-of-run issue report
//!
//! Workers append to the report concurrently while the scheduler drains the
//! queue; the coordinator prints it exactly once before the process exits,
//! including on abort or interrupt, so partial progress is never lost.

use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

/// Shared aggregator for cross-cutting sync results.
#[derive(Debug, Clone, Default)]
pub struct Report {
    inner: Arc<Mutex<ReportInner>>,
}

#[derive(Debug, Default)]
struct ReportInner {
    /// (org/name, branch) pairs for clones left on a non-default branch.
    off_main: Vec<(String, String)>,
    /// org/name paths where a git command failed.
    errored: Vec<String>,
    /// Local directories with no corresponding upstream repository.
    orphans: Vec<PathBuf>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ReportInner> {
        // An append-only list stays valid even if a worker panicked mid-run.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_off_main(&self, path: impl Into<String>, branch: impl Into<String>) {
        self.lock().off_main.push((path.into(), branch.into()));
    }

    pub fn record_error(&self, path: impl Into<String>) {
        self.lock().errored.push(path.into());
    }

    pub fn set_orphans(&self, orphans: Vec<PathBuf>) {
        self.lock().orphans = orphans;
    }

    pub fn off_main(&self) -> Vec<(String, String)> {
        self.lock().off_main.clone()
    }

    pub fn errored(&self) -> Vec<String> {
        self.lock().errored.clone()
    }

    pub fn orphans(&self) -> Vec<PathBuf> {
        self.lock().orphans.clone()
    }

    pub fn is_clean(&self) -> bool {
        let inner = self.lock();
        inner.off_main.is_empty() && inner.errored.is_empty() && inner.orphans.is_empty()
    }

    /// Print the issue report. Each section emits its header line only when
    /// the section has entries.
    pub fn print(&self) {
        let inner = self.lock();

        if !inner.off_main.is_empty() {
            println!("Repositories not on master/main:");
            for (path, branch) in &inner.off_main {
                println!("- {} ({})", path, branch);
            }
        }

        if !inner.errored.is_empty() {
            println!("Repositories with errors:");
            for path in &inner.errored {
                println!("- {}", path);
            }
        }

        if !inner.orphans.is_empty() {
            println!("Orphaned directories:");
            for path in &inner.orphans {
                println!("- {}", path.display());
            }
        }
    }
}
