//! Sync scheduler - bounded worker pool over a FIFO project queue
//!
//! Workers pull one project at a time and run its sync policy; git failures
//! are recorded in the shared report and the run continues. A fault outside
//! the recording path means the program itself is broken: the worker cancels
//! the shared token and every worker stops dequeuing. External interruption
//! (Ctrl-C) cancels the same token; in-flight git subprocesses finish but no
//! new work is dispatched.

use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::project::{Project, SyncContext};

/// How a scheduler run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Queue drained, every task acknowledged.
    Drained,
    /// Cancelled before the queue drained; the report reflects partial
    /// progress.
    Cancelled,
}

pub struct SyncScheduler {
    jobs: usize,
    cancel: CancellationToken,
}

impl SyncScheduler {
    pub fn new(jobs: usize) -> Self {
        Self {
            jobs: jobs.max(1),
            cancel: CancellationToken::new(),
        }
    }

    /// Token observed by every worker. Cancelling it stops dispatch without
    /// killing git subprocesses that already started.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drain the project queue with the configured number of workers.
    ///
    /// Returns `Err` only for a worker fault (including a panic); per-project
    /// git failures live in the report. The caller prints the report in every
    /// case.
    pub async fn run(&self, projects: Vec<Project>, ctx: Arc<SyncContext>) -> Result<RunStatus> {
        let total = projects.len();
        let queue = Arc::new(Mutex::new(VecDeque::from(projects)));

        info!("syncing {} repositories with {} workers", total, self.jobs);

        let mut handles = Vec::with_capacity(self.jobs);
        for worker in 0..self.jobs {
            let queue = Arc::clone(&queue);
            let ctx = Arc::clone(&ctx);
            let cancel = self.cancel.clone();

            handles.push(tokio::spawn(async move {
                loop {
                    if cancel.is_cancelled() {
                        debug!("worker {} stopping: run cancelled", worker);
                        return Ok(());
                    }

                    let project = queue.lock().await.pop_front();
                    let Some(project) = project else {
                        debug!("worker {} finished: queue empty", worker);
                        return Ok(());
                    };

                    if let Err(err) = project.sync(&ctx).await {
                        // Git failures are recorded inside sync(); reaching
                        // this branch means the program itself is broken.
                        error!(
                            "worker {} fault while syncing {}: {:#}",
                            worker,
                            project.full_name(),
                            err
                        );
                        cancel.cancel();
                        return Err(err);
                    }
                }
            }));
        }

        let mut fault = None;
        for handle in handles {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => fault = fault.or(Some(err)),
                Err(join_err) => {
                    self.cancel.cancel();
                    fault = fault.or(Some(anyhow!("worker panicked: {}", join_err)));
                }
            }
        }

        if let Some(err) = fault {
            return Err(err);
        }

        if self.cancel.is_cancelled() {
            warn!("run cancelled before the queue drained");
            Ok(RunStatus::Cancelled)
        } else {
            Ok(RunStatus::Drained)
        }
    }
}
