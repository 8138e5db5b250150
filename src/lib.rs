//! orgmirror - Concurrent Local Mirror of Organization Git Repositories
//!
//! orgmirror keeps a local `org/name` tree of many remote repositories in
//! sync with their upstreams: clone missing clones, fast-forward or fetch
//! existing ones, flag clones left on another branch, and detect directories
//! no upstream repository corresponds to anymore.
//!
//! ## Modules
//!
//! - [`config`]: YAML configuration with XDG defaults
//! - [`listing`]: repository listing fetch and normalization
//! - [`project`]: per-repository synchronization policy
//! - [`git`]: git subprocess execution
//! - [`scheduler`]: bounded worker pool draining the project queue
//! - [`orphans`]: orphan detection and deletion
//! - [`report`]: shared end-of-run issue report
//! - [`preflight`]: environment and organization-directory checks

pub mod config;
pub mod git;
pub mod listing;
pub mod orphans;
pub mod preflight;
pub mod project;
pub mod report;
pub mod scheduler;

pub use config::Config;
pub use git::{GitError, GitRunner};
pub use listing::{HttpListing, ListingEntry, ListingSource};
pub use orphans::{delete_orphans, find_orphans};
pub use preflight::Preflight;
pub use project::{Project, SyncContext};
pub use report::Report;
pub use scheduler::{RunStatus, SyncScheduler};
