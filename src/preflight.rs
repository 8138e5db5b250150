//! Preflight checks
//!
//! Verifies the system is usable before any network or git work starts, and
//! guards against cloning hundreds of repositories into a misconfigured
//! mirror root.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{bail, Result};

use crate::config::Config;
use crate::project::Project;

/// Result of the preflight checks
#[derive(Debug, Clone)]
pub struct Preflight {
    /// Git installation status
    pub git: CheckResult,
    /// Mirror root status
    pub mirror_root: CheckResult,
}

/// Result of an individual check
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub passed: bool,
    pub message: String,
    pub details: Option<String>,
}

impl CheckResult {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: None,
        }
    }

    fn ok_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
            details: Some(details.into()),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: None,
        }
    }

    fn error_with_details(message: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
            details: Some(details.into()),
        }
    }
}

impl Preflight {
    /// Run all checks
    pub fn run(config: &Config) -> Self {
        Self {
            git: Self::check_git(),
            mirror_root: Self::check_mirror_root(config),
        }
    }

    pub fn all_passed(&self) -> bool {
        self.git.passed && self.mirror_root.passed
    }

    pub fn all_checks(&self) -> Vec<(&'static str, &CheckResult)> {
        vec![("Git", &self.git), ("Mirror root", &self.mirror_root)]
    }

    fn check_git() -> CheckResult {
        match std::process::Command::new("git").arg("--version").output() {
            Ok(output) if output.status.success() => {
                let version = String::from_utf8_lossy(&output.stdout);
                CheckResult::ok_with_details("Git installed", version.trim().to_string())
            }
            Ok(_) => CheckResult::error("Git command failed"),
            Err(_) => CheckResult::error_with_details(
                "Git not found in PATH",
                "Install git: https://git-scm.com/downloads",
            ),
        }
    }

    fn check_mirror_root(config: &Config) -> CheckResult {
        let root = Path::new(&config.mirror_root);
        if root.is_dir() {
            CheckResult::ok(format!("Mirror root exists: {}", root.display()))
        } else {
            CheckResult::error_with_details(
                format!("Mirror root missing: {}", root.display()),
                "Create it or point mirror_root at an existing directory",
            )
        }
    }
}

/// Abort unless every non-ignored organization directory already exists.
///
/// Skipped when `create_org_dirs` is set; otherwise a missing directory means
/// the mirror root is probably misconfigured and the whole run stops before
/// any cloning happens.
pub fn check_org_dirs(projects: &[Project], config: &Config) -> Result<()> {
    if config.sync.create_org_dirs {
        return Ok(());
    }

    let root = Path::new(&config.mirror_root);
    let missing: BTreeSet<&str> = projects
        .iter()
        .map(|p| p.org.as_str())
        .filter(|org| !config.ignore_orgs.iter().any(|i| i == org))
        .filter(|org| !root.join(org).is_dir())
        .collect();

    if !missing.is_empty() {
        bail!(
            "missing organization directories under {}: {}. \
             Create them or pass --create-org-dirs to allow cloning into new directories",
            root.display(),
            missing.into_iter().collect::<Vec<_>>().join(", ")
        );
    }

    Ok(())
}
