//! Orphan detection and reconciliation
//!
//! An orphan is a local `org/name` directory with no corresponding entry in
//! the current upstream listing. Detection is a pure function of the project
//! set and the directory tree; deletion only ever removes the computed set.

use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::project::Project;

/// List every immediate subdirectory of a known organization directory that
/// does not match any project in the listing.
///
/// Organizations in the ignore set still get scanned here: an ignored org
/// that is already on disk is tracked, not silently dropped. Ignoring only
/// suppresses cloning.
pub fn find_orphans(projects: &[Project], root: &Path) -> Result<Vec<PathBuf>> {
    let known: HashSet<(&str, &str)> = projects
        .iter()
        .map(|p| (p.org.as_str(), p.name.as_str()))
        .collect();
    let orgs: BTreeSet<&str> = projects.iter().map(|p| p.org.as_str()).collect();

    let mut orphans = Vec::new();
    for org in orgs {
        let org_dir = root.join(org);
        if !org_dir.is_dir() {
            continue;
        }
        debug!("scanning {} for orphans", org_dir.display());

        let entries = std::fs::read_dir(&org_dir)
            .with_context(|| format!("failed to read {}", org_dir.display()))?;
        for entry in entries {
            let entry = entry.with_context(|| format!("failed to read {}", org_dir.display()))?;
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !known.contains(&(org, name.as_ref())) {
                orphans.push(org_dir.join(name.as_ref()));
            }
        }
    }

    orphans.sort();
    Ok(orphans)
}

/// Recursively remove every orphaned directory. Only called in delete mode.
pub fn delete_orphans(orphans: &[PathBuf]) -> Result<()> {
    for path in orphans {
        info!("deleting orphaned directory {}", path.display());
        std::fs::remove_dir_all(path)
            .with_context(|| format!("failed to delete {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(org: &str, name: &str) -> Project {
        Project {
            org: org.to_string(),
            name: name.to_string(),
            git_uri: format!("https://example.com/{}/{}", org, name),
            recurse: false,
        }
    }

    #[test]
    fn extra_directory_is_an_orphan() {
        let temp = tempfile::tempdir().unwrap();
        for dir in ["a/x", "a/y", "a/z"] {
            std::fs::create_dir_all(temp.path().join(dir)).unwrap();
        }

        let projects = vec![project("a", "x"), project("a", "y")];
        let orphans = find_orphans(&projects, temp.path()).unwrap();

        assert_eq!(orphans, vec![temp.path().join("a/z")]);
    }

    #[test]
    fn missing_org_directory_yields_nothing() {
        let temp = tempfile::tempdir().unwrap();
        let projects = vec![project("a", "x")];
        assert!(find_orphans(&projects, temp.path()).unwrap().is_empty());
    }

    #[test]
    fn plain_files_are_not_orphans() {
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("a/x")).unwrap();
        std::fs::write(temp.path().join("a/README"), "notes").unwrap();

        let projects = vec![project("a", "x")];
        assert!(find_orphans(&projects, temp.path()).unwrap().is_empty());
    }

    #[test]
    fn ignored_org_directories_are_still_scanned() {
        // The ignore set never reaches find_orphans; any org referenced by a
        // project gets scanned, so stale clones under an ignored org surface.
        let temp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("ignored-org/kept")).unwrap();
        std::fs::create_dir_all(temp.path().join("ignored-org/stale")).unwrap();

        let projects = vec![project("ignored-org", "kept")];
        let orphans = find_orphans(&projects, temp.path()).unwrap();

        assert_eq!(orphans, vec![temp.path().join("ignored-org/stale")]);
    }

    #[test]
    fn delete_removes_exactly_the_orphan_set() {
        let temp = tempfile::tempdir().unwrap();
        for dir in ["a/x", "a/z", "b/w"] {
            std::fs::create_dir_all(temp.path().join(dir)).unwrap();
        }
        std::fs::write(temp.path().join("a/z/file.txt"), "data").unwrap();

        let projects = vec![project("a", "x"), project("b", "w")];
        let orphans = find_orphans(&projects, temp.path()).unwrap();
        assert_eq!(orphans, vec![temp.path().join("a/z")]);

        delete_orphans(&orphans).unwrap();

        assert!(temp.path().join("a/x").exists());
        assert!(temp.path().join("b/w").exists());
        assert!(!temp.path().join("a/z").exists());

        // detection is idempotent after deletion
        assert!(find_orphans(&projects, temp.path()).unwrap().is_empty());
    }
}
