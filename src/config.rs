use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for orgmirror
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Root directory the org/name mirror tree lives under
    pub mirror_root: String,

    /// Repository listing endpoint settings
    #[serde(default)]
    pub listing: ListingConfig,

    /// Organizations excluded from cloning and the sanity check.
    /// Pre-existing clones under these orgs are still updated and scanned.
    #[serde(default)]
    pub ignore_orgs: Vec<String>,

    /// Synchronization behavior settings
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Listing endpoint configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ListingConfig {
    /// JSON endpoint the repository list is fetched from
    #[serde(default = "default_listing_url")]
    pub url: String,

    /// Base URL clone URIs are built from for org/name-style entries.
    /// GitHub-style entries carry their own URL and ignore this.
    #[serde(default = "default_git_base")]
    pub git_base: String,
}

/// Synchronization configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SyncConfig {
    /// Worker count; null means one worker per processor core
    pub jobs: Option<usize>,

    /// Clone with --recurse-submodules
    #[serde(default)]
    pub recurse_submodules: bool,

    /// Allow creating missing organization directories instead of aborting
    #[serde(default)]
    pub create_org_dirs: bool,

    /// Timeout for a single git command in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

// Default value functions
fn default_listing_url() -> String {
    "https://review.opendev.org/projects/".to_string()
}
fn default_git_base() -> String {
    "https://opendev.org".to_string()
}
fn default_timeout() -> u64 {
    600
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            url: default_listing_url(),
            git_base: default_git_base(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            jobs: None,
            recurse_submodules: false,
            create_org_dirs: false,
            timeout: default_timeout(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mirror_root: "${HOME}/src".to_string(),
            listing: ListingConfig::default(),
            ignore_orgs: Vec::new(),
            sync: SyncConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location or fall back to defaults
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            let mut config = Self::default();
            config.expand_paths()?;
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config.expand_paths()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("orgmirror").join("config.yml"))
    }

    /// Expand environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.mirror_root = shellexpand::full(&self.mirror_root)
            .context("Failed to expand mirror_root path")?
            .into_owned();

        Ok(())
    }

    /// Effective worker count: explicit configuration or the core count
    pub fn jobs(&self) -> usize {
        self.sync
            .jobs
            .filter(|n| *n > 0)
            .unwrap_or_else(num_cpus::get)
    }

    pub fn git_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sync.timeout)
    }
}
