//! Repository listing retrieval and normalization
//!
//! The listing endpoint returns one of two JSON shapes: plain entries with a
//! `full_name` ("org/name") or GitHub-style objects with an owner login, a
//! repository name, and a web URL. Both normalize into [`Project`] through a
//! single constructor.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::project::Project;

/// One repository descriptor from the listing endpoint.
///
/// `External` must come first: GitHub-style entries also carry a `full_name`
/// field, so untagged deserialization has to try the richer shape first.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ListingEntry {
    External {
        name: String,
        owner: Owner,
        html_url: String,
    },
    Standard {
        full_name: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Owner {
    pub login: String,
}

impl ListingEntry {
    /// Normalize a listing entry into a [`Project`].
    ///
    /// Standard entries build their clone URL from `git_base`; external
    /// entries clone from their own web URL. A `full_name` without a slash
    /// is a configuration failure and aborts the run.
    pub fn into_project(self, git_base: &str, recurse: bool) -> Result<Project> {
        match self {
            ListingEntry::Standard { full_name } => {
                let (org, name) = full_name.split_once('/').ok_or_else(|| {
                    anyhow!("listing entry {:?} is not in org/name form", full_name)
                })?;
                Ok(Project {
                    org: org.to_string(),
                    name: name.to_string(),
                    git_uri: format!("{}/{}", git_base.trim_end_matches('/'), full_name),
                    recurse,
                })
            }
            ListingEntry::External {
                name,
                owner,
                html_url,
            } => Ok(Project {
                org: owner.login,
                name,
                git_uri: html_url,
                recurse,
            }),
        }
    }
}

/// A source of repository listing entries.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<ListingEntry>>;

    /// Source name for display/logging.
    fn source_name(&self) -> &str;
}

/// Fetches the listing from a remote JSON endpoint.
pub struct HttpListing {
    url: String,
    client: reqwest::Client,
}

impl HttpListing {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl ListingSource for HttpListing {
    async fn fetch(&self) -> Result<Vec<ListingEntry>> {
        debug!("fetching repository listing from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header("User-Agent", concat!("orgmirror/", env!("CARGO_PKG_VERSION")))
            .send()
            .await
            .with_context(|| format!("failed to reach listing endpoint {}", self.url))?
            .error_for_status()
            .with_context(|| format!("listing endpoint {} returned an error", self.url))?;

        let entries: Vec<ListingEntry> = response
            .json()
            .await
            .context("listing response is not a valid JSON repository list")?;

        info!("listing contains {} repositories", entries.len());
        Ok(entries)
    }

    fn source_name(&self) -> &str {
        &self.url
    }
}

/// Fetch the listing and normalize every entry into a [`Project`].
pub async fn load_projects(source: &dyn ListingSource, config: &Config) -> Result<Vec<Project>> {
    let entries = source
        .fetch()
        .await
        .with_context(|| format!("failed to load listing from {}", source.source_name()))?;

    entries
        .into_iter()
        .map(|entry| entry.into_project(&config.listing.git_base, config.sync.recurse_submodules))
        .collect()
}
