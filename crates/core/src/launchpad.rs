//! Launchpad repository directory client.
//!
//! Lists the git repositories owned by the packaging team via the Launchpad
//! REST API. Access is anonymous and read-only; the API pages results with a
//! `next_collection_link`, which we follow until exhausted.

use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::errors::LaunchpadError;

/// A packaging repository as listed by Launchpad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRepository {
    /// Short name, e.g. `nova`.
    pub name: String,
    /// Anonymous clone URL.
    pub git_url: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryPage {
    entries: Vec<RepositoryEntry>,
    #[serde(default)]
    next_collection_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepositoryEntry {
    name: String,
    #[serde(default)]
    git_https_url: Option<String>,
}

/// Packaging trees for projects retired upstream; still listed by the team
/// but never imported.
const DEPRECATED_PACKAGES: &[&str] = &[
    "pg8000",
    "python-pyasyncore",
    "python-qinlingclient",
    "python-pankoclient",
    "sahara",
    "saharah-dashboard",
    "sahara-plugin-spark",
    "sahara-plugin-vanilla",
    "senlin",
];

fn accept_entry(entry: RepositoryEntry) -> Option<TeamRepository> {
    if DEPRECATED_PACKAGES.contains(&entry.name.as_str()) {
        debug!(name = %entry.name, "skipping deprecated package");
        return None;
    }
    let Some(git_url) = entry.git_https_url else {
        warn!(name = %entry.name, "repository has no HTTPS clone URL, skipping");
        return None;
    };
    Some(TeamRepository {
        name: entry.name,
        git_url,
    })
}

/// Client for the Launchpad repository directory.
#[derive(Debug, Clone)]
pub struct LaunchpadClient {
    http: reqwest::Client,
    api_root: String,
    team: String,
}

impl LaunchpadClient {
    pub fn new(api_root: impl Into<String>, team: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_root: api_root.into(),
            team: team.into(),
        }
    }

    /// All git repositories owned by the team, across every result page.
    /// Packaging trees in the deprecated set are filtered out.
    #[instrument(skip(self), fields(team = %self.team))]
    pub async fn list_team_repositories(&self) -> Result<Vec<TeamRepository>, LaunchpadError> {
        let mut url = format!(
            "{}/{}/+git?ws.op=getRepositories",
            self.api_root, self.team
        );

        let mut repositories = Vec::new();
        loop {
            let page = self.fetch_page(&url).await?;
            repositories.extend(page.entries.into_iter().filter_map(accept_entry));
            match page.next_collection_link {
                Some(next) => url = next,
                None => break,
            }
        }

        repositories.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(count = repositories.len(), "listed team repositories");
        Ok(repositories)
    }

    async fn fetch_page(&self, url: &str) -> Result<RepositoryPage, LaunchpadError> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LaunchpadError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| LaunchpadError::ParseError(e.to_string()))
    }
}
