//! Metadata from the upstream releases repository checkout.
//!
//! The releases repository is a plain git tree of YAML files:
//! `data/series_status.yaml` lists the development cycles newest-first, and
//! `deliverables/<cycle>/<project>.yaml` describes each project's published
//! releases for a cycle. One shared checkout is synced before dispatch and
//! then only read, so resolvers stay pure against it.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::errors::MetadataError;

/// Read-only view over a releases repository checkout.
#[derive(Debug, Clone)]
pub struct ReleaseIndex {
    root: PathBuf,
}

/// One project's deliverable metadata for a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deliverable {
    /// Upstream namespace (`openstack` in `openstack/nova`).
    pub namespace: String,
    /// Upstream project name (`nova`).
    pub project_name: String,
    /// Tarball base name, when different from the project name.
    pub tarball_base: String,
    /// Most recent published version for the cycle, if any.
    pub latest_version: Option<String>,
}

impl Deliverable {
    /// URL of the published tarball for `version`.
    pub fn tarball_url(&self, tarballs_base_url: &str, version: &str) -> String {
        format!(
            "{}/{}/{}/{}-{}.tar.gz",
            tarballs_base_url, self.namespace, self.tarball_base, self.tarball_base, version
        )
    }
}

// ---------------------------------------------------------------------------
// YAML shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct SeriesEntry {
    name: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct DeliverableFile {
    #[serde(rename = "repository-settings", default)]
    repository_settings: serde_yaml::Mapping,
    #[serde(default)]
    releases: Vec<ReleaseEntry>,
}

#[derive(Debug, Deserialize)]
struct ReleaseEntry {
    version: String,
}

#[derive(Debug, Deserialize, Default)]
struct RepositorySettings {
    #[serde(rename = "tarball-base")]
    tarball_base: Option<String>,
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

impl ReleaseIndex {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn load_series(&self) -> Result<Vec<SeriesEntry>, MetadataError> {
        let path = self.root.join("data").join("series_status.yaml");
        if !path.exists() {
            return Err(MetadataError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(&path)?;
        serde_yaml::from_str(&content).map_err(|e| MetadataError::ParseError {
            path: path.display().to_string(),
            detail: e.to_string(),
        })
    }

    /// Name of the cycle currently in development.
    pub fn current_cycle(&self) -> Result<String, MetadataError> {
        let series = self.load_series()?;
        series
            .iter()
            .find(|s| s.status == "development")
            .map(|s| s.name.clone())
            .ok_or(MetadataError::NoDevelopmentCycle)
    }

    /// Name of the cycle released before the current one, if any. Series
    /// entries are ordered newest-first, so this is the second entry.
    pub fn previous_cycle(&self) -> Result<Option<String>, MetadataError> {
        let series = self.load_series()?;
        Ok(series.get(1).map(|s| s.name.clone()))
    }

    /// Deliverable metadata for `project` in `cycle`. `None` when the
    /// project has no deliverable file for that cycle (not all do).
    pub fn deliverable(
        &self,
        cycle: &str,
        project: &str,
    ) -> Result<Option<Deliverable>, MetadataError> {
        let path = self
            .root
            .join("deliverables")
            .join(cycle)
            .join(format!("{project}.yaml"));
        if !path.exists() {
            debug!(cycle, project, "no deliverable file");
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)?;
        let file: DeliverableFile =
            serde_yaml::from_str(&content).map_err(|e| MetadataError::ParseError {
                path: path.display().to_string(),
                detail: e.to_string(),
            })?;

        // Most projects carry exactly one repository; take the first.
        let Some((repo_key, repo_value)) = file.repository_settings.iter().next() else {
            return Ok(None);
        };
        let repo_path = repo_key.as_str().unwrap_or_default().to_string();
        let settings: RepositorySettings =
            serde_yaml::from_value(repo_value.clone()).unwrap_or_default();

        let (namespace, project_name) = match repo_path.split_once('/') {
            Some((ns, name)) => (ns.to_string(), name.to_string()),
            None => ("openstack".to_string(), repo_path.clone()),
        };
        let tarball_base = settings.tarball_base.unwrap_or_else(|| project_name.clone());

        // Release entries are chronological; the last one is the latest.
        let latest_version = file.releases.last().map(|r| r.version.clone());

        Ok(Some(Deliverable {
            namespace,
            project_name,
            tarball_base,
            latest_version,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_index(dir: &Path) -> ReleaseIndex {
        let data = dir.join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(
            data.join("series_status.yaml"),
            "- name: epoxy\n  status: development\n- name: dalmatian\n  status: maintained\n",
        )
        .unwrap();
        ReleaseIndex::new(dir)
    }

    fn write_deliverable(dir: &Path, cycle: &str, project: &str, body: &str) {
        let deliverables = dir.join("deliverables").join(cycle);
        std::fs::create_dir_all(&deliverables).unwrap();
        std::fs::write(deliverables.join(format!("{project}.yaml")), body).unwrap();
    }

    #[test]
    fn test_cycles() {
        let dir = tempfile::tempdir().unwrap();
        let index = write_index(dir.path());
        assert_eq!(index.current_cycle().unwrap(), "epoxy");
        assert_eq!(index.previous_cycle().unwrap().as_deref(), Some("dalmatian"));
    }

    #[test]
    fn test_no_development_cycle() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(
            data.join("series_status.yaml"),
            "- name: dalmatian\n  status: maintained\n",
        )
        .unwrap();
        let index = ReleaseIndex::new(dir.path());
        assert!(matches!(
            index.current_cycle(),
            Err(MetadataError::NoDevelopmentCycle)
        ));
    }

    #[test]
    fn test_deliverable() {
        let dir = tempfile::tempdir().unwrap();
        let index = write_index(dir.path());
        write_deliverable(
            dir.path(),
            "epoxy",
            "nova",
            "repository-settings:\n  openstack/nova: {}\nreleases:\n  - version: 30.0.0\n  - version: 31.0.0\n",
        );

        let d = index.deliverable("epoxy", "nova").unwrap().unwrap();
        assert_eq!(d.namespace, "openstack");
        assert_eq!(d.project_name, "nova");
        assert_eq!(d.tarball_base, "nova");
        assert_eq!(d.latest_version.as_deref(), Some("31.0.0"));
        assert_eq!(
            d.tarball_url("https://tarballs.opendev.org", "31.0.0"),
            "https://tarballs.opendev.org/openstack/nova/nova-31.0.0.tar.gz"
        );
    }

    #[test]
    fn test_deliverable_tarball_base_override() {
        let dir = tempfile::tempdir().unwrap();
        let index = write_index(dir.path());
        write_deliverable(
            dir.path(),
            "epoxy",
            "castellan",
            "repository-settings:\n  openstack/castellan:\n    tarball-base: python-castellan\nreleases: []\n",
        );

        let d = index.deliverable("epoxy", "castellan").unwrap().unwrap();
        assert_eq!(d.tarball_base, "python-castellan");
        assert_eq!(d.latest_version, None);
    }

    #[test]
    fn test_missing_deliverable_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let index = write_index(dir.path());
        assert_eq!(index.deliverable("epoxy", "no-such").unwrap(), None);
    }
}
