//! TOML-based configuration for StackPack.
//!
//! Everything has a sensible default so a bare `stackpack import` works from
//! an empty directory; the config file only needs to name what differs from
//! the defaults (alternate mirrors, a different Launchpad team, a stub
//! import tool in tests).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::ConfigError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level application configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Working directories.
    #[serde(default)]
    pub dirs: DirsConfig,

    /// Upstream source locations.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Launchpad repository directory settings.
    #[serde(default)]
    pub launchpad: LaunchpadConfig,

    /// Import behaviour settings.
    #[serde(default)]
    pub import: ImportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dirs: DirsConfig::default(),
            upstream: UpstreamConfig::default(),
            launchpad: LaunchpadConfig::default(),
            import: ImportConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Directories
// ---------------------------------------------------------------------------

/// Layout of the working tree: packaging clones, upstream clones, downloaded
/// tarballs, and the shared releases checkout all live under `root`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirsConfig {
    /// Root directory for all working state (default: current directory).
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

impl Default for DirsConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

impl DirsConfig {
    pub fn packaging_dir(&self) -> PathBuf {
        self.root.join("packaging")
    }

    pub fn upstream_dir(&self) -> PathBuf {
        self.root.join("upstream")
    }

    pub fn tarballs_dir(&self) -> PathBuf {
        self.root.join("tarballs")
    }

    pub fn releases_dir(&self) -> PathBuf {
        self.upstream_dir().join("releases")
    }

    /// Create all working directories.
    pub fn create_all(&self) -> std::io::Result<()> {
        for dir in [
            self.packaging_dir(),
            self.upstream_dir(),
            self.tarballs_dir(),
        ] {
            std::fs::create_dir_all(&dir)?;
        }
        debug!(root = %self.root.display(), "created working directories");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Upstream sources
// ---------------------------------------------------------------------------

/// Where upstream release metadata and tarballs come from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL for published release tarballs.
    #[serde(default = "default_tarballs_base_url")]
    pub tarballs_base_url: String,

    /// Clone URL of the releases metadata repository.
    #[serde(default = "default_releases_repo_url")]
    pub releases_repo_url: String,

    /// Base URL for upstream git repositories, used when a packaging repo's
    /// Homepage does not name a full clone URL.
    #[serde(default = "default_git_base_url")]
    pub git_base_url: String,
}

fn default_tarballs_base_url() -> String {
    "https://tarballs.opendev.org".into()
}
fn default_releases_repo_url() -> String {
    "https://opendev.org/openstack/releases".into()
}
fn default_git_base_url() -> String {
    "https://opendev.org/openstack".into()
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            tarballs_base_url: default_tarballs_base_url(),
            releases_repo_url: default_releases_repo_url(),
            git_base_url: default_git_base_url(),
        }
    }
}

// ---------------------------------------------------------------------------
// Launchpad
// ---------------------------------------------------------------------------

/// Launchpad repository directory settings; access is anonymous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchpadConfig {
    /// API root (default `https://api.launchpad.net/devel`).
    #[serde(default = "default_api_root")]
    pub api_root: String,

    /// Team owning the packaging repositories.
    #[serde(default = "default_team")]
    pub team: String,
}

fn default_api_root() -> String {
    "https://api.launchpad.net/devel".into()
}
fn default_team() -> String {
    "~ubuntu-openstack-dev".into()
}

impl Default for LaunchpadConfig {
    fn default() -> Self {
        Self {
            api_root: default_api_root(),
            team: default_team(),
        }
    }
}

// ---------------------------------------------------------------------------
// Import behaviour
// ---------------------------------------------------------------------------

/// How imports run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Command invoked to merge a tarball into the packaging branches.
    /// Arguments `--merge-mode=replace --no-interactive <tarball>` are
    /// appended; `import-orig` is inserted when the command is `gbp`.
    #[serde(default = "default_import_tool")]
    pub import_tool: String,

    /// Prefix for per-cycle upstream branches (`upstream-<cycle>`).
    #[serde(default = "default_branch_prefix")]
    pub upstream_branch_prefix: String,

    /// Packaging branch the import tool runs from.
    #[serde(default = "default_packaging_branch")]
    pub packaging_branch: String,

    /// Delete tarballs after a successful import.
    #[serde(default)]
    pub cleanup_tarballs: bool,

    /// Number of repositories imported in parallel.
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// HTTP timeout for tarball downloads, in seconds.
    #[serde(default = "default_download_timeout")]
    pub download_timeout_secs: u64,
}

fn default_import_tool() -> String {
    "gbp".into()
}
fn default_branch_prefix() -> String {
    "upstream".into()
}
fn default_packaging_branch() -> String {
    "master".into()
}
fn default_jobs() -> usize {
    1
}
fn default_download_timeout() -> u64 {
    300
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            import_tool: default_import_tool(),
            upstream_branch_prefix: default_branch_prefix(),
            packaging_branch: default_packaging_branch(),
            cleanup_tarballs: false,
            jobs: default_jobs(),
            download_timeout_secs: default_download_timeout(),
        }
    }
}

// ---------------------------------------------------------------------------
// Loading and validation
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.import.jobs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "import.jobs".into(),
                detail: "must be at least 1".into(),
            });
        }
        if self.import.import_tool.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "import.import_tool".into(),
                detail: "must not be empty".into(),
            });
        }
        if !self.launchpad.team.starts_with('~') {
            return Err(ConfigError::InvalidValue {
                field: "launchpad.team".into(),
                detail: "team names start with '~'".into(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.import.jobs, 1);
        assert_eq!(config.import.import_tool, "gbp");
        assert_eq!(config.launchpad.team, "~ubuntu-openstack-dev");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stackpack.toml");
        std::fs::write(
            &path,
            r#"
[import]
jobs = 4
cleanup_tarballs = true

[launchpad]
team = "~my-team"
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.import.jobs, 4);
        assert!(config.import.cleanup_tarballs);
        assert_eq!(config.launchpad.team, "~my-team");
        // Unset sections fall back to defaults.
        assert_eq!(
            config.upstream.tarballs_base_url,
            "https://tarballs.opendev.org"
        );
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[import]\njobs = 0\n").unwrap();
        assert!(matches!(
            AppConfig::load_from_file(&path),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            AppConfig::load_from_file("/nonexistent/stackpack.toml"),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_dir_layout() {
        let dirs = DirsConfig {
            root: PathBuf::from("/work"),
        };
        assert_eq!(dirs.packaging_dir(), PathBuf::from("/work/packaging"));
        assert_eq!(dirs.releases_dir(), PathBuf::from("/work/upstream/releases"));
    }
}
