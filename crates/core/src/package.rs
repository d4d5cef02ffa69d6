//! Debian packaging metadata: `debian/control` and `debian/changelog`.

use std::path::{Path, PathBuf};

use regex_lite::Regex;

use crate::errors::ImportError;
use crate::version::DebianVersion;

/// Parsed view of one packaging repository's Debian metadata.
#[derive(Debug, Clone)]
pub struct SourcePackage {
    path: PathBuf,
}

impl SourcePackage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn metadata_err(&self, detail: impl Into<String>) -> ImportError {
        ImportError::PackagingMetadata {
            repository: self.path.display().to_string(),
            detail: detail.into(),
        }
    }

    fn read_control(&self) -> Result<String, ImportError> {
        let control = self.path.join("debian").join("control");
        if !control.exists() {
            return Err(self.metadata_err("debian/control not found"));
        }
        std::fs::read_to_string(&control).map_err(ImportError::IoError)
    }

    /// The `Source:` field of `debian/control`.
    pub fn source_name(&self) -> Result<String, ImportError> {
        let content = self.read_control()?;
        let re = Regex::new(r"(?m)^Source:\s*(.+)$").unwrap();
        re.captures(&content)
            .map(|c| c[1].trim().to_string())
            .ok_or_else(|| self.metadata_err("Source field not found in debian/control"))
    }

    /// The `Homepage:` field of `debian/control`, if present.
    pub fn homepage(&self) -> Result<Option<String>, ImportError> {
        let content = self.read_control()?;
        let re = Regex::new(r"(?m)^Homepage:\s*(.+)$").unwrap();
        Ok(re.captures(&content).map(|c| c[1].trim().to_string()))
    }

    /// Upstream project name: the last path component of the Homepage URL
    /// (`https://opendev.org/openstack/nova` -> `nova`).
    pub fn upstream_project_name(&self) -> Result<String, ImportError> {
        let homepage = self
            .homepage()?
            .ok_or_else(|| self.metadata_err("Homepage not found in debian/control"))?;
        let name = homepage
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or("")
            .to_string();
        if name.is_empty() {
            return Err(
                self.metadata_err(format!("could not extract project name from '{homepage}'"))
            );
        }
        Ok(name)
    }

    /// The version of the topmost `debian/changelog` entry, i.e. what is
    /// currently packaged. `None` when no changelog exists yet (a fresh
    /// packaging repo that has never imported anything).
    pub fn packaged_version(&self) -> Result<Option<DebianVersion>, ImportError> {
        let changelog = self.path.join("debian").join("changelog");
        if !changelog.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&changelog).map_err(ImportError::IoError)?;
        let first_line = content
            .lines()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| self.metadata_err("debian/changelog is empty"))?;

        // Head entry format: `package (version) series; urgency=...`
        let re = Regex::new(r"^\S+\s+\(([^)]+)\)").unwrap();
        let caps = re.captures(first_line).ok_or_else(|| {
            self.metadata_err(format!("malformed changelog entry: '{first_line}'"))
        })?;
        let version = DebianVersion::parse(&caps[1])
            .map_err(|e| self.metadata_err(e.to_string()))?;
        Ok(Some(version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_package(dir: &Path, control: &str, changelog: Option<&str>) {
        let debian = dir.join("debian");
        std::fs::create_dir_all(&debian).unwrap();
        std::fs::write(debian.join("control"), control).unwrap();
        if let Some(changelog) = changelog {
            std::fs::write(debian.join("changelog"), changelog).unwrap();
        }
    }

    #[test]
    fn test_control_fields() {
        let dir = tempfile::tempdir().unwrap();
        write_package(
            dir.path(),
            "Source: nova\nSection: net\nHomepage: https://opendev.org/openstack/nova\n",
            None,
        );

        let pkg = SourcePackage::new(dir.path());
        assert_eq!(pkg.source_name().unwrap(), "nova");
        assert_eq!(
            pkg.homepage().unwrap().as_deref(),
            Some("https://opendev.org/openstack/nova")
        );
        assert_eq!(pkg.upstream_project_name().unwrap(), "nova");
    }

    #[test]
    fn test_homepage_trailing_slash() {
        let dir = tempfile::tempdir().unwrap();
        write_package(
            dir.path(),
            "Source: nova\nHomepage: https://opendev.org/openstack/nova/\n",
            None,
        );
        let pkg = SourcePackage::new(dir.path());
        assert_eq!(pkg.upstream_project_name().unwrap(), "nova");
    }

    #[test]
    fn test_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        write_package(dir.path(), "Section: net\n", None);

        let pkg = SourcePackage::new(dir.path());
        assert!(pkg.source_name().is_err());
        assert_eq!(pkg.homepage().unwrap(), None);
        assert!(pkg.upstream_project_name().is_err());
    }

    #[test]
    fn test_packaged_version() {
        let dir = tempfile::tempdir().unwrap();
        write_package(
            dir.path(),
            "Source: nova\n",
            Some("nova (2:12.0.0-0ubuntu1) noble; urgency=medium\n\n  * New upstream release.\n"),
        );

        let pkg = SourcePackage::new(dir.path());
        let version = pkg.packaged_version().unwrap().unwrap();
        assert_eq!(version.to_string(), "2:12.0.0-0ubuntu1");
    }

    #[test]
    fn test_no_changelog_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        write_package(dir.path(), "Source: nova\n", None);
        let pkg = SourcePackage::new(dir.path());
        assert!(pkg.packaged_version().unwrap().is_none());
    }
}
