//! Tarball acquisition and the packaging-import invocation.
//!
//! Published releases are downloaded from the tarball mirror (with reuse:
//! an already-downloaded tarball is never fetched twice). Snapshots are
//! archived straight out of the upstream clone. Either way the result is a
//! local tarball path handed to the import tool.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tracing::{debug, info, instrument, warn};

use crate::errors::ImportError;
use crate::resolver::{PackageTarget, TarballSource};

/// Fetches or generates upstream tarballs into a shared directory.
pub struct TarballFetcher {
    http: reqwest::Client,
    dir: PathBuf,
}

impl TarballFetcher {
    pub fn new<P: AsRef<Path>>(dir: P, download_timeout_secs: u64) -> Result<Self, ImportError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(download_timeout_secs))
            .build()
            .map_err(|e| ImportError::Download {
                url: String::new(),
                detail: e.to_string(),
            })?;
        Ok(Self {
            http,
            dir: dir.as_ref().to_path_buf(),
        })
    }

    /// Produce the tarball for `target`, returning its local path.
    /// `upstream_repo` is the path of the upstream clone, needed for
    /// snapshot sources.
    #[instrument(skip(self, target, upstream_repo))]
    pub async fn fetch(
        &self,
        package: &str,
        target: &PackageTarget,
        upstream_repo: Option<&Path>,
    ) -> Result<PathBuf, ImportError> {
        std::fs::create_dir_all(&self.dir)?;
        let filename = format!("{}_{}.orig.tar.gz", package, target.debian_upstream);
        let path = self.dir.join(filename);

        match &target.source {
            TarballSource::Remote { url } => {
                self.download(url, &path).await?;
                // Signatures are published alongside most tarballs; fetch
                // one when available but never fail the import over it.
                let sig_url = format!("{url}.asc");
                let sig_path = path.with_extension("gz.asc");
                if let Err(e) = self.download(&sig_url, &sig_path).await {
                    debug!(url = sig_url, error = %e, "no signature available");
                }
            }
            TarballSource::LocalArchive => {
                let repo = upstream_repo.ok_or_else(|| ImportError::Archive {
                    repository: package.to_string(),
                    detail: "no upstream clone available".to_string(),
                })?;
                if path.exists() {
                    debug!(path = %path.display(), "reusing existing archive");
                } else {
                    let prefix = format!("{}-{}", package, target.debian_upstream);
                    archive_head(repo, &prefix, &path).await?;
                    info!(path = %path.display(), "archived upstream snapshot");
                }
            }
        }
        Ok(path)
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<(), ImportError> {
        if dest.exists() {
            debug!(path = %dest.display(), "reusing existing download");
            return Ok(());
        }
        let err = |detail: String| ImportError::Download {
            url: url.to_string(),
            detail,
        };

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| err(e.to_string()))?;
        if !response.status().is_success() {
            return Err(err(format!("HTTP {}", response.status())));
        }
        let bytes = response.bytes().await.map_err(|e| err(e.to_string()))?;

        // Write to a temp name first so an interrupted download is never
        // mistaken for a complete tarball on the next run.
        let partial = dest.with_extension("partial");
        std::fs::write(&partial, &bytes)?;
        std::fs::rename(&partial, dest)?;
        info!(url, path = %dest.display(), bytes = bytes.len(), "downloaded");
        Ok(())
    }

    /// Delete a tarball after a successful import. Failure is logged, never
    /// fatal.
    pub fn cleanup(&self, path: &Path) {
        if let Err(e) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %e, "failed to remove tarball");
        } else {
            debug!(path = %path.display(), "removed tarball");
        }
        let sig = path.with_extension("gz.asc");
        if sig.exists() {
            let _ = std::fs::remove_file(sig);
        }
    }
}

/// Archive HEAD of the repository at `repo_path` as a gzipped tarball with a
/// `{prefix}/` path prefix, via the system `git` binary. `git2` has no
/// archive support.
#[instrument(skip(repo_path, output), fields(repo = %repo_path.display()))]
async fn archive_head(repo_path: &Path, prefix: &str, output: &Path) -> Result<(), ImportError> {
    let status = tokio::process::Command::new("git")
        .arg("-C")
        .arg(repo_path)
        .arg("archive")
        .arg("--format=tar.gz")
        .arg(format!("--prefix={prefix}/"))
        .arg("--output")
        .arg(output)
        .arg("HEAD")
        .status()
        .await?;
    if !status.success() {
        return Err(ImportError::Archive {
            repository: repo_path.display().to_string(),
            detail: format!("git archive exited with {:?}", status.code()),
        });
    }
    debug!(output = %output.display(), "archived HEAD");
    Ok(())
}

/// Run the packaging-import tool in `repo_path`, merging `tarball` into the
/// packaging branches. With the default `gbp` tool this runs
/// `gbp import-orig --merge-mode=replace --no-interactive`.
#[instrument(skip(repo_path, tarball, upstream_version), fields(repo = %repo_path.display()))]
pub async fn import_orig(
    repo_path: &Path,
    tool: &str,
    tarball: &Path,
    upstream_version: &str,
) -> Result<(), ImportError> {
    let mut command = tokio::process::Command::new(tool);
    if tool == "gbp" {
        command.arg("import-orig");
    }
    command
        .arg("--merge-mode=replace")
        .arg("--no-interactive")
        .arg(format!("--upstream-version={upstream_version}"))
        .arg(tarball)
        .current_dir(repo_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let output = command.output().await?;
    if !output.status.success() {
        let exit_code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(ImportError::ImportTool { exit_code, stderr });
    }
    info!("import tool succeeded");
    Ok(())
}
