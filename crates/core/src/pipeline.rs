//! Per-repository import pipeline.
//!
//! One run moves a single packaging repository through resolving (sync
//! clones, read metadata, pick a target version), preparing (branch layout
//! plus rollback marker), importing (tarball plus import tool), and either
//! committing or rolling back. Every error is converted to an
//! [`ImportOutcome`] at this boundary so one repository's failure never
//! propagates as a panic or a raw error into the orchestrator.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::errors::{CoreError, ImportError, ResolveError};
use crate::package::SourcePackage;
use crate::releases::{Deliverable, ReleaseIndex};
use crate::resolver::{resolver_for, PackageTarget, ResolveContext};
use crate::tarball::{import_orig, TarballFetcher};
use crate::version::{compare_upstream, DebianVersion, ReleaseType};
use crate::workspace::GitWorkspace;

/// Whether and how the repository was restored after a failed import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackStatus {
    /// The failure happened before any mutation; there was nothing to
    /// restore.
    NotNeeded,
    /// The repository was restored to its pre-import state.
    RolledBack,
    /// Restoring failed; the repository may be inconsistent.
    Failed { detail: String },
}

/// Terminal result of one repository's import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportOutcome {
    /// A new upstream version was imported and committed.
    Imported { version: String },
    /// Nothing to do; the repository was left untouched.
    Skipped { reason: String },
    /// The import failed; `rollback` carries the restoration state.
    Failed {
        error: String,
        rollback: RollbackStatus,
    },
}

impl ImportOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ImportOutcome::Failed { .. })
    }

    /// True when the repository may be left in an inconsistent state and
    /// needs manual attention.
    pub fn needs_attention(&self) -> bool {
        matches!(
            self,
            ImportOutcome::Failed {
                rollback: RollbackStatus::Failed { .. },
                ..
            }
        )
    }
}

/// Shared, read-only inputs for every pipeline run.
pub struct PipelineContext {
    pub config: AppConfig,
    pub releases: ReleaseIndex,
    pub cycle: String,
    pub previous_cycle: Option<String>,
    pub release_type: ReleaseType,
    pub fetcher: TarballFetcher,
}

impl PipelineContext {
    fn upstream_branch(&self) -> String {
        format!("{}-{}", self.config.import.upstream_branch_prefix, self.cycle)
    }

    fn previous_upstream_branch(&self) -> Option<String> {
        self.previous_cycle
            .as_ref()
            .map(|c| format!("{}-{}", self.config.import.upstream_branch_prefix, c))
    }
}

/// Run the full pipeline for one repository. Never returns an error; every
/// failure becomes an [`ImportOutcome::Failed`].
#[instrument(skip(ctx, name, git_url), fields(repository = name, cycle = %ctx.cycle))]
pub async fn run_import(ctx: &PipelineContext, name: &str, git_url: &str) -> ImportOutcome {
    match run_inner(ctx, name, git_url).await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(error = %e, "import failed before any mutation");
            ImportOutcome::Failed {
                error: e.to_string(),
                rollback: RollbackStatus::NotNeeded,
            }
        }
    }
}

async fn run_inner(
    ctx: &PipelineContext,
    name: &str,
    git_url: &str,
) -> Result<ImportOutcome, CoreError> {
    // Resolving: sync clones and metadata, pick a target. Read-only.
    let packaging_path = ctx.config.dirs.packaging_dir().join(name);
    let packaging = GitWorkspace::clone_or_open(git_url, &packaging_path)?;
    packaging.sync_branch(&ctx.config.import.packaging_branch)?;

    let package = SourcePackage::new(&packaging_path);
    let project = package
        .upstream_project_name()
        .unwrap_or_else(|_| name.to_string());
    let packaged = package.packaged_version()?;
    let deliverable = ctx.releases.deliverable(&ctx.cycle, &project)?;

    let upstream_repo = match ctx.release_type {
        ReleaseType::Snapshot | ReleaseType::Auto => {
            Some(sync_upstream_clone(ctx, &package, &project)?)
        }
        _ => None,
    };

    // Finding nothing to import is a skip, not a failure.
    let target = match resolve_target(
        ctx,
        name,
        deliverable.as_ref(),
        packaged.as_ref(),
        upstream_repo.as_ref(),
    ) {
        Ok(target) => target,
        Err(e @ ResolveError::NoCandidateFound { .. }) => {
            return Ok(ImportOutcome::Skipped {
                reason: e.to_string(),
            });
        }
        Err(e) => return Err(e.into()),
    };

    // Idempotence: importing the same run twice skips the second time.
    if let Some(packaged) = &packaged {
        if compare_upstream(&target.debian_upstream, packaged.upstream())
            != std::cmp::Ordering::Greater
        {
            return Ok(ImportOutcome::Skipped {
                reason: format!(
                    "packaged version {} already covers {}",
                    packaged, target.debian_upstream
                ),
            });
        }
    }

    // Preparing: first mutation, guarded by the rollback marker.
    let marker = packaging.prepare(
        &ctx.config.import.packaging_branch,
        &ctx.upstream_branch(),
        ctx.previous_upstream_branch().as_deref(),
    )?;

    // Importing: tarball plus import tool. Any failure here rolls back.
    let upstream_path = upstream_repo.as_ref().map(|w| w.path().to_path_buf());
    let import_result =
        import_target(ctx, name, &target, upstream_path.as_deref(), &packaging_path).await;
    let tarball = match import_result {
        Ok(tarball) => tarball,
        Err(e) => {
            warn!(error = %e, "import failed, rolling back");
            let outcome = match packaging.rollback(&marker) {
                Ok(()) => ImportOutcome::Failed {
                    error: e.to_string(),
                    rollback: RollbackStatus::RolledBack,
                },
                Err(rb) => {
                    let failure = ImportError::RollbackFailed {
                        original: e.to_string(),
                        detail: rb.to_string(),
                    };
                    warn!(error = %failure, "repository needs manual attention");
                    ImportOutcome::Failed {
                        error: failure.to_string(),
                        rollback: RollbackStatus::Failed {
                            detail: rb.to_string(),
                        },
                    }
                }
            };
            return Ok(outcome);
        }
    };

    // Committing: the import tool already committed the merge; only tarball
    // cleanup remains, and it is never fatal.
    if ctx.config.import.cleanup_tarballs {
        ctx.fetcher.cleanup(&tarball);
    }
    info!(version = target.debian_upstream, "imported");
    Ok(ImportOutcome::Imported {
        version: target.debian_upstream,
    })
}

fn resolve_target(
    ctx: &PipelineContext,
    name: &str,
    deliverable: Option<&Deliverable>,
    packaged: Option<&DebianVersion>,
    upstream_repo: Option<&GitWorkspace>,
) -> Result<PackageTarget, ResolveError> {
    let resolve_ctx = ResolveContext {
        repository: name,
        cycle: &ctx.cycle,
        deliverable,
        packaged,
        tarballs_base_url: &ctx.config.upstream.tarballs_base_url,
        upstream_repo,
    };
    resolver_for(ctx.release_type)
        .resolve(&resolve_ctx)?
        .ok_or_else(|| ResolveError::NoCandidateFound {
            repository: name.to_string(),
            cycle: ctx.cycle.clone(),
        })
}

/// Clone or sync the upstream source repository, used for snapshots.
fn sync_upstream_clone(
    ctx: &PipelineContext,
    package: &SourcePackage,
    project: &str,
) -> Result<GitWorkspace, CoreError> {
    let url = match package.homepage() {
        Ok(Some(homepage)) => homepage,
        _ => format!(
            "{}/{}",
            ctx.config.upstream.git_base_url.trim_end_matches('/'),
            project
        ),
    };
    let path = ctx.config.dirs.upstream_dir().join(project);
    let repo = GitWorkspace::clone_or_open(&url, &path)?;
    // Upstream default branch is master on opendev; fall back to main.
    if repo.sync_branch("master").is_err() {
        repo.sync_branch("main")?;
    }
    Ok(repo)
}

async fn import_target(
    ctx: &PipelineContext,
    name: &str,
    target: &PackageTarget,
    upstream_path: Option<&Path>,
    packaging_path: &Path,
) -> Result<PathBuf, CoreError> {
    let tarball = ctx.fetcher.fetch(name, target, upstream_path).await?;
    import_orig(
        packaging_path,
        &ctx.config.import.import_tool,
        &tarball,
        &target.debian_upstream,
    )
    .await?;
    Ok(tarball)
}
