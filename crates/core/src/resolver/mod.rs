//! Release resolution: deciding which upstream version to import.
//!
//! Each concrete resolver handles one release type and answers with
//! `Ok(Some(target))`, `Ok(None)` when no candidate of its type exists, or
//! `Err` for genuine failures. The [`AutoResolver`] probes the concrete
//! resolvers in fixed priority order and additionally requires the candidate
//! to be newer than what is already packaged.

mod beta;
mod candidate;
mod release;
mod snapshot;

pub use beta::BetaResolver;
pub use candidate::CandidateResolver;
pub use release::ReleaseResolver;
pub use snapshot::SnapshotResolver;

use tracing::{debug, instrument};

use crate::errors::ResolveError;
use crate::releases::Deliverable;
use crate::version::{compare_upstream, DebianVersion, ReleaseType, UpstreamVersion};
use crate::workspace::GitWorkspace;

/// Where the upstream tarball for a resolved target comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TarballSource {
    /// Download a published tarball.
    Remote { url: String },
    /// Generate an archive from the upstream clone's HEAD.
    LocalArchive,
}

/// A fully resolved import target for one repository.
#[derive(Debug, Clone)]
pub struct PackageTarget {
    /// The upstream version in its native grammar.
    pub upstream: UpstreamVersion,
    /// The converted Debian upstream version string.
    pub debian_upstream: String,
    /// Where the tarball comes from.
    pub source: TarballSource,
}

/// Everything a resolver may consult. Resolvers never mutate anything.
pub struct ResolveContext<'a> {
    /// Packaging repository name, for diagnostics.
    pub repository: &'a str,
    /// Development cycle being imported into.
    pub cycle: &'a str,
    /// Deliverable metadata for this project, when the releases repository
    /// has any for the cycle.
    pub deliverable: Option<&'a Deliverable>,
    /// Currently packaged version, from the changelog head.
    pub packaged: Option<&'a DebianVersion>,
    /// Base URL for published tarballs.
    pub tarballs_base_url: &'a str,
    /// Synced upstream clone, needed by the snapshot resolver.
    pub upstream_repo: Option<&'a GitWorkspace>,
}

/// A strategy for resolving one release type.
pub trait Resolver {
    fn release_type(&self) -> ReleaseType;

    /// `Ok(None)` means "no candidate of my type exists", which is not an
    /// error.
    fn resolve(&self, ctx: &ResolveContext<'_>) -> Result<Option<PackageTarget>, ResolveError>;
}

/// Build the resolver for a release type. `Auto` gets the probing
/// [`AutoResolver`]; every other type maps to its own resolver.
pub fn resolver_for(release_type: ReleaseType) -> Box<dyn Resolver + Send + Sync> {
    match release_type {
        ReleaseType::Release => Box::new(ReleaseResolver),
        ReleaseType::Candidate => Box::new(CandidateResolver),
        ReleaseType::Beta => Box::new(BetaResolver),
        ReleaseType::Snapshot => Box::new(SnapshotResolver),
        ReleaseType::Auto => Box::new(AutoResolver),
    }
}

/// Probes the concrete resolvers in priority order (release, candidate,
/// beta, snapshot) and takes the first hit that is newer than the packaged
/// version.
pub struct AutoResolver;

impl Resolver for AutoResolver {
    fn release_type(&self) -> ReleaseType {
        ReleaseType::Auto
    }

    #[instrument(skip(self, ctx), fields(repository = ctx.repository, cycle = ctx.cycle))]
    fn resolve(&self, ctx: &ResolveContext<'_>) -> Result<Option<PackageTarget>, ResolveError> {
        for release_type in ReleaseType::PRIORITY {
            let resolver = resolver_for(release_type);
            let target = match resolver.resolve(ctx) {
                Ok(Some(target)) => target,
                Ok(None) => continue,
                // An explicit snapshot of a tagged HEAD is an error, but in
                // auto mode it just means a release already covers HEAD.
                Err(ResolveError::HeadIsTagged { .. }) => continue,
                Err(e) => return Err(e),
            };
            if !is_newer_than_packaged(&target, ctx.packaged) {
                debug!(
                    %release_type,
                    candidate = target.debian_upstream,
                    "candidate not newer than packaged version"
                );
                continue;
            }
            debug!(%release_type, candidate = target.debian_upstream, "resolved");
            return Ok(Some(target));
        }
        Ok(None)
    }
}

fn is_newer_than_packaged(target: &PackageTarget, packaged: Option<&DebianVersion>) -> bool {
    match packaged {
        Some(packaged) => {
            compare_upstream(&target.debian_upstream, packaged.upstream())
                == std::cmp::Ordering::Greater
        }
        None => true,
    }
}

/// Shared body of the release, candidate, and beta resolvers: take the
/// latest published version from the deliverable metadata and accept it only
/// if it matches `release_type`'s grammar. A grammar mismatch is not an
/// error, it just means the latest version is of another type.
fn resolve_published(
    ctx: &ResolveContext<'_>,
    release_type: ReleaseType,
) -> Result<Option<PackageTarget>, ResolveError> {
    let Some(deliverable) = ctx.deliverable else {
        return Ok(None);
    };
    let Some(raw) = deliverable.latest_version.as_deref() else {
        return Ok(None);
    };

    let upstream = match UpstreamVersion::parse(raw, release_type) {
        Ok(v) => v,
        Err(crate::errors::VersionError::InvalidFormat { .. }) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let debian_upstream = upstream.to_debian(None)?;
    let url = deliverable.tarball_url(ctx.tarballs_base_url, raw);

    Ok(Some(PackageTarget {
        upstream,
        debian_upstream,
        source: TarballSource::Remote { url },
    }))
}
