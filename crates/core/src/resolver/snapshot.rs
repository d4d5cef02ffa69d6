//! Git-snapshot resolver.
//!
//! Snapshots come from the upstream clone itself: `git describe` of HEAD
//! names the base tag, commit count, and abbreviated object, which the
//! version model turns into a Debian snapshot version. The tarball is
//! generated locally from HEAD rather than downloaded.

use tracing::debug;

use crate::errors::ResolveError;
use crate::version::ReleaseType;

use super::{PackageTarget, ResolveContext, Resolver, TarballSource};

pub struct SnapshotResolver;

impl Resolver for SnapshotResolver {
    fn release_type(&self) -> ReleaseType {
        ReleaseType::Snapshot
    }

    fn resolve(&self, ctx: &ResolveContext<'_>) -> Result<Option<PackageTarget>, ResolveError> {
        let Some(upstream_repo) = ctx.upstream_repo else {
            debug!(repository = ctx.repository, "no upstream clone, cannot snapshot");
            return Ok(None);
        };

        // HEAD carrying a release tag means there is nothing newer than the
        // tagged release to snapshot.
        let tags = upstream_repo.head_tags()?;
        if !tags.is_empty() {
            return Err(ResolveError::HeadIsTagged {
                repository: ctx.repository.to_string(),
                tags,
            });
        }

        let described = upstream_repo.describe_long()?;
        let upstream = crate::version::UpstreamVersion::parse(&described, ReleaseType::Snapshot)?;
        let existing = ctx.packaged.map(|v| v.upstream());
        let debian_upstream = upstream.to_debian(existing)?;

        Ok(Some(PackageTarget {
            upstream,
            debian_upstream,
            source: TarballSource::LocalArchive,
        }))
    }
}
