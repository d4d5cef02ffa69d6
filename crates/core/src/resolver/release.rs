//! Final-release resolver.

use crate::errors::ResolveError;
use crate::version::ReleaseType;

use super::{PackageTarget, ResolveContext, Resolver};

/// Resolves the latest published version when it is a final release.
pub struct ReleaseResolver;

impl Resolver for ReleaseResolver {
    fn release_type(&self) -> ReleaseType {
        ReleaseType::Release
    }

    fn resolve(&self, ctx: &ResolveContext<'_>) -> Result<Option<PackageTarget>, ResolveError> {
        super::resolve_published(ctx, ReleaseType::Release)
    }
}
