//! Beta-release resolver.

use crate::errors::ResolveError;
use crate::version::ReleaseType;

use super::{PackageTarget, ResolveContext, Resolver};

/// Resolves the latest published version when it is a beta.
pub struct BetaResolver;

impl Resolver for BetaResolver {
    fn release_type(&self) -> ReleaseType {
        ReleaseType::Beta
    }

    fn resolve(&self, ctx: &ResolveContext<'_>) -> Result<Option<PackageTarget>, ResolveError> {
        super::resolve_published(ctx, ReleaseType::Beta)
    }
}
