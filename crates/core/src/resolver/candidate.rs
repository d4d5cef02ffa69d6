//! Release-candidate resolver.

use crate::errors::ResolveError;
use crate::version::ReleaseType;

use super::{PackageTarget, ResolveContext, Resolver};

/// Resolves the latest published version when it is a release candidate.
pub struct CandidateResolver;

impl Resolver for CandidateResolver {
    fn release_type(&self) -> ReleaseType {
        ReleaseType::Candidate
    }

    fn resolve(&self, ctx: &ResolveContext<'_>) -> Result<Option<PackageTarget>, ResolveError> {
        super::resolve_published(ctx, ReleaseType::Candidate)
    }
}
