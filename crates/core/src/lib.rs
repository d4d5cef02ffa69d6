//! StackPack core library.
//!
//! This crate provides the components for automating upstream tarball
//! imports into Debian packaging repositories: the version model, release
//! resolvers, the git workspace manager, tarball acquisition, the
//! per-repository import pipeline, and the batch orchestrator.

pub mod config;
pub mod errors;
pub mod launchpad;
pub mod orchestrator;
pub mod package;
pub mod pipeline;
pub mod releases;
pub mod resolver;
pub mod tarball;
pub mod version;
pub mod workspace;

// Re-exports for convenience.
pub use config::AppConfig;
pub use errors::CoreError;
pub use pipeline::{ImportOutcome, PipelineContext, RollbackStatus};
pub use version::{DebianVersion, ReleaseType, UpstreamVersion};
pub use workspace::GitWorkspace;
