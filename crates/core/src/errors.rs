//! Error types for the StackPack core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Version(#[from] VersionError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Launchpad(#[from] LaunchpadError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

// ---------------------------------------------------------------------------
// Version errors
// ---------------------------------------------------------------------------

/// Errors from version parsing and conversion.
#[derive(Debug, Error)]
pub enum VersionError {
    /// A version string does not match the grammar for its release type.
    #[error("invalid {kind} version format: '{raw}'")]
    InvalidFormat { kind: String, raw: String },

    /// A Debian version string could not be parsed.
    #[error("invalid Debian version: '{0}'")]
    InvalidDebianVersion(String),
}

// ---------------------------------------------------------------------------
// Releases-metadata errors
// ---------------------------------------------------------------------------

/// Errors reading the releases repository metadata (series status,
/// deliverable files).
#[derive(Debug, Error)]
pub enum MetadataError {
    /// A required metadata file is missing.
    #[error("metadata file not found: {0}")]
    FileNotFound(String),

    /// YAML parse failure.
    #[error("failed to parse {path}: {detail}")]
    ParseError { path: String, detail: String },

    /// No cycle with status `development` exists in the series status file.
    #[error("no development cycle found in series status")]
    NoDevelopmentCycle,

    /// Generic I/O wrapper.
    #[error("metadata I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Launchpad errors
// ---------------------------------------------------------------------------

/// Errors from the Launchpad repository directory service.
#[derive(Debug, Error)]
pub enum LaunchpadError {
    /// HTTP-level transport error (network, TLS, etc.).
    #[error("Launchpad HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The API returned a non-success status code.
    #[error("Launchpad API error (HTTP {status}): {body}")]
    ApiError { status: u16, body: String },

    /// JSON deserialization failure.
    #[error("Launchpad response parse error: {0}")]
    ParseError(String),
}

// ---------------------------------------------------------------------------
// Git workspace errors
// ---------------------------------------------------------------------------

/// Errors from local Git (git2) workspace operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The repository path does not exist or is not a git repo.
    #[error("git repository not found at '{0}'")]
    RepositoryNotFound(String),

    /// Clone or fetch failed; retryable by caller policy.
    #[error("network operation failed for '{url}': {detail}")]
    Network { url: String, detail: String },

    /// Pre-existing local changes block a safe prepare. Never auto-mutated.
    #[error("working tree at '{path}' has local changes, refusing to touch it")]
    DirtyWorkingTree { path: String },

    /// A ref (branch, tag, SHA) could not be resolved.
    #[error("git ref not found: {0}")]
    RefNotFound(String),

    /// The repository is in a detached-HEAD state where a branch is required.
    #[error("repository at '{0}' is in detached HEAD state")]
    DetachedHead(String),

    /// A `git2` library error.
    #[error("git2 error: {0}")]
    Git2Error(#[from] git2::Error),

    /// Generic I/O wrapper.
    #[error("git I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Resolver errors
// ---------------------------------------------------------------------------

/// Errors from release resolution.
///
/// "No candidate of this type exists" is *not* an error; resolvers signal it
/// with `Ok(None)` and the auto dispatcher moves on to the next type.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// Every concrete resolver returned no candidate.
    #[error("no importable candidate found for '{repository}' in cycle '{cycle}'")]
    NoCandidateFound { repository: String, cycle: String },

    /// A snapshot was explicitly requested but upstream HEAD carries a
    /// release tag.
    #[error("snapshot requested for '{repository}' but HEAD is tagged {tags:?}")]
    HeadIsTagged {
        repository: String,
        tags: Vec<String>,
    },

    /// Underlying version error while interpreting upstream metadata.
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Underlying metadata error.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Underlying git error (the snapshot resolver reads the upstream clone).
    #[error(transparent)]
    Git(#[from] GitError),
}

// ---------------------------------------------------------------------------
// Import errors
// ---------------------------------------------------------------------------

/// Errors from tarball acquisition and the packaging-import invocation.
#[derive(Debug, Error)]
pub enum ImportError {
    /// Tarball download failed; retryable by caller policy.
    #[error("failed to download '{url}': {detail}")]
    Download { url: String, detail: String },

    /// Local snapshot archive generation failed.
    #[error("failed to archive snapshot of '{repository}': {detail}")]
    Archive { repository: String, detail: String },

    /// The external packaging-import tool reported failure. Never retried:
    /// the packaging state may be inconsistent and must be rolled back.
    #[error("import tool failed (exit {exit_code}): {stderr}")]
    ImportTool { exit_code: i32, stderr: String },

    /// Rolling back after a failed import itself failed. The repository
    /// state may be inconsistent and requires manual intervention.
    #[error("rollback failed after '{original}': {detail}")]
    RollbackFailed { original: String, detail: String },

    /// Required packaging metadata is missing or malformed.
    #[error("packaging metadata error in '{repository}': {detail}")]
    PackagingMetadata { repository: String, detail: String },

    /// Generic I/O wrapper.
    #[error("import I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue { field: String, detail: String },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
