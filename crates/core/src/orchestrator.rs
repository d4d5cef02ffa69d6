//! Fan-out across repositories with bounded concurrency.
//!
//! The orchestrator filters the repository list, then runs one pipeline per
//! repository under a semaphore. With `continue_on_error` disabled, the
//! first failure flips a cancellation flag: pipelines that have not yet
//! acquired a permit never start and report no outcome, while
//! already-running ones are allowed to finish (killing a pipeline
//! mid-import would defeat the rollback guarantees).

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use glob_match::glob_match;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, instrument, warn};

use crate::launchpad::TeamRepository;
use crate::pipeline::{run_import, ImportOutcome, PipelineContext};

/// How a batch run selects and schedules repositories.
#[derive(Debug, Clone)]
pub struct OrchestratorOptions {
    /// Names or glob patterns to include; empty means everything.
    pub include: Vec<String>,
    /// Names or glob patterns to exclude; applied after `include`.
    pub exclude: Vec<String>,
    /// Maximum number of pipelines running at once.
    pub concurrency: usize,
    /// Keep going after a failure instead of cancelling the rest.
    pub continue_on_error: bool,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: Vec::new(),
            concurrency: 1,
            continue_on_error: false,
        }
    }
}

/// Case-insensitive name match: glob when the pattern carries a
/// metacharacter, exact comparison otherwise.
fn matches_pattern(name: &str, pattern: &str) -> bool {
    let name = name.to_lowercase();
    let pattern = pattern.to_lowercase();
    if pattern.contains(['*', '?', '[']) {
        glob_match(&pattern, &name)
    } else {
        name == pattern
    }
}

/// Apply include and exclude filters and drop duplicate names. Order is
/// preserved from the input list.
pub fn filter_repositories(
    repositories: Vec<TeamRepository>,
    include: &[String],
    exclude: &[String],
) -> Vec<TeamRepository> {
    let mut seen = std::collections::HashSet::new();
    repositories
        .into_iter()
        .filter(|repo| {
            (include.is_empty() || include.iter().any(|p| matches_pattern(&repo.name, p)))
                && !exclude.iter().any(|p| matches_pattern(&repo.name, p))
        })
        .filter(|repo| seen.insert(repo.name.to_lowercase()))
        .collect()
}

/// Run `runner` for every repository with at most `concurrency` in flight.
/// Generic over the runner so scheduling behaviour is testable without real
/// imports.
pub async fn run_batch<F, Fut>(
    repositories: Vec<TeamRepository>,
    options: &OrchestratorOptions,
    runner: F,
) -> BTreeMap<String, ImportOutcome>
where
    F: Fn(TeamRepository) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = ImportOutcome> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let cancelled = Arc::new(AtomicBool::new(false));
    let continue_on_error = options.continue_on_error;

    let mut tasks = JoinSet::new();
    for repo in repositories {
        let semaphore = Arc::clone(&semaphore);
        let cancelled = Arc::clone(&cancelled);
        let runner = runner.clone();
        tasks.spawn(async move {
            let name = repo.name.clone();
            // The semaphore is never closed here, so acquire only fails if
            // the runtime is shutting down.
            let Ok(_permit) = semaphore.acquire().await else {
                return None;
            };
            // Cancelled pipelines never start and produce no outcome.
            if cancelled.load(Ordering::SeqCst) {
                info!(repository = %name, "cancelled after earlier failure");
                return None;
            }
            let outcome = runner(repo).await;
            if outcome.is_failure() && !continue_on_error {
                cancelled.store(true, Ordering::SeqCst);
            }
            Some((name, outcome))
        });
    }

    let mut outcomes = BTreeMap::new();
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(Some((name, outcome))) => {
                outcomes.insert(name, outcome);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "pipeline task panicked");
            }
        }
    }
    outcomes
}

/// Run the real import pipeline for every selected repository.
#[instrument(skip(ctx, repositories, options), fields(count = repositories.len()))]
pub async fn run_imports(
    ctx: Arc<PipelineContext>,
    repositories: Vec<TeamRepository>,
    options: &OrchestratorOptions,
) -> BTreeMap<String, ImportOutcome> {
    let selected = filter_repositories(repositories, &options.include, &options.exclude);
    info!(selected = selected.len(), "dispatching imports");
    run_batch(selected, options, move |repo| {
        let ctx = Arc::clone(&ctx);
        async move { run_import(&ctx, &repo.name, &repo.git_url).await }
    })
    .await
}
