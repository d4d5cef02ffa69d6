//! StackPack command-line tool.
//!
//! Provides the `import` subcommand that drives the batch import of new
//! upstream versions into the team's packaging repositories, plus helpers
//! for listing repositories and generating / validating configuration.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

use stackpack_core::config::AppConfig;
use stackpack_core::launchpad::LaunchpadClient;
use stackpack_core::orchestrator::{self, OrchestratorOptions};
use stackpack_core::pipeline::{ImportOutcome, PipelineContext};
use stackpack_core::releases::ReleaseIndex;
use stackpack_core::tarball::TarballFetcher;
use stackpack_core::version::ReleaseType;
use stackpack_core::workspace::GitWorkspace;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// StackPack upstream import tool.
#[derive(Parser, Debug)]
#[command(
    name = "stackpack",
    version,
    about = "Import new upstream versions into Ubuntu OpenStack packaging repositories"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = "./stackpack.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Import new upstream versions.
    Import {
        /// Package names or glob patterns to import; empty means all.
        packages: Vec<String>,

        /// Package names or glob patterns to skip.
        #[arg(long = "exclude-packages", value_name = "PATTERN")]
        exclude_packages: Vec<String>,

        /// Release type to import: release, candidate, beta, snapshot, auto.
        #[arg(short = 't', long = "type", default_value = "auto")]
        release_type: ReleaseType,

        /// Development cycle to import into; defaults to the cycle currently
        /// in development.
        #[arg(long)]
        cycle: Option<String>,

        /// Number of repositories imported in parallel.
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Keep importing remaining packages after a failure.
        #[arg(long)]
        continue_on_error: bool,

        /// Delete tarballs after a successful import.
        #[arg(long)]
        cleanup_tarballs: bool,
    },

    /// List the team's packaging repositories.
    List,

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./stackpack.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Init { output } => cmd_init(&output).map(|()| ExitCode::SUCCESS),
        Commands::Validate => cmd_validate(&cli.config).map(|()| ExitCode::SUCCESS),
        Commands::List => {
            let config = load_config(&cli.config)?;
            cmd_list(&config).await.map(|()| ExitCode::SUCCESS)
        }
        Commands::Import {
            packages,
            exclude_packages,
            release_type,
            cycle,
            jobs,
            continue_on_error,
            cleanup_tarballs,
        } => {
            let mut config = load_config(&cli.config)?;
            if let Some(jobs) = jobs {
                config.import.jobs = jobs;
            }
            if cleanup_tarballs {
                config.import.cleanup_tarballs = true;
            }
            cmd_import(
                config,
                packages,
                exclude_packages,
                release_type,
                cycle,
                continue_on_error,
            )
            .await
        }
    }
}

fn load_config(path: &PathBuf) -> Result<AppConfig> {
    if path.exists() {
        AppConfig::load_from_file(path).context("failed to load configuration file")
    } else {
        // Everything has a default; a missing config file is fine.
        Ok(AppConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

async fn cmd_import(
    config: AppConfig,
    packages: Vec<String>,
    exclude_packages: Vec<String>,
    release_type: ReleaseType,
    cycle: Option<String>,
    continue_on_error: bool,
) -> Result<ExitCode> {
    config.dirs.create_all().context("failed to create working directories")?;

    // Sync the shared releases checkout, then read cycle metadata from it.
    let releases_repo = GitWorkspace::clone_or_open(
        &config.upstream.releases_repo_url,
        &config.dirs.releases_dir(),
    )
    .context("failed to clone the releases repository")?;
    releases_repo
        .sync_branch("master")
        .context("failed to sync the releases repository")?;
    let releases = ReleaseIndex::new(config.dirs.releases_dir());

    let cycle = match cycle {
        Some(cycle) => cycle,
        None => releases
            .current_cycle()
            .context("failed to determine the development cycle")?,
    };
    let previous_cycle = releases.previous_cycle()?;

    let client = LaunchpadClient::new(&config.launchpad.api_root, &config.launchpad.team);
    let repositories = client
        .list_team_repositories()
        .await
        .context("failed to list team repositories")?;

    let options = OrchestratorOptions {
        include: packages,
        exclude: exclude_packages,
        concurrency: config.import.jobs,
        continue_on_error,
    };
    let fetcher = TarballFetcher::new(
        config.dirs.tarballs_dir(),
        config.import.download_timeout_secs,
    )?;
    let ctx = Arc::new(PipelineContext {
        config,
        releases,
        cycle: cycle.clone(),
        previous_cycle,
        release_type,
        fetcher,
    });

    println!(
        "Importing {} releases for cycle {}",
        style(release_type.to_string()).bold(),
        style(&cycle).bold()
    );
    let outcomes = orchestrator::run_imports(ctx, repositories, &options).await;

    let mut imported = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;
    for (name, outcome) in &outcomes {
        match outcome {
            ImportOutcome::Imported { version } => {
                imported += 1;
                println!("{} {name} {version}", style("✓").green());
            }
            ImportOutcome::Skipped { reason } => {
                skipped += 1;
                println!("{} {name} ({reason})", style("-").dim());
            }
            ImportOutcome::Failed { error, .. } => {
                failed += 1;
                let note = if outcome.needs_attention() {
                    " [NOT ROLLED BACK]"
                } else {
                    ""
                };
                println!(
                    "{} {name}: {error}{}",
                    style("✗").red(),
                    style(note).red().bold()
                );
            }
        }
    }
    println!(
        "\n{} imported, {} skipped, {} failed",
        style(imported).green(),
        skipped,
        if failed > 0 {
            style(failed).red()
        } else {
            style(failed)
        }
    );

    Ok(if failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

async fn cmd_list(config: &AppConfig) -> Result<()> {
    let client = LaunchpadClient::new(&config.launchpad.api_root, &config.launchpad.team);
    let repositories = client
        .list_team_repositories()
        .await
        .context("failed to list team repositories")?;
    for repo in repositories {
        println!("{}", repo.name);
    }
    Ok(())
}

fn cmd_init(output: &PathBuf) -> Result<()> {
    let default_config = r#"# StackPack configuration
# Every value shown here is the default; delete what you do not change.

[dirs]
root = "."

[upstream]
tarballs_base_url = "https://tarballs.opendev.org"
releases_repo_url = "https://opendev.org/openstack/releases"
git_base_url = "https://opendev.org/openstack"

[launchpad]
api_root = "https://api.launchpad.net/devel"
team = "~ubuntu-openstack-dev"

[import]
import_tool = "gbp"
upstream_branch_prefix = "upstream"
packaging_branch = "master"
cleanup_tarballs = false
jobs = 1
download_timeout_secs = 300
"#;

    if output.exists() {
        anyhow::bail!("refusing to overwrite existing file: {}", output.display());
    }
    std::fs::write(output, default_config)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Wrote {}", output.display());
    Ok(())
}

fn cmd_validate(path: &PathBuf) -> Result<()> {
    let config = AppConfig::load_from_file(path).context("configuration is invalid")?;
    config.validate().context("configuration is invalid")?;
    println!("{} configuration is valid", style("✓").green());
    Ok(())
}
