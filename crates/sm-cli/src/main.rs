//! CLI entry point for smartui-migrate.
//!
//! Migrates Percy, Applitools and Sauce Labs Visual test suites to
//! LambdaTest SmartUI.
//!
//! # Usage
//!
//! ```bash
//! smartui-migrate [OPTIONS] <COMMAND>
//!
//! # What platform does this project use?
//! smartui-migrate detect --path ./my-project
//!
//! # Preview the migration without writing
//! smartui-migrate analyze
//!
//! # Apply it, with a checkpoint
//! smartui-migrate apply
//!
//! # Undo it
//! smartui-migrate checkpoints list
//! smartui-migrate checkpoints rollback <ID>
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

mod prompt;
mod render;

use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{WrapErr, eyre};
use sm_apply::{ApplyManager, ApplyOptions, ApplyOutcome, CheckpointManager};
use sm_core::{Config, DetectionResult, Platform};
use sm_scanner::{AnalysisReport, DetectError, Detector, DryRunAnalyzer};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::prompt::TerminalPrompt;
use crate::render::Format;

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Migrates visual regression tests to LambdaTest SmartUI.
#[derive(Parser)]
#[command(name = "smartui-migrate", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// Project root. Defaults to the current directory.
    #[arg(short, long, global = true, env = "SMARTUI_MIGRATE_PATH")]
    path: Option<Utf8PathBuf>,

    /// Source platform, when more than one is detected.
    #[arg(long, global = true, value_enum, env = "SMARTUI_MIGRATE_PLATFORM")]
    platform: Option<PlatformArg>,

    /// Output format.
    #[arg(short, long, global = true, value_enum, default_value_t = Format::Text, env = "SMARTUI_MIGRATE_FORMAT")]
    format: Format,

    /// Maximum parallel analysis jobs (overrides the config file).
    #[arg(short, long, global = true, env = "SMARTUI_MIGRATE_JOBS")]
    jobs: Option<usize>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Detect the platform, framework and language in use.
    Detect,

    /// List every platform candidate with its evidence.
    Candidates,

    /// Preview the migration without writing anything.
    Analyze,

    /// Apply the migration.
    Apply(ApplyArgs),

    /// Manage checkpoints.
    #[command(subcommand)]
    Checkpoints(CheckpointCommand),
}

/// Flags for `apply`.
#[derive(Args, Clone, Copy)]
struct ApplyArgs {
    /// Skip the checkpoint.
    #[arg(long)]
    no_backup: bool,

    /// Only preview; same as `analyze`.
    #[arg(long)]
    dry_run: bool,

    /// Ask before writing each file.
    #[arg(long)]
    confirm: bool,
}

/// Checkpoint subcommands.
#[derive(Subcommand)]
enum CheckpointCommand {
    /// List checkpoints, newest first.
    List,
    /// Show one checkpoint.
    Show {
        /// Checkpoint id.
        id: Uuid,
    },
    /// Restore the files saved in a checkpoint.
    Rollback {
        /// Checkpoint id.
        id: Uuid,
        /// Also remove files the run created and delete the checkpoint.
        #[arg(long)]
        cleanup: bool,
    },
    /// Remove a rolled-back run's created files and delete its checkpoint.
    Cleanup {
        /// Checkpoint id.
        id: Uuid,
    },
    /// Mark a migration as stable.
    Commit {
        /// Checkpoint id.
        id: Uuid,
    },
    /// Delete a checkpoint's backups.
    Delete {
        /// Checkpoint id.
        id: Uuid,
    },
}

/// Source platform selector.
#[derive(Clone, Copy, ValueEnum)]
enum PlatformArg {
    /// BrowserStack Percy.
    Percy,
    /// Applitools Eyes.
    Applitools,
    /// Sauce Labs Visual.
    SauceLabs,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Percy => Self::Percy,
            PlatformArg::Applitools => Self::Applitools,
            PlatformArg::SauceLabs => Self::SauceLabs,
        }
    }
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects `RUST_LOG` if set. Otherwise uses `debug` with `--verbose` and
/// `info` by default. Logs go to stderr so `--format json` output stays
/// parseable.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(format!("{level},ignore=warn,globset=warn"))
    });

    // Flag or NO_COLOR env var
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_ansi(use_ansi)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

/// Resolves the project root and loads its configuration, applying CLI
/// overrides.
///
/// # Errors
///
/// Returns an error if the root is not a directory or the config file is
/// invalid.
fn build_config(cli: &Cli) -> color_eyre::Result<(Utf8PathBuf, Config)> {
    let path = cli.path.clone().unwrap_or_else(|| Utf8PathBuf::from("."));

    if !path.exists() {
        return Err(eyre!("Path does not exist: {}", path));
    }
    if !path.is_dir() {
        return Err(eyre!("Path is not a directory: {}", path));
    }
    let root = path
        .canonicalize_utf8()
        .wrap_err_with(|| format!("Cannot resolve {path}"))?;

    let mut config = Config::load(&root)?;
    if let Some(jobs) = cli.jobs {
        config.scan.max_parallel_jobs = Some(jobs);
    }
    config.validate()?;
    Ok((root, config))
}

/// Detects the platform, honoring `--platform` when given.
fn detect(cli: &Cli, root: &Utf8Path, config: &Config) -> color_eyre::Result<DetectionResult> {
    let detector = Detector::new(config);
    let Some(choice) = cli.platform.map(Platform::from) else {
        return match detector.detect(root) {
            Err(err @ DetectError::MultiplePlatformsDetected { .. }) => {
                Err(err).wrap_err("Choose one with --platform")
            }
            other => Ok(other?),
        };
    };

    let candidates = detector.candidates(root)?;
    let candidate = candidates
        .iter()
        .find(|c| c.platform == choice)
        .ok_or_else(|| eyre!("No evidence of {} in {}", choice, root))?;
    Ok(detector.detect_with_choice(root, candidate)?)
}

/// Writes rendered output to stdout.
fn emit(content: &str) -> color_eyre::Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    write!(handle, "{content}")?;
    handle.flush()?;
    Ok(())
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

fn run_detect(cli: &Cli, root: &Utf8Path, config: &Config) -> color_eyre::Result<()> {
    let detection = detect(cli, root, config)?;
    emit(&render::render(cli.format, &detection, render::detection)?)
}

fn run_candidates(cli: &Cli, root: &Utf8Path, config: &Config) -> color_eyre::Result<()> {
    let candidates = Detector::new(config).candidates(root)?;
    emit(&render::render(cli.format, candidates.as_slice(), render::candidates)?)
}

fn analyze(cli: &Cli, root: &Utf8Path, config: &Config) -> color_eyre::Result<(DetectionResult, AnalysisReport)> {
    let detection = detect(cli, root, config)?;
    let report = DryRunAnalyzer::new(&config.scan).analyze(&detection)?;
    Ok((detection, report))
}

fn run_analyze(cli: &Cli, root: &Utf8Path, config: &Config) -> color_eyre::Result<()> {
    let (_, report) = analyze(cli, root, config)?;
    emit(&render::render(cli.format, &report, render::report)?)
}

/// Analyzes and applies, rolling back on Ctrl-C.
///
/// The write phase runs on a blocking thread; the signal handler only
/// cancels the token, and the apply loop notices before its next write.
async fn run_apply(
    cli: &Cli,
    root: Utf8PathBuf,
    config: Config,
    args: ApplyArgs,
) -> color_eyre::Result<()> {
    let (detection, report) = analyze(cli, &root, &config)?;

    let mut options = ApplyOptions::from(&config.apply);
    options.dry_run = args.dry_run;
    options.create_backup &= !args.no_backup;
    options.confirm_each_file |= args.confirm;

    let mut builder = ApplyManager::builder(&config);
    if options.confirm_each_file {
        builder = builder.confirmation(TerminalPrompt::default());
    }
    let manager = builder.build();

    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, stopping before the next write");
                cancel.cancel();
            }
        })
    };

    info!(root = %root, platform = %detection.platform, dry_run = args.dry_run, "Applying migration");
    let outcome: ApplyOutcome = tokio::task::spawn_blocking(move || {
        manager.execute_transformation(&detection, &report, options, &cancel)
    })
    .await
    .wrap_err("Apply task stopped unexpectedly")??;
    interrupt.abort();

    emit(&render::render(cli.format, &outcome, render::outcome)?)?;
    if outcome.success {
        Ok(())
    } else {
        Err(eyre!(
            "Migration failed: {}",
            outcome.error.as_deref().unwrap_or("unknown error")
        ))
    }
}

fn run_checkpoints(
    cli: &Cli,
    root: &Utf8Path,
    config: &Config,
    command: &CheckpointCommand,
) -> color_eyre::Result<()> {
    let store = CheckpointManager::new(root, &config.checkpoint);
    let format = cli.format;
    let content = match command {
        CheckpointCommand::List => {
            let summaries = store.list_checkpoints()?;
            render::render(format, summaries.as_slice(), render::checkpoint_list)?
        }
        CheckpointCommand::Show { id } => {
            render::render(format, &store.get_checkpoint(*id)?, render::checkpoint)?
        }
        CheckpointCommand::Rollback { id, cleanup } => {
            let result = store.rollback_to_checkpoint(*id)?;
            let mut content = render::render(format, &result, render::rollback)?;
            if *cleanup {
                if result.is_complete() {
                    let removed = store.cleanup_after_rollback(*id)?;
                    content.push_str(&render::render(format, &removed, render::cleanup)?);
                } else {
                    warn!(id = %id, "Rollback incomplete, checkpoint kept");
                }
            }
            content
        }
        CheckpointCommand::Cleanup { id } => {
            render::render(format, &store.cleanup_after_rollback(*id)?, render::cleanup)?
        }
        CheckpointCommand::Commit { id } => {
            let checkpoint = store.commit_checkpoint(*id)?;
            render::render(format, &checkpoint.summary(), |s| format!("Checkpoint {} committed\n", s.id))?
        }
        CheckpointCommand::Delete { id } => {
            store.delete_checkpoint(*id)?;
            render::render(format, id, |id| format!("Checkpoint {id} deleted\n"))?
        }
    };
    emit(&content)
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Resolve the project and its configuration
    let (root, config) = build_config(&cli)?;

    // 5. Route to appropriate command
    match &cli.command {
        Commands::Detect => run_detect(&cli, &root, &config),
        Commands::Candidates => run_candidates(&cli, &root, &config),
        Commands::Analyze => run_analyze(&cli, &root, &config),
        Commands::Apply(args) => run_apply(&cli, root, config, *args).await,
        Commands::Checkpoints(command) => run_checkpoints(&cli, &root, &config, command),
    }
}
