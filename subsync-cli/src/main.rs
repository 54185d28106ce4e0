//! subsync — keep a repository's git submodules on their tracked branches.
//!
//! # Usage
//!
//! ```text
//! subsync [PATH]...               update, commit pointer changes, push in CI
//! subsync --status [PATH]...      show the checked-out reference of each submodule
//! subsync --check [PATH]...       fetch and report drift without updating
//! subsync --no-commit             update and stage, but do not commit
//! subsync --no-push               commit locally, never push
//! ```
//!
//! Exit codes: `0` success or nothing to do, `1` precondition failure,
//! `2` fetch/update/push failure, `3` changes applied (`--detailed-exitcode`).

mod commands;
mod exit;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use colored::Colorize;

use commands::{update::UpdateFlags, Context};
use subsync_sync::SyncScope;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "subsync",
    version,
    about = "Bring git submodules to the tip of their tracked branches",
    long_about = None,
)]
struct Cli {
    /// Submodule paths to operate on (default: all, in .gitmodules order).
    #[arg(value_name = "PATH")]
    paths: Vec<String>,

    /// Print the current reference of every submodule; changes nothing.
    #[arg(short, long, conflicts_with_all = ["check", "no_commit", "no_push"])]
    status: bool,

    /// Fetch and report drift per submodule without updating.
    #[arg(short, long, conflicts_with_all = ["no_commit", "no_push"])]
    check: bool,

    /// Update and stage pointer changes, but do not commit.
    #[arg(long)]
    no_commit: bool,

    /// Commit locally, but never push.
    #[arg(long)]
    no_push: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    json: bool,

    /// Exit with 3 when pointer changes were applied.
    #[arg(long)]
    detailed_exitcode: bool,

    /// Configuration file (default: .subsync.yaml at the repository root).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log git invocations and per-submodule progress to stderr.
    #[arg(short, long)]
    verbose: bool,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // Usage errors are preconditions; help and version are not errors.
            return if err.use_stderr() {
                ExitCode::from(exit::PRECONDITION)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::from(exit::code_for(&err))
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let ctx = Context::load(cli.config.as_deref(), cli.json)?;
    let scope = SyncScope::from_paths(cli.paths);

    if cli.status {
        commands::status::run(&ctx, &scope)
    } else if cli.check {
        commands::check::run(&ctx, &scope)
    } else {
        let flags = UpdateFlags {
            no_commit: cli.no_commit,
            no_push: cli.no_push,
            detailed_exitcode: cli.detailed_exitcode,
        };
        commands::update::run(&ctx, &scope, &flags)
    }
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
