//! Default mode — update submodules, commit pointer drift, push in CI.

use anyhow::{Context as _, Result};
use colored::Colorize;
use serde::Serialize;

use subsync_sync::{
    CommitOutcome, PushOutcome, SyncReport, SyncScope, UpdateEntry, UpdateOptions, UpdateOutcome,
};

use super::{short, Context};
use crate::exit;

/// Flags that shape an update run.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpdateFlags {
    pub no_commit: bool,
    pub no_push: bool,
    pub detailed_exitcode: bool,
}

impl UpdateFlags {
    /// Push only in an automated pipeline, after a commit, when not disabled.
    pub fn options(&self, ctx: &Context, automated: bool) -> UpdateOptions {
        let commit = !self.no_commit;
        let push = automated && commit && !self.no_push;
        UpdateOptions::from_config(&ctx.config, commit, push)
    }
}

#[derive(Serialize)]
struct UpdateJson<'a> {
    automated: bool,
    #[serde(flatten)]
    report: &'a SyncReport,
}

pub fn run(ctx: &Context, scope: &SyncScope, flags: &UpdateFlags) -> Result<u8> {
    let automated = ctx.config.is_automated(|name| std::env::var(name).ok());
    tracing::debug!("automated context: {automated}");
    let options = flags.options(ctx, automated);

    let orchestrator = ctx.orchestrator()?;
    let report = orchestrator
        .update(scope, &options)
        .context("submodule update aborted")?;

    if ctx.json {
        let payload = UpdateJson {
            automated,
            report: &report,
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("failed to serialize update JSON")?
        );
    } else {
        print_report(&report, flags, automated, &options.remote);
    }

    Ok(exit_code(&report, flags))
}

fn exit_code(report: &SyncReport, flags: &UpdateFlags) -> u8 {
    if report.has_failures() {
        exit::FAILURE
    } else if flags.detailed_exitcode && report.changes_applied() {
        exit::CHANGED
    } else {
        exit::SUCCESS
    }
}

fn print_report(report: &SyncReport, flags: &UpdateFlags, automated: bool, remote: &str) {
    for entry in &report.entries {
        print_entry(entry);
    }

    match &report.commit {
        CommitOutcome::NothingToDo => {
            println!("✓ nothing to commit, submodule pointers unchanged");
        }
        CommitOutcome::Staged { paths } => {
            let names: Vec<&str> = paths.iter().map(|p| p.as_str()).collect();
            println!(
                "✓ changes staged for {} (not committed: --no-commit)",
                names.join(", ")
            );
        }
        CommitOutcome::Committed { id, .. } => {
            println!("✓ changes applied, commit {} created", id.short());
        }
    }

    match &report.push {
        PushOutcome::NotNeeded => {}
        PushOutcome::Skipped if flags.no_push => println!("push skipped (--no-push)"),
        PushOutcome::Skipped if !automated => println!(
            "push skipped (not in automated context); run `git push {remote}` to publish"
        ),
        PushOutcome::Skipped => println!("push skipped"),
        PushOutcome::Pushed { remote } => println!("✓ pushed to {remote}"),
        PushOutcome::Failed { remote, message } => {
            eprintln!("{} push to {remote} failed: {message}", "✗".red().bold());
        }
    }

    let failed = report
        .entries
        .iter()
        .filter(|e| matches!(e.outcome, UpdateOutcome::Error { .. }))
        .count();
    if failed > 0 {
        eprintln!(
            "{} {failed} submodule(s) failed to update; successful updates were kept",
            "✗".red().bold()
        );
    }
}

fn print_entry(entry: &UpdateEntry) {
    match &entry.outcome {
        UpdateOutcome::UpToDate => println!("  ·  {}  up to date", entry.path),
        UpdateOutcome::Updated { from, to } => println!(
            "  ✎  {}  {} -> {}",
            entry.path,
            short(from.as_ref()),
            short(to.as_ref())
        ),
        UpdateOutcome::Error { message } => {
            eprintln!("  {}  {}  {}", "✗".red().bold(), entry.path, message);
        }
    }
}
