//! `subsync --check` — fetch and report drift without updating.

use anyhow::{Context as _, Result};
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use subsync_sync::{CheckOutcome, CheckReport, SyncScope};

use super::{short, Context};
use crate::exit;

#[derive(Tabled)]
struct CheckTableRow {
    #[tabled(rename = "submodule")]
    submodule: String,
    #[tabled(rename = "recorded")]
    recorded: String,
    #[tabled(rename = "remote")]
    remote: String,
    #[tabled(rename = "state")]
    state: String,
}

pub fn run(ctx: &Context, scope: &SyncScope) -> Result<u8> {
    let orchestrator = ctx.orchestrator()?;
    let report = orchestrator.check(scope)?;

    if ctx.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize check JSON")?
        );
    } else {
        print_report(&report);
    }

    Ok(if report.has_failures() {
        exit::FAILURE
    } else {
        exit::SUCCESS
    })
}

fn print_report(report: &CheckReport) {
    if report.entries.is_empty() {
        println!("No submodules configured.");
        return;
    }

    let rows: Vec<CheckTableRow> = report
        .entries
        .iter()
        .map(|entry| CheckTableRow {
            submodule: entry.path.to_string(),
            recorded: short(entry.recorded.as_ref()),
            remote: short(entry.remote.as_ref()),
            state: outcome_label(&entry.outcome),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    for entry in &report.entries {
        if let CheckOutcome::Error { message } = &entry.outcome {
            eprintln!("{} {}: {}", "✗".red().bold(), entry.path, message);
        }
    }

    match report.behind_count() {
        0 if !report.has_failures() => println!("✓ all submodules up to date"),
        0 => {}
        n => println!("{n} submodule(s) behind; run `subsync` to update."),
    }
}

fn outcome_label(outcome: &CheckOutcome) -> String {
    match outcome {
        CheckOutcome::UpToDate => format!("{} up to date", "■".green().bold()),
        CheckOutcome::Behind { commits: Some(n) } => {
            format!("{} behind by {n} commit(s)", "■".yellow().bold())
        }
        CheckOutcome::Behind { commits: None } => format!("{} behind", "■".yellow().bold()),
        CheckOutcome::Ahead => format!("{} ahead of remote", "■".cyan().bold()),
        CheckOutcome::Error { .. } => format!("{} fetch failed", "■".red().bold()),
    }
}
