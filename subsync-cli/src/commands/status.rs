//! `subsync --status` — checked-out reference of each submodule.

use anyhow::{Context as _, Result};
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use subsync_sync::{SubmoduleStatus, SyncScope};

use super::{short, Context};
use crate::exit;

#[derive(Serialize)]
struct StatusJson<'a> {
    submodules: &'a [SubmoduleStatus],
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "submodule")]
    submodule: String,
    #[tabled(rename = "commit")]
    commit: String,
    #[tabled(rename = "reference")]
    reference: String,
    #[tabled(rename = "state")]
    state: String,
}

pub fn run(ctx: &Context, scope: &SyncScope) -> Result<u8> {
    let orchestrator = ctx.orchestrator()?;
    let rows = orchestrator.status(scope)?;

    if ctx.json {
        let payload = StatusJson { submodules: &rows };
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).context("failed to serialize status JSON")?
        );
        return Ok(exit::SUCCESS);
    }

    print_table(&rows);
    Ok(exit::SUCCESS)
}

fn print_table(rows: &[SubmoduleStatus]) {
    println!(
        "subsync v{} | {} submodules",
        env!("CARGO_PKG_VERSION"),
        rows.len()
    );
    if rows.is_empty() {
        println!("No submodules configured.");
        return;
    }

    let table_rows: Vec<StatusTableRow> = rows
        .iter()
        .map(|row| StatusTableRow {
            submodule: row.path.to_string(),
            commit: short(row.checked_out.as_ref()),
            reference: row.reference.clone().unwrap_or_else(|| "-".to_string()),
            state: state_label(row),
        })
        .collect();
    let mut table = Table::new(table_rows);
    table.with(Style::rounded());
    println!("{table}");

    let modified = rows.iter().filter(|r| r.is_modified()).count();
    if modified > 0 {
        println!(
            "{modified} submodule(s) differ from the recorded pointer; run `subsync` to commit them."
        );
    }
}

fn state_label(row: &SubmoduleStatus) -> String {
    if !row.is_initialized() {
        format!("{} not initialized", "■".bright_black().bold())
    } else if row.is_modified() {
        format!(
            "{} modified (recorded {})",
            "■".yellow().bold(),
            short(row.recorded.as_ref())
        )
    } else {
        format!("{} current", "■".green().bold())
    }
}
