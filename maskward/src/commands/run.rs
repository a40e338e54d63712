// maskward/src/commands/run.rs
//
// USE CASE: Scheduled run of the four stages.

use anyhow::Context;
use comfy_table::{Cell, Table};

use maskward_core::application::{Stage, WorkflowReport, run_workflow};
use maskward_core::domain::AuditMode;

use crate::commands::Workspace;
use crate::commands::stage::reconcile_table;

pub async fn execute(workspace: &Workspace) -> anyhow::Result<()> {
    println!("🚀 Starting masking run...");
    workspace.describe();

    let report = run_workflow(
        &workspace.services,
        &workspace.config,
        workspace.reconcile_options(AuditMode::PerRule),
    )
    .await
    .context("Masking run failed")?;

    println!("{}", stage_table(&report));
    println!("{}", reconcile_table(&report.reconcile));

    let total: std::time::Duration = report.timings.iter().map(|(_, d)| *d).sum();
    println!("\n✨ SUCCESS! Masking run finished in {:.2?}", total);
    Ok(())
}

fn stage_table(report: &WorkflowReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Stage", "Result", "Elapsed"]);
    for (stage, elapsed) in &report.timings {
        let result = match stage {
            Stage::Ingest => format!("{} rows staged", report.staged.row_count),
            Stage::Load => format!("{} rows into {}", report.load.rows_loaded, report.load.table),
            Stage::Reset => format!(
                "{} columns cleared, {} taxonomies deleted",
                report.reset.cleared_columns.len(),
                report.reset.deleted_taxonomies.len()
            ),
            Stage::Apply => format!("{} rules applied", report.reconcile.rules_read),
        };
        table.add_row(vec![
            Cell::new(stage),
            Cell::new(result),
            Cell::new(format!("{:.2?}", elapsed)),
        ]);
    }
    table
}
