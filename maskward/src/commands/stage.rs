// maskward/src/commands/stage.rs
//
// USE CASE: Run one stage on its own (ingest, load, reset, apply).

use anyhow::Context;
use comfy_table::{Cell, Color, Table};

use maskward_core::application::{
    ReconcileReport, load_rule_table, reconcile, reset_policies, stage_ruleset,
};
use maskward_core::domain::AuditMode;

use crate::commands::Workspace;

pub async fn ingest(workspace: &Workspace) -> anyhow::Result<()> {
    println!("📥 Fetching rule sheet...");
    workspace.describe();

    let staged = stage_ruleset(workspace.services.object_store.as_ref(), &workspace.config)
        .await
        .context("Ingest failed")?;

    println!(
        "   ✅ {} rows ({} columns) staged at {:?}",
        staged.row_count,
        staged.columns.len(),
        staged.path
    );
    Ok(())
}

pub async fn load(workspace: &Workspace) -> anyhow::Result<()> {
    let staged = &workspace.config.staging_path;
    println!("📦 Loading {:?} into the rule table...", staged);

    let report = load_rule_table(
        workspace.services.warehouse.as_ref(),
        &workspace.config,
        staged,
    )
    .await
    .with_context(|| format!("Load of {:?} failed (run 'maskward ingest' first?)", staged))?;

    println!("   ✅ {} rows loaded into {}", report.rows_loaded, report.table);
    Ok(())
}

pub async fn reset(workspace: &Workspace) -> anyhow::Result<()> {
    println!("🧹 Removing existing masking policies...");

    let report = reset_policies(
        workspace.services.warehouse.as_ref(),
        workspace.services.catalog.as_ref(),
        &workspace.config,
    )
    .await
    .context("Reset failed")?;

    println!(
        "   Scanned {} tables, cleared {} columns",
        report.tables_scanned,
        report.cleared_columns.len()
    );
    for column in &report.cleared_columns {
        println!("   ➜ {}", column);
    }
    println!("   Deleted {} taxonomies", report.deleted_taxonomies.len());
    for (taxonomy, error) in &report.failed_deletions {
        println!("   ⚠️  Could not delete {}: {}", taxonomy, error);
    }
    Ok(())
}

pub async fn apply(workspace: &Workspace, mode: AuditMode) -> anyhow::Result<()> {
    println!("🔒 Applying masking rules...");

    let report = reconcile(
        workspace.services.warehouse.as_ref(),
        workspace.services.catalog.as_ref(),
        &workspace.config,
        workspace.reconcile_options(mode),
    )
    .await
    .context("Apply failed")?;

    println!("{}", reconcile_table(&report));
    Ok(())
}

pub fn reconcile_table(report: &ReconcileReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Metric", "Value"]);

    let taxonomy = if report.taxonomy_created {
        format!("{} (created)", report.taxonomy)
    } else {
        report.taxonomy.clone()
    };
    let batch = report
        .batch_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());

    table.add_row(vec![Cell::new("Taxonomy"), Cell::new(taxonomy)]);
    table.add_row(vec![Cell::new("Rules read"), Cell::new(report.rules_read)]);
    table.add_row(vec![Cell::new("Tags created"), Cell::new(report.tags_created)]);
    table.add_row(vec![Cell::new("Tags reused"), Cell::new(report.tags_reused)]);
    table.add_row(vec![Cell::new("Columns bound"), Cell::new(report.columns_bound)]);
    table.add_row(vec![Cell::new("Audit rows"), Cell::new(report.audit_rows_written)]);
    table.add_row(vec![Cell::new("Batch id"), Cell::new(batch)]);

    if report.audit_failures > 0 {
        table.add_row(vec![
            Cell::new("Audit failures"),
            Cell::new(report.audit_failures).fg(Color::Red),
        ]);
    }
    if !report.skipped_columns.is_empty() {
        table.add_row(vec![
            Cell::new("Skipped (missing column)"),
            Cell::new(report.skipped_columns.join(", ")).fg(Color::Yellow),
        ]);
    }
    table
}
