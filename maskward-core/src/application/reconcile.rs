// maskward-core/src/application/reconcile.rs

use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};

use crate::domain::audit::{AuditMode, AuditRecord, audit_table_schema, next_batch_id};
use crate::domain::configuration::{MaskingConfig, TableRef};
use crate::domain::error::DomainError;
use crate::domain::rule::MaskingRule;
use crate::domain::taxonomy::{
    MASKING_TAXONOMY, NewPolicyTag, NewTaxonomy, PolicyTagIndex, Taxonomy, find_by_display_name,
};
use crate::error::MaskwardError;
use crate::ports::catalog::PolicyTagManager;
use crate::ports::warehouse::Warehouse;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileOptions {
    pub mode: AuditMode,
    /// Fail on rules naming a column the table lacks, instead of skipping them.
    pub strict_columns: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub taxonomy: String,
    pub taxonomy_created: bool,
    pub rules_read: usize,
    pub tags_created: usize,
    pub tags_reused: usize,
    pub columns_bound: usize,
    /// `table.column` for rules whose column does not exist.
    pub skipped_columns: Vec<String>,
    pub audit_rows_written: usize,
    pub audit_failures: usize,
    pub batch_id: Option<i64>,
}

/// Apply the rule table: one tag per rule, bound to its column, with restricted users removed
/// from the tag's bindings, and one audit row per rule.
///
/// Nothing is rolled back when a rule fails halfway.
#[instrument(skip_all, fields(mode = ?options.mode, strict = options.strict_columns))]
pub async fn reconcile(
    warehouse: &dyn Warehouse,
    catalog: &dyn PolicyTagManager,
    config: &MaskingConfig,
    options: ReconcileOptions,
) -> Result<ReconcileReport, MaskwardError> {
    let mut report = ReconcileReport::default();

    let audit_table = config.audit_table_ref();
    ensure_audit_table(warehouse, &audit_table, options.mode).await?;
    let batch_id = if options.mode.has_batch_id() {
        Some(resolve_batch_id(warehouse, &audit_table).await)
    } else {
        None
    };
    report.batch_id = batch_id;

    let rules = warehouse.read_rules(&config.rule_table_ref()).await?;
    report.rules_read = rules.len();
    info!(rules = rules.len(), "Masking rules read");

    let (taxonomy, created) = ensure_taxonomy(catalog, &config.location_parent()).await?;
    report.taxonomy = taxonomy.name.clone();
    report.taxonomy_created = created;

    let mut tags = PolicyTagIndex::from_tags(&catalog.list_policy_tags(&taxonomy.name).await?);
    debug!(existing = tags.len(), "Policy tags preloaded");

    let mut pending = Vec::new();
    for rule in &rules {
        let tag = match tags.get(&rule.policy_tag_display_name()) {
            Some(existing) => {
                report.tags_reused += 1;
                existing.to_string()
            }
            None => {
                let created = catalog
                    .create_policy_tag(&taxonomy.name, NewPolicyTag::for_rule(rule))
                    .await?;
                info!(tag = %created.name, display_name = %created.display_name, "Policy tag created");
                tags.insert(&created);
                report.tags_created += 1;
                created.name
            }
        };

        if bind_column(warehouse, rule, &tag, options.strict_columns).await? {
            report.columns_bound += 1;
        } else {
            report
                .skipped_columns
                .push(format!("{}.{}", rule.table_id, rule.column_name));
        }

        restrict_access(catalog, &tag, rule).await?;

        let record = AuditRecord::for_rule(rule, &taxonomy.name, &tag, Utc::now(), batch_id);
        match options.mode {
            AuditMode::PerRule => match warehouse.insert_audit_rows(&audit_table, &[record]).await {
                Ok(()) => report.audit_rows_written += 1,
                Err(e) => {
                    error!(table = %audit_table, error = %e, "Audit insert failed");
                    report.audit_failures += 1;
                }
            },
            AuditMode::Batched => pending.push(record),
        }
    }

    if !pending.is_empty() {
        match warehouse.insert_audit_rows(&audit_table, &pending).await {
            Ok(()) => report.audit_rows_written += pending.len(),
            Err(e) => {
                error!(table = %audit_table, rows = pending.len(), error = %e, "Audit insert failed");
                report.audit_failures += pending.len();
            }
        }
    }

    info!(
        tags_created = report.tags_created,
        tags_reused = report.tags_reused,
        columns_bound = report.columns_bound,
        audit_rows = report.audit_rows_written,
        "Masking applied"
    );
    Ok(report)
}

async fn ensure_audit_table(
    warehouse: &dyn Warehouse,
    table: &TableRef,
    mode: AuditMode,
) -> Result<(), MaskwardError> {
    match warehouse.get_table(table).await {
        Ok(_) => Ok(()),
        Err(e) if e.is_not_found() => {
            warehouse
                .create_table(table, &audit_table_schema(mode))
                .await?;
            info!(table = %table, "Audit table created");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Max recorded batch id + 1. Any failure reading it starts over at 1.
async fn resolve_batch_id(warehouse: &dyn Warehouse, table: &TableRef) -> i64 {
    match warehouse.max_batch_id(table).await {
        Ok(max) => next_batch_id(Some(max)),
        Err(e) => {
            warn!(table = %table, error = %e, "Could not read last batch id, starting at 1");
            next_batch_id(None)
        }
    }
}

async fn ensure_taxonomy(
    catalog: &dyn PolicyTagManager,
    parent: &str,
) -> Result<(Taxonomy, bool), MaskwardError> {
    let taxonomies = catalog.list_taxonomies(parent).await?;
    if let Some(found) = find_by_display_name(&taxonomies, MASKING_TAXONOMY) {
        debug!(taxonomy = %found.name, "Reusing taxonomy");
        return Ok((found.clone(), false));
    }

    let created = catalog
        .create_taxonomy(parent, NewTaxonomy::masking())
        .await?;
    info!(taxonomy = %created.name, "Taxonomy created");
    Ok((created, true))
}

/// Returns false when the column is missing and the rule was skipped.
async fn bind_column(
    warehouse: &dyn Warehouse,
    rule: &MaskingRule,
    tag: &str,
    strict: bool,
) -> Result<bool, MaskwardError> {
    let table_ref = rule.table_ref();
    let table = warehouse.get_table(&table_ref).await?;

    match table.bound_schema(&rule.column_name, tag) {
        Some(schema) => {
            warehouse.update_schema(&table_ref, &schema).await?;
            debug!(table = %table_ref, column = %rule.column_name, tag, "Column bound");
            Ok(true)
        }
        None if strict => Err(DomainError::ColumnNotFound {
            table: table_ref.to_string(),
            column: rule.column_name.clone(),
        }
        .into()),
        None => {
            warn!(table = %table_ref, column = %rule.column_name, "Column not found, rule skipped");
            Ok(false)
        }
    }
}

async fn restrict_access(
    catalog: &dyn PolicyTagManager,
    tag: &str,
    rule: &MaskingRule,
) -> Result<(), MaskwardError> {
    let current = catalog.get_iam_policy(tag).await?;
    let filtered = current.without_members(&rule.restricted_principals());
    catalog.set_iam_policy(tag, filtered).await?;
    Ok(())
}
