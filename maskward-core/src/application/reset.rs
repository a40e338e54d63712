// maskward-core/src/application/reset.rs

use tracing::{info, instrument, warn};

use crate::domain::configuration::MaskingConfig;
use crate::error::MaskwardError;
use crate::ports::catalog::PolicyTagManager;
use crate::ports::warehouse::Warehouse;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResetReport {
    pub tables_scanned: usize,
    /// `table.column` for every field that lost its tags.
    pub cleared_columns: Vec<String>,
    pub deleted_taxonomies: Vec<String>,
    /// (taxonomy, error) for deletions that failed.
    pub failed_deletions: Vec<(String, String)>,
}

/// Strip every policy tag in the dataset, then drop every taxonomy at the location.
///
/// Table errors abort the stage. Taxonomy deletions are best effort.
#[instrument(skip_all, fields(dataset = %config.dataset_id, location = %config.location))]
pub async fn reset_policies(
    warehouse: &dyn Warehouse,
    catalog: &dyn PolicyTagManager,
    config: &MaskingConfig,
) -> Result<ResetReport, MaskwardError> {
    let mut report = ResetReport::default();

    let tables = warehouse
        .list_tables(&config.project_id, &config.dataset_id)
        .await?;
    for table_ref in tables {
        report.tables_scanned += 1;
        let table = warehouse.get_table(&table_ref).await?;

        let Some((schema, cleared)) = table.cleared_schema() else {
            continue;
        };
        warehouse.update_schema(&table_ref, &schema).await?;
        info!(table = %table_ref, columns = ?cleared, "Policy tags removed");
        report.cleared_columns.extend(
            cleared
                .into_iter()
                .map(|column| format!("{}.{}", table_ref.table_id, column)),
        );
    }

    for taxonomy in catalog.list_taxonomies(&config.location_parent()).await? {
        match catalog.delete_taxonomy(&taxonomy.name).await {
            Ok(()) => {
                info!(taxonomy = %taxonomy.name, "Taxonomy deleted");
                report.deleted_taxonomies.push(taxonomy.name);
            }
            Err(e) => {
                warn!(taxonomy = %taxonomy.name, error = %e, "Could not delete taxonomy");
                report.failed_deletions.push((taxonomy.name, e.to_string()));
            }
        }
    }

    Ok(report)
}
