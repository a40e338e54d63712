// maskward-core/src/application/loader.rs

use std::path::Path;
use tracing::{info, instrument};

use crate::domain::configuration::{MaskingConfig, TableRef};
use crate::domain::error::DomainError;
use crate::domain::rule::{RULE_COLUMNS, rule_table_schema};
use crate::error::MaskwardError;
use crate::infrastructure::sheet::inspect_sheet;
use crate::ports::warehouse::{LoadJobConfig, Warehouse, WriteDisposition};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub table: TableRef,
    pub rows_loaded: u64,
}

/// Replace the rule table with the content of the staged sheet.
#[instrument(skip(warehouse, config), fields(engine = warehouse.engine_name()))]
pub async fn load_rule_table(
    warehouse: &dyn Warehouse,
    config: &MaskingConfig,
    staged: &Path,
) -> Result<LoadReport, MaskwardError> {
    let sheet = inspect_sheet(staged)?;
    if sheet.columns.len() != RULE_COLUMNS.len() {
        return Err(DomainError::SchemaMismatch(format!(
            "sheet has {} columns ({}), expected {}",
            sheet.columns.len(),
            sheet.columns.join(", "),
            RULE_COLUMNS.len()
        ))
        .into());
    }

    let table = config.rule_table_ref();
    let job = LoadJobConfig {
        schema: rule_table_schema(),
        skip_leading_rows: 1,
        write_disposition: WriteDisposition::Truncate,
    };
    let rows_loaded = warehouse.load_csv(&table, staged, &job).await?;
    info!(table = %table, rows = rows_loaded, "Rule table loaded");

    Ok(LoadReport { table, rows_loaded })
}
