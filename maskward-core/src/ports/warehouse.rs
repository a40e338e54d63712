// maskward-core/src/ports/warehouse.rs

use std::path::Path;

use crate::domain::audit::AuditRecord;
use crate::domain::configuration::TableRef;
use crate::domain::rule::MaskingRule;
use crate::domain::schema::{SchemaField, Table};
use crate::error::MaskwardError;
use async_trait::async_trait;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteDisposition {
    /// Replace every existing row.
    #[default]
    Truncate,
    Append,
}

/// Bulk CSV load settings.
#[derive(Debug, Clone)]
pub struct LoadJobConfig {
    pub schema: Vec<SchemaField>,
    pub skip_leading_rows: usize,
    pub write_disposition: WriteDisposition,
}

#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn list_tables(
        &self,
        project_id: &str,
        dataset_id: &str,
    ) -> Result<Vec<TableRef>, MaskwardError>;

    /// Current schema. A missing table is `InfrastructureError::NotFound`.
    async fn get_table(&self, table: &TableRef) -> Result<Table, MaskwardError>;

    /// Pushes the full field list back. Only column metadata (description, policy tags) may change.
    async fn update_schema(
        &self,
        table: &TableRef,
        schema: &[SchemaField],
    ) -> Result<(), MaskwardError>;

    async fn create_table(
        &self,
        table: &TableRef,
        schema: &[SchemaField],
    ) -> Result<(), MaskwardError>;

    /// Loads a CSV file into `table` and waits for completion. Returns the number of rows loaded.
    /// Either the whole load lands or the table keeps its previous content.
    async fn load_csv(
        &self,
        table: &TableRef,
        source: &Path,
        job: &LoadJobConfig,
    ) -> Result<u64, MaskwardError>;

    /// Rows of the rule table, in whatever order the engine returns them.
    async fn read_rules(&self, table: &TableRef) -> Result<Vec<MaskingRule>, MaskwardError>;

    /// `COALESCE(MAX(batch_id), 0)` over the audit table.
    async fn max_batch_id(&self, table: &TableRef) -> Result<i64, MaskwardError>;

    async fn insert_audit_rows(
        &self,
        table: &TableRef,
        rows: &[AuditRecord],
    ) -> Result<(), MaskwardError>;

    fn engine_name(&self) -> &str;
}
