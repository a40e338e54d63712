// maskward-core/src/application/testing.rs
//
// In-memory ports recording every call, shared by the stage tests.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::domain::audit::AuditRecord;
use crate::domain::configuration::TableRef;
use crate::domain::rule::MaskingRule;
use crate::domain::schema::{SchemaField, Table};
use crate::error::MaskwardError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::object_store::ObjectStore;
use crate::ports::warehouse::{LoadJobConfig, Warehouse};

#[derive(Clone, Default)]
pub struct FakeObjectStore {
    objects: HashMap<String, String>,
    pub requests: Arc<Mutex<Vec<String>>>,
}

impl FakeObjectStore {
    pub fn with_object(bucket: &str, object: &str, text: &str) -> Self {
        let mut store = Self::default();
        store
            .objects
            .insert(format!("{}/{}", bucket, object), text.to_string());
        store
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for FakeObjectStore {
    async fn fetch_text(&self, bucket: &str, object: &str) -> Result<String, MaskwardError> {
        let key = format!("{}/{}", bucket, object);
        self.requests.lock().unwrap().push(key.clone());
        self.objects
            .get(&key)
            .cloned()
            .ok_or_else(|| InfrastructureError::NotFound(key).into())
    }
}

#[derive(Clone, Default)]
pub struct FakeWarehouse {
    pub tables: Arc<Mutex<BTreeMap<TableRef, Table>>>,
    pub rules: Arc<Mutex<Vec<MaskingRule>>>,
    pub audit_rows: Arc<Mutex<Vec<AuditRecord>>>,
    pub audit_inserts: Arc<Mutex<usize>>,
    pub load_jobs: Arc<Mutex<Vec<LoadJobConfig>>>,
    pub schema_updates: Arc<Mutex<Vec<TableRef>>>,
    pub fail_audit_inserts: bool,
    pub fail_batch_query: bool,
}

impl FakeWarehouse {
    pub fn with_table(self, table_ref: TableRef, schema: Vec<SchemaField>) -> Self {
        self.tables
            .lock()
            .unwrap()
            .insert(table_ref.clone(), Table { table_ref, schema });
        self
    }

    pub fn with_rules(self, rules: Vec<MaskingRule>) -> Self {
        *self.rules.lock().unwrap() = rules;
        self
    }

    pub fn table(&self, table_ref: &TableRef) -> Option<Table> {
        self.tables.lock().unwrap().get(table_ref).cloned()
    }

    pub fn audit_rows(&self) -> Vec<AuditRecord> {
        self.audit_rows.lock().unwrap().clone()
    }

    pub fn audit_inserts(&self) -> usize {
        *self.audit_inserts.lock().unwrap()
    }

    pub fn load_jobs(&self) -> Vec<LoadJobConfig> {
        self.load_jobs.lock().unwrap().clone()
    }

    pub fn schema_updates(&self) -> Vec<TableRef> {
        self.schema_updates.lock().unwrap().clone()
    }

    fn not_found(table: &TableRef) -> MaskwardError {
        InfrastructureError::NotFound(format!("Table {}", table)).into()
    }
}

#[async_trait]
impl Warehouse for FakeWarehouse {
    async fn list_tables(
        &self,
        project_id: &str,
        dataset_id: &str,
    ) -> Result<Vec<TableRef>, MaskwardError> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .keys()
            .filter(|t| t.project_id == project_id && t.dataset_id == dataset_id)
            .cloned()
            .collect())
    }

    async fn get_table(&self, table: &TableRef) -> Result<Table, MaskwardError> {
        self.table(table).ok_or_else(|| Self::not_found(table))
    }

    async fn update_schema(
        &self,
        table: &TableRef,
        schema: &[SchemaField],
    ) -> Result<(), MaskwardError> {
        let mut tables = self.tables.lock().unwrap();
        let existing = tables.get_mut(table).ok_or_else(|| Self::not_found(table))?;
        existing.schema = schema.to_vec();
        self.schema_updates.lock().unwrap().push(table.clone());
        Ok(())
    }

    async fn create_table(
        &self,
        table: &TableRef,
        schema: &[SchemaField],
    ) -> Result<(), MaskwardError> {
        self.tables.lock().unwrap().insert(
            table.clone(),
            Table {
                table_ref: table.clone(),
                schema: schema.to_vec(),
            },
        );
        Ok(())
    }

    async fn load_csv(
        &self,
        _table: &TableRef,
        source: &Path,
        job: &LoadJobConfig,
    ) -> Result<u64, MaskwardError> {
        let content = std::fs::read_to_string(source)?;
        self.load_jobs.lock().unwrap().push(job.clone());
        Ok(content.lines().skip(job.skip_leading_rows).count() as u64)
    }

    async fn read_rules(&self, _table: &TableRef) -> Result<Vec<MaskingRule>, MaskwardError> {
        Ok(self.rules.lock().unwrap().clone())
    }

    async fn max_batch_id(&self, table: &TableRef) -> Result<i64, MaskwardError> {
        if self.fail_batch_query {
            return Err(InfrastructureError::Api("query failed".into()).into());
        }
        if self.table(table).is_none() {
            return Err(Self::not_found(table));
        }
        Ok(self
            .audit_rows
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.batch_id)
            .max()
            .unwrap_or(0))
    }

    async fn insert_audit_rows(
        &self,
        table: &TableRef,
        rows: &[AuditRecord],
    ) -> Result<(), MaskwardError> {
        *self.audit_inserts.lock().unwrap() += 1;
        if self.fail_audit_inserts {
            return Err(InfrastructureError::Api("insert rejected".into()).into());
        }
        if self.table(table).is_none() {
            return Err(Self::not_found(table));
        }
        self.audit_rows.lock().unwrap().extend_from_slice(rows);
        Ok(())
    }

    fn engine_name(&self) -> &str {
        "fake"
    }
}
