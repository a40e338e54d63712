// maskward-core/src/infrastructure/adapters/duckdb.rs
//
// Local warehouse: one DuckDB schema per dataset. Column descriptions and policy
// tags, which DuckDB has no notion of, live in `maskward_meta.column_metadata`.
// The project part of a TableRef is not stored: one database file = one project.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use duckdb::{Config, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::domain::audit::AuditRecord;
use crate::domain::configuration::TableRef;
use crate::domain::error::DomainError;
use crate::domain::rule::MaskingRule;
use crate::domain::schema::{FieldMode, FieldType, SchemaField, Table};
use crate::error::MaskwardError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::sheet::sql_literal;
use crate::ports::warehouse::{LoadJobConfig, Warehouse, WriteDisposition};

const META_TABLE: &str = "maskward_meta.column_metadata";

pub struct DuckDBWarehouse {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDBWarehouse {
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();
        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };

        conn.execute_batch(&format!(
            "CREATE SCHEMA IF NOT EXISTS maskward_meta;
             CREATE TABLE IF NOT EXISTS {} (
                 dataset_id VARCHAR NOT NULL,
                 table_id VARCHAR NOT NULL,
                 column_name VARCHAR NOT NULL,
                 description VARCHAR,
                 policy_tags VARCHAR
             );",
            META_TABLE
        ))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, MaskwardError> {
        self.conn.lock().map_err(|_| {
            MaskwardError::Infrastructure(InfrastructureError::Io(std::io::Error::other(
                "DuckDB Mutex Poisoned",
            )))
        })
    }

    /// Raw SQL, for seeding and inspection.
    pub fn execute(&self, sql: &str) -> Result<(), MaskwardError> {
        self.lock()?.execute_batch(sql)?;
        Ok(())
    }

    pub fn query_scalar(&self, sql: &str) -> Result<i64, MaskwardError> {
        let conn = self.lock()?;
        let value: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(value)
    }

    /// Every row of an audit table, oldest first.
    pub fn audit_rows(&self, table: &TableRef) -> Result<Vec<AuditRecord>, MaskwardError> {
        let conn = self.lock()?;
        let columns = read_columns(&conn, table)?;
        let batch_expr = if columns.iter().any(|(name, _, _)| name == "batch_id") {
            "batch_id"
        } else {
            "NULL::BIGINT"
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT CAST(timestamp AS VARCHAR), taxonomy_name, policy_tag_name, project_id, dataset_id,
                    table_id, column_name, restricted_users, {}
             FROM {} ORDER BY timestamp",
            batch_expr,
            qualified(table)
        ))?;
        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    [
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, Option<String>>(5)?,
                        row.get::<_, Option<String>>(6)?,
                        row.get::<_, Option<String>>(7)?,
                    ],
                    row.get::<_, Option<i64>>(8)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(ts, cols, batch_id)| {
                let timestamp = NaiveDateTime::parse_from_str(&ts, "%Y-%m-%d %H:%M:%S%.f")
                    .map_err(|e| {
                        MaskwardError::InternalError(format!("Bad audit timestamp '{}': {}", ts, e))
                    })?
                    .and_utc();
                let [taxonomy, tag, project, dataset, table_id, column, users] =
                    cols.map(Option::unwrap_or_default);
                Ok(AuditRecord {
                    timestamp,
                    taxonomy_name: taxonomy,
                    policy_tag_name: tag,
                    project_id: project,
                    dataset_id: dataset,
                    table_id,
                    column_name: column,
                    restricted_users: users,
                    batch_id,
                })
            })
            .collect()
    }
}

#[async_trait]
impl Warehouse for DuckDBWarehouse {
    async fn list_tables(
        &self,
        project_id: &str,
        dataset_id: &str,
    ) -> Result<Vec<TableRef>, MaskwardError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT table_name FROM information_schema.tables
             WHERE table_schema = ? AND table_type = 'BASE TABLE'
             ORDER BY table_name",
        )?;
        let names = stmt
            .query_map([dataset_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(names
            .iter()
            .map(|name| TableRef::new(project_id, dataset_id, name))
            .collect())
    }

    async fn get_table(&self, table: &TableRef) -> Result<Table, MaskwardError> {
        let conn = self.lock()?;
        load_table(&conn, table)
    }

    async fn update_schema(
        &self,
        table: &TableRef,
        schema: &[SchemaField],
    ) -> Result<(), MaskwardError> {
        let mut conn = self.lock()?;
        let current = load_table(&conn, table)?;

        if current.schema.len() != schema.len() {
            return Err(DomainError::SchemaMismatch(format!(
                "{} has {} columns, update carries {}",
                table,
                current.schema.len(),
                schema.len()
            ))
            .into());
        }
        for field in schema {
            match current.field(&field.name) {
                Some(existing) if existing.field_type == field.field_type => {}
                Some(existing) => {
                    return Err(DomainError::SchemaMismatch(format!(
                        "{}.{} is {}, update says {}",
                        table, field.name, existing.field_type, field.field_type
                    ))
                    .into());
                }
                None => {
                    return Err(DomainError::SchemaMismatch(format!(
                        "{} has no column '{}'",
                        table, field.name
                    ))
                    .into());
                }
            }
        }

        let tx = conn.transaction()?;
        write_metadata(&tx, table, schema)?;
        tx.commit()?;
        debug!(table = %table, "Schema metadata updated");
        Ok(())
    }

    async fn create_table(
        &self,
        table: &TableRef,
        schema: &[SchemaField],
    ) -> Result<(), MaskwardError> {
        let mut conn = self.lock()?;
        let columns = column_definitions(schema)?;

        let tx = conn.transaction()?;
        tx.execute_batch(&format!(
            "CREATE SCHEMA IF NOT EXISTS {}; CREATE TABLE {} ({});",
            quote_ident(&table.dataset_id),
            qualified(table),
            columns
        ))?;
        write_metadata(&tx, table, schema)?;
        tx.commit()?;
        Ok(())
    }

    async fn load_csv(
        &self,
        table: &TableRef,
        source: &Path,
        job: &LoadJobConfig,
    ) -> Result<u64, MaskwardError> {
        let mut conn = self.lock()?;
        let columns = column_definitions(&job.schema)?;
        let csv_columns = job
            .schema
            .iter()
            .map(|f| Ok(format!("{}: {}", sql_literal(&f.name), sql_literal(&duckdb_type(f)?))))
            .collect::<Result<Vec<_>, MaskwardError>>()?
            .join(", ");

        let tx = conn.transaction()?;
        let create = match job.write_disposition {
            WriteDisposition::Truncate => "CREATE OR REPLACE TABLE",
            WriteDisposition::Append => "CREATE TABLE IF NOT EXISTS",
        };
        tx.execute_batch(&format!(
            "CREATE SCHEMA IF NOT EXISTS {}; {} {} ({});",
            quote_ident(&table.dataset_id),
            create,
            qualified(table),
            columns
        ))?;
        if job.write_disposition == WriteDisposition::Truncate {
            clear_metadata(&tx, table)?;
        }

        let loaded = tx
            .execute(
                &format!(
                    "INSERT INTO {} SELECT * FROM read_csv({}, header = false, skip = {}, \
                     auto_detect = false, delim = ',', quote = '\"', columns = {{{}}})",
                    qualified(table),
                    sql_literal(&source.to_string_lossy()),
                    job.skip_leading_rows,
                    csv_columns
                ),
                [],
            )
            .map_err(|e| InfrastructureError::LoadJobFailed(format!("{}: {}", table, e)))?;

        tx.commit()?;
        Ok(loaded as u64)
    }

    async fn read_rules(&self, table: &TableRef) -> Result<Vec<MaskingRule>, MaskwardError> {
        let conn = self.lock()?;
        ensure_exists(&conn, table)?;

        let mut stmt = conn.prepare(&format!(
            "SELECT project_id, dataset_id, table_id, column_name, restricted_users FROM {}",
            qualified(table)
        ))?;
        let rows = stmt
            .query_map([], |row| {
                Ok([
                    row.get::<_, Option<String>>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ])
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|[project, dataset, table_id, column, users]| {
                MaskingRule::from_row(
                    project.as_deref().unwrap_or_default(),
                    dataset.as_deref().unwrap_or_default(),
                    table_id.as_deref().unwrap_or_default(),
                    column.as_deref().unwrap_or_default(),
                    users.as_deref(),
                )
                .map_err(MaskwardError::from)
            })
            .collect()
    }

    async fn max_batch_id(&self, table: &TableRef) -> Result<i64, MaskwardError> {
        let conn = self.lock()?;
        ensure_exists(&conn, table)?;
        let max: i64 = conn.query_row(
            &format!("SELECT COALESCE(MAX(batch_id), 0) FROM {}", qualified(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(max)
    }

    async fn insert_audit_rows(
        &self,
        table: &TableRef,
        rows: &[AuditRecord],
    ) -> Result<(), MaskwardError> {
        let mut conn = self.lock()?;
        let has_batch_id = read_columns(&conn, table)?
            .iter()
            .any(|(name, _, _)| name == "batch_id");

        let mut columns = vec![
            "timestamp",
            "taxonomy_name",
            "policy_tag_name",
            "project_id",
            "dataset_id",
            "table_id",
            "column_name",
            "restricted_users",
        ];
        if has_batch_id {
            columns.push("batch_id");
        }
        let placeholders = columns
            .iter()
            .enumerate()
            .map(|(i, _)| if i == 0 { "CAST(? AS TIMESTAMP)" } else { "?" })
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            qualified(table),
            columns.join(", "),
            placeholders
        );

        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&sql)?;
            for row in rows {
                let ts = row.timestamp.format("%Y-%m-%d %H:%M:%S%.6f").to_string();
                if has_batch_id {
                    stmt.execute(duckdb::params![
                        ts,
                        row.taxonomy_name,
                        row.policy_tag_name,
                        row.project_id,
                        row.dataset_id,
                        row.table_id,
                        row.column_name,
                        row.restricted_users,
                        row.batch_id,
                    ])?;
                } else {
                    stmt.execute(duckdb::params![
                        ts,
                        row.taxonomy_name,
                        row.policy_tag_name,
                        row.project_id,
                        row.dataset_id,
                        row.table_id,
                        row.column_name,
                        row.restricted_users,
                    ])?;
                }
            }
        }
        tx.commit()?;
        debug!(table = %table, rows = rows.len(), "Audit rows inserted");
        Ok(())
    }

    fn engine_name(&self) -> &str {
        "duckdb"
    }
}

// --- HELPERS ---

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn qualified(table: &TableRef) -> String {
    format!(
        "{}.{}",
        quote_ident(&table.dataset_id),
        quote_ident(&table.table_id)
    )
}

/// (name, data_type, is_nullable) in ordinal order.
fn read_columns(
    conn: &Connection,
    table: &TableRef,
) -> Result<Vec<(String, String, String)>, MaskwardError> {
    let mut stmt = conn.prepare(
        "SELECT column_name, data_type, is_nullable FROM information_schema.columns
         WHERE table_schema = ? AND table_name = ?
         ORDER BY ordinal_position",
    )?;
    let columns = stmt
        .query_map([&table.dataset_id, &table.table_id], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    if columns.is_empty() {
        return Err(InfrastructureError::NotFound(format!("Table {}", table)).into());
    }
    Ok(columns)
}

fn ensure_exists(conn: &Connection, table: &TableRef) -> Result<(), MaskwardError> {
    read_columns(conn, table).map(|_| ())
}

fn load_table(conn: &Connection, table: &TableRef) -> Result<Table, MaskwardError> {
    let columns = read_columns(conn, table)?;

    let mut stmt = conn.prepare(&format!(
        "SELECT column_name, description, policy_tags FROM {} WHERE dataset_id = ? AND table_id = ?",
        META_TABLE
    ))?;
    let metadata: HashMap<String, (Option<String>, Option<String>)> = stmt
        .query_map([&table.dataset_id, &table.table_id], |row| {
            Ok((row.get(0)?, (row.get(1)?, row.get(2)?)))
        })?
        .collect::<Result<HashMap<_, _>, _>>()?;

    let schema = columns
        .into_iter()
        .map(|(name, data_type, is_nullable)| {
            let (field_type, repeated) = field_type_from_duckdb(&data_type);
            let mode = if repeated {
                FieldMode::Repeated
            } else if is_nullable == "NO" {
                FieldMode::Required
            } else {
                FieldMode::Nullable
            };
            let mut field = SchemaField::new(&name, field_type).with_mode(mode);
            if let Some((description, tags)) = metadata.get(&name) {
                field.description = description.clone();
                field.policy_tags = tags
                    .as_deref()
                    .map(|t| {
                        t.split(',')
                            .filter(|s| !s.is_empty())
                            .map(str::to_string)
                            .collect()
                    })
                    .unwrap_or_default();
            }
            field
        })
        .collect();

    Ok(Table {
        table_ref: table.clone(),
        schema,
    })
}

fn clear_metadata(conn: &Connection, table: &TableRef) -> Result<(), MaskwardError> {
    conn.execute(
        &format!(
            "DELETE FROM {} WHERE dataset_id = ? AND table_id = ?",
            META_TABLE
        ),
        [&table.dataset_id, &table.table_id],
    )?;
    Ok(())
}

fn write_metadata(
    conn: &Connection,
    table: &TableRef,
    schema: &[SchemaField],
) -> Result<(), MaskwardError> {
    clear_metadata(conn, table)?;
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {} VALUES (?, ?, ?, ?, ?)",
        META_TABLE
    ))?;
    for field in schema {
        if field.description.is_none() && field.policy_tags.is_empty() {
            continue;
        }
        let tags = if field.policy_tags.is_empty() {
            None
        } else {
            Some(field.policy_tags.join(","))
        };
        stmt.execute(duckdb::params![
            table.dataset_id,
            table.table_id,
            field.name,
            field.description,
            tags,
        ])?;
    }
    Ok(())
}

fn duckdb_type(field: &SchemaField) -> Result<String, MaskwardError> {
    let base = match &field.field_type {
        FieldType::String => "VARCHAR",
        FieldType::Integer => "BIGINT",
        FieldType::Float => "DOUBLE",
        FieldType::Boolean => "BOOLEAN",
        FieldType::Timestamp => "TIMESTAMP",
        FieldType::Date => "DATE",
        FieldType::Record => {
            return Err(DomainError::SchemaMismatch(format!(
                "RECORD column '{}' is not supported by the local warehouse",
                field.name
            ))
            .into());
        }
        FieldType::Other(raw) => raw.as_str(),
    };
    Ok(match field.mode {
        FieldMode::Repeated => format!("{}[]", base),
        _ => base.to_string(),
    })
}

fn column_definitions(schema: &[SchemaField]) -> Result<String, MaskwardError> {
    Ok(schema
        .iter()
        .map(|f| {
            let not_null = if f.mode == FieldMode::Required {
                " NOT NULL"
            } else {
                ""
            };
            Ok(format!("{} {}{}", quote_ident(&f.name), duckdb_type(f)?, not_null))
        })
        .collect::<Result<Vec<_>, MaskwardError>>()?
        .join(", "))
}

/// DuckDB `data_type` → field type, and whether it is a list.
fn field_type_from_duckdb(data_type: &str) -> (FieldType, bool) {
    if let Some(inner) = data_type.strip_suffix("[]") {
        return (field_type_from_duckdb(inner).0, true);
    }
    let upper = data_type.to_uppercase();
    let field_type = match upper.as_str() {
        "VARCHAR" | "TEXT" | "STRING" => FieldType::String,
        "BIGINT" | "INTEGER" | "SMALLINT" | "TINYINT" | "HUGEINT" | "UBIGINT" | "UINTEGER" => {
            FieldType::Integer
        }
        "DOUBLE" | "FLOAT" | "REAL" => FieldType::Float,
        "BOOLEAN" => FieldType::Boolean,
        "DATE" => FieldType::Date,
        t if t.starts_with("TIMESTAMP") => FieldType::Timestamp,
        t if t.starts_with("DECIMAL") => FieldType::Float,
        t if t.starts_with("STRUCT") => FieldType::Record,
        _ => FieldType::Other(data_type.to_string()),
    };
    (field_type, false)
}
