// maskward-core/src/infrastructure/sheet.rs
//
// CSV parsing for the rule sheet, done by an in-memory DuckDB (read_csv sniffs
// delimiter and quoting for us).

use duckdb::Connection;
use std::path::Path;
use tracing::debug;

use crate::infrastructure::error::InfrastructureError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetSummary {
    pub columns: Vec<String>,
    pub row_count: u64,
}

/// Header columns and data row count of a CSV file.
pub fn inspect_sheet(path: &Path) -> Result<SheetSummary, InfrastructureError> {
    let conn = Connection::open_in_memory()?;
    let source = read_csv_expr(path);

    let mut stmt = conn.prepare(&format!("DESCRIBE SELECT * FROM {}", source))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;

    let row_count: i64 =
        conn.query_row(&format!("SELECT count(*) FROM {}", source), [], |row| {
            row.get(0)
        })?;

    debug!(path = ?path, columns = columns.len(), row_count, "Sheet inspected");
    Ok(SheetSummary {
        columns,
        row_count: row_count.max(0) as u64,
    })
}

/// Parse `source` and write a normalized comma-separated copy (header kept) to `dest`,
/// replacing any previous file atomically.
pub fn normalize_sheet(source: &Path, dest: &Path) -> Result<SheetSummary, InfrastructureError> {
    let summary = inspect_sheet(source)?;

    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;
    let staged = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile_in(parent)?;

    let conn = Connection::open_in_memory()?;
    conn.execute_batch(&format!(
        "COPY (SELECT * FROM {}) TO {} (FORMAT csv, HEADER true, DELIMITER ',')",
        read_csv_expr(source),
        sql_literal(&staged.path().to_string_lossy())
    ))?;

    staged
        .persist(dest)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(summary)
}

fn read_csv_expr(path: &Path) -> String {
    format!(
        "read_csv({}, header = true, all_varchar = true)",
        sql_literal(&path.to_string_lossy())
    )
}

/// Single-quoted SQL string literal.
pub(crate) fn sql_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    const SHEET: &str = "project_id,dataset_id,table_id,column_name,restricted_users\n\
p1,sales,customers,email,\"a@x.com, b@x.com\"\n\
p1,sales,orders,card,c@x.com\n";

    #[test]
    fn test_inspect_counts_rows_and_columns() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("sheet.csv");
        fs::write(&path, SHEET)?;

        let summary = inspect_sheet(&path)?;

        assert_eq!(summary.row_count, 2);
        assert_eq!(
            summary.columns,
            vec![
                "project_id",
                "dataset_id",
                "table_id",
                "column_name",
                "restricted_users"
            ]
        );
        Ok(())
    }

    #[test]
    fn test_normalize_overwrites_destination() -> Result<()> {
        let dir = tempdir()?;
        let source = dir.path().join("in.csv");
        let dest = dir.path().join("stage/out.csv");
        fs::write(&source, SHEET)?;
        fs::create_dir_all(dir.path().join("stage"))?;
        fs::write(&dest, "stale")?;

        let summary = normalize_sheet(&source, &dest)?;
        let staged = fs::read_to_string(&dest)?;

        assert_eq!(summary.row_count, 2);
        assert!(staged.starts_with("project_id,dataset_id,table_id,column_name,restricted_users"));
        assert!(staged.contains("\"a@x.com, b@x.com\""));
        assert!(!staged.contains("stale"));
        Ok(())
    }

    #[test]
    fn test_sql_literal_escapes_quotes() {
        assert_eq!(sql_literal("o'brien"), "'o''brien'");
    }
}
