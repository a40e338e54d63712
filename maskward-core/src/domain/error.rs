// maskward-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Column '{column}' not found in table '{table}'")]
    #[diagnostic(
        code(maskward::domain::column_not_found),
        help("The rule sheet references a column the table does not have. Disable strict_columns to skip stale rules.")
    )]
    ColumnNotFound { table: String, column: String },

    #[error("Invalid rule: {0}")]
    #[diagnostic(code(maskward::domain::invalid_rule))]
    InvalidRule(String),

    #[error("Schema mismatch: {0}")]
    #[diagnostic(
        code(maskward::domain::schema),
        help("The rule sheet must have exactly the columns project_id, dataset_id, table_id, column_name, restricted_users.")
    )]
    SchemaMismatch(String),
}
