// maskward-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("DuckDB Engine Error: {0}")]
    #[diagnostic(
        code(maskward::infra::database::duckdb),
        help("An error occurred inside the local warehouse engine.")
    )]
    DuckDB(#[from] duckdb::Error),
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- DATABASE (Abstracted) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    // --- REMOTE RESOURCES ---
    #[error("Not found: {0}")]
    #[diagnostic(code(maskward::infra::not_found))]
    NotFound(String),

    #[error("Permission denied: {0}")]
    #[diagnostic(
        code(maskward::infra::permission_denied),
        help("Check the credentials used by the run.")
    )]
    PermissionDenied(String),

    #[error("Load job failed: {0}")]
    #[diagnostic(code(maskward::infra::load_job))]
    LoadJobFailed(String),

    #[error("API Error: {0}")]
    #[diagnostic(code(maskward::infra::api))]
    Api(String),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(maskward::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / SERIALIZATION ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(maskward::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON Error: {0}")]
    #[diagnostic(code(maskward::infra::json))]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(maskward::infra::config))]
    ConfigError(String),

    #[error("Configuration not found at '{0}'")]
    #[diagnostic(code(maskward::infra::config_missing))]
    ConfigNotFound(String),
}

// Shortcut for `?` on duckdb calls
impl From<duckdb::Error> for InfrastructureError {
    fn from(err: duckdb::Error) -> Self {
        InfrastructureError::Database(DatabaseError::DuckDB(err))
    }
}
