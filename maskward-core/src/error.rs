// maskward-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaskwardError {
    // --- DOMAIN (rules, schemas) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE (ports, IO, parsing) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    #[error("Internal Error: {0}")]
    InternalError(String),

    #[error("Unsafe path traversal detected: {0}")]
    UnsafePath(String),
}

impl MaskwardError {
    /// True when a lookup failed because the resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MaskwardError::Infrastructure(InfrastructureError::NotFound(_))
        )
    }

    /// Transient failures a scheduler may retry. Nothing in this crate retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MaskwardError::Infrastructure(InfrastructureError::Api(_))
                | MaskwardError::Infrastructure(InfrastructureError::LoadJobFailed(_))
        )
    }
}

impl From<std::io::Error> for MaskwardError {
    fn from(err: std::io::Error) -> Self {
        MaskwardError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<duckdb::Error> for MaskwardError {
    fn from(err: duckdb::Error) -> Self {
        MaskwardError::Infrastructure(err.into())
    }
}
