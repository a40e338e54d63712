// maskward-core/src/application/ingest.rs

use std::io::Write;
use std::path::PathBuf;
use tracing::{info, instrument};

use crate::domain::configuration::MaskingConfig;
use crate::error::MaskwardError;
use crate::infrastructure::sheet::normalize_sheet;
use crate::ports::object_store::ObjectStore;

/// The rule sheet as it sits on local disk, ready for the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedSheet {
    pub path: PathBuf,
    pub columns: Vec<String>,
    pub row_count: u64,
}

/// Fetch the CSV ruleset and stage a normalized copy at `config.staging_path`.
///
/// Columns are not checked here; the loader does that against the rule table.
#[instrument(skip_all, fields(bucket = %config.bucket(), object = %config.sheet_path))]
pub async fn stage_ruleset(
    store: &dyn ObjectStore,
    config: &MaskingConfig,
) -> Result<StagedSheet, MaskwardError> {
    let text = store.fetch_text(config.bucket(), &config.sheet_path).await?;

    let mut raw = tempfile::Builder::new().suffix(".csv").tempfile()?;
    raw.write_all(text.as_bytes())?;
    raw.flush()?;

    let summary = normalize_sheet(raw.path(), &config.staging_path)?;
    info!(
        rows = summary.row_count,
        path = ?config.staging_path,
        "Ruleset read from object store"
    );

    Ok(StagedSheet {
        path: config.staging_path.clone(),
        columns: summary.columns,
        row_count: summary.row_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::FakeObjectStore;
    use anyhow::Result;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_stage_overwrites_previous_copy() -> Result<()> {
        let dir = tempdir()?;
        let mut config = MaskingConfig::new("p1", "gs://rls_files", "sales");
        config.staging_path = dir.path().join("masking_policies.csv");
        fs::write(&config.staging_path, "old,content\n")?;

        let store = FakeObjectStore::with_object(
            "rls_files",
            "masking_policies.csv",
            "project_id,dataset_id,table_id,column_name,restricted_users\n\
             p1,sales,customers,email,a@x.com\n",
        );

        let staged = stage_ruleset(&store, &config).await?;

        assert_eq!(staged.row_count, 1);
        assert_eq!(staged.columns.len(), 5);
        let content = fs::read_to_string(&config.staging_path)?;
        assert!(content.contains("customers,email,a@x.com"));
        assert!(!content.contains("old,content"));
        assert_eq!(store.requests(), vec!["rls_files/masking_policies.csv"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_object_fails_before_staging() -> Result<()> {
        let dir = tempdir()?;
        let mut config = MaskingConfig::new("p1", "rls_files", "sales");
        config.staging_path = dir.path().join("masking_policies.csv");

        let store = FakeObjectStore::default();
        let result = stage_ruleset(&store, &config).await;

        assert!(result.is_err_and(|e| e.is_not_found()));
        assert!(!config.staging_path.exists());
        Ok(())
    }
}
