// maskward-core/src/infrastructure/config/project.rs

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::configuration::MaskingConfig;
use crate::infrastructure::error::InfrastructureError;

const CONFIG_CANDIDATES: [&str; 2] = ["maskward.yaml", "maskward.yml"];

/// Load, override from the environment, then validate.
///
/// `explicit` wins when given; otherwise `maskward.yaml` / `maskward.yml` is looked up in `project_dir`.
#[instrument(skip(explicit, project_dir))]
pub fn load_masking_config(
    explicit: Option<&Path>,
    project_dir: &Path,
) -> Result<MaskingConfig, InfrastructureError> {
    let config_path = match explicit {
        Some(path) if path.exists() => path.to_path_buf(),
        Some(path) => {
            return Err(InfrastructureError::ConfigNotFound(
                path.display().to_string(),
            ));
        }
        None => find_main_config(project_dir)?,
    };
    info!(path = ?config_path, "Loading masking configuration");

    let content = fs::read_to_string(&config_path)?;
    let mut config: MaskingConfig = serde_yaml::from_str(&content)?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        InfrastructureError::ConfigError(format!("{}: {}", config_path.display(), e))
    })?;

    Ok(config)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    for filename in CONFIG_CANDIDATES {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, CONFIG_CANDIDATES
    )))
}

fn apply_env_overrides(config: &mut MaskingConfig) {
    apply_overrides(config, |key| std::env::var(key).ok());
}

/// Layer `MASKWARD_*` variables on top of the file values.
fn apply_overrides(config: &mut MaskingConfig, lookup: impl Fn(&str) -> Option<String>) {
    let string_fields: [(&str, &mut String); 5] = [
        ("MASKWARD_PROJECT_ID", &mut config.project_id),
        ("MASKWARD_LOCATION", &mut config.location),
        ("MASKWARD_BUCKET", &mut config.bucket_name),
        ("MASKWARD_SHEET_PATH", &mut config.sheet_path),
        ("MASKWARD_DATASET", &mut config.dataset_id),
    ];
    for (key, field) in string_fields {
        if let Some(val) = lookup(key) {
            info!(key, old = ?field, new = ?val, "Overriding configuration via ENV");
            *field = val;
        }
    }

    if let Some(val) = lookup("MASKWARD_STRICT_COLUMNS") {
        config.strict_columns = matches!(val.to_lowercase().as_str(), "1" | "true" | "yes");
        info!(strict_columns = config.strict_columns, "Overriding strict mode via ENV");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::collections::HashMap;
    use tempfile::tempdir;

    const MINIMAL: &str = r#"
project_id: test-1-426619
bucket_name: gs://rls_files
dataset_id: test_rls
"#;

    #[test]
    fn test_load_with_defaults() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("maskward.yaml"), MINIMAL)?;

        let config = load_masking_config(None, dir.path())?;

        assert_eq!(config.project_id, "test-1-426619");
        assert_eq!(config.location, "us");
        assert_eq!(config.bucket(), "rls_files");
        assert_eq!(config.sheet_path, "masking_policies.csv");
        assert_eq!(config.rule_table, "masking_policies");
        assert_eq!(config.audit_table, "masking_audit");
        assert!(!config.strict_columns);
        assert_eq!(config.local.warehouse_path, "maskward.duckdb");
        Ok(())
    }

    #[test]
    fn test_load_explicit_path_with_local_section() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("custom.yml");
        fs::write(
            &path,
            r#"
project_id: p1
location: eu
bucket_name: rules
sheet_path: data/masking_policies.csv
dataset_id: sheets
rule_table: masking_rules
audit_table: masking_auditoria
strict_columns: true
local:
  warehouse_path: ":memory:"
  bucket_root: /srv/buckets
"#,
        )?;

        let config = load_masking_config(Some(&path), Path::new("/nonexistent"))?;

        assert_eq!(config.location, "eu");
        assert_eq!(config.rule_table, "masking_rules");
        assert!(config.strict_columns);
        assert_eq!(config.local.warehouse_path, ":memory:");
        assert_eq!(config.local.bucket_root, PathBuf::from("/srv/buckets"));
        assert_eq!(
            config.local.catalog_path,
            PathBuf::from("maskward_catalog.json")
        );
        Ok(())
    }

    #[test]
    fn test_missing_config() -> Result<()> {
        let dir = tempdir()?;
        let result = load_masking_config(None, dir.path());
        assert!(matches!(result, Err(InfrastructureError::ConfigNotFound(_))));

        let result = load_masking_config(Some(Path::new("/no/such/file.yaml")), dir.path());
        assert!(matches!(result, Err(InfrastructureError::ConfigNotFound(_))));
        Ok(())
    }

    #[test]
    fn test_invalid_identifier_rejected() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("maskward.yaml"),
            "project_id: p\nbucket_name: b\ndataset_id: \"bad name\"\n",
        )?;

        let result = load_masking_config(None, dir.path());
        assert!(matches!(result, Err(InfrastructureError::ConfigError(_))));
        Ok(())
    }

    #[test]
    fn test_overrides_layer_on_file_values() {
        let mut config = MaskingConfig::new("p", "b", "d");
        let env: HashMap<&str, &str> = [
            ("MASKWARD_DATASET", "other_ds"),
            ("MASKWARD_LOCATION", "europe-west1"),
            ("MASKWARD_STRICT_COLUMNS", "TRUE"),
        ]
        .into_iter()
        .collect();

        apply_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.dataset_id, "other_ds");
        assert_eq!(config.location, "europe-west1");
        assert_eq!(config.project_id, "p");
        assert!(config.strict_columns);
    }
}
