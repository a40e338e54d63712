// maskward-core/src/domain/configuration.rs

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::LazyLock;
use validator::{Validate, ValidationError};

static IDENTIFIER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_\-]*$").ok());

/// Everything a run needs to know about where things live.
/// Passed explicitly into every stage; nothing is read from globals.
#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct MaskingConfig {
    #[validate(custom(function = "validate_identifier"))]
    pub project_id: String,

    #[serde(default = "default_location")]
    #[validate(length(min = 1, message = "location cannot be empty"))]
    pub location: String,

    #[validate(length(min = 1, message = "bucket_name cannot be empty"))]
    pub bucket_name: String,

    #[serde(default = "default_sheet_path")]
    #[validate(length(min = 1, message = "sheet_path cannot be empty"))]
    pub sheet_path: String,

    #[validate(custom(function = "validate_identifier"))]
    pub dataset_id: String,

    #[serde(default = "default_rule_table")]
    #[validate(custom(function = "validate_identifier"))]
    pub rule_table: String,

    #[serde(default = "default_audit_table")]
    #[validate(custom(function = "validate_identifier"))]
    pub audit_table: String,

    /// Where the fetched sheet is staged before loading.
    #[serde(default = "default_staging_path")]
    pub staging_path: PathBuf,

    /// Fail the run when a rule names a column the table does not have.
    #[serde(default)]
    pub strict_columns: bool,

    #[serde(default)]
    pub local: LocalBackends,
}

/// Locations of the local adapters backing the ports.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LocalBackends {
    #[serde(default = "default_warehouse_path")]
    pub warehouse_path: String,

    #[serde(default = "default_catalog_path")]
    pub catalog_path: PathBuf,

    /// Directory holding one sub-directory per bucket.
    #[serde(default = "default_bucket_root")]
    pub bucket_root: PathBuf,
}

impl Default for LocalBackends {
    fn default() -> Self {
        Self {
            warehouse_path: default_warehouse_path(),
            catalog_path: default_catalog_path(),
            bucket_root: default_bucket_root(),
        }
    }
}

impl MaskingConfig {
    /// Minimal config with defaults for everything but the identifiers.
    pub fn new(project_id: &str, bucket_name: &str, dataset_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            location: default_location(),
            bucket_name: bucket_name.to_string(),
            sheet_path: default_sheet_path(),
            dataset_id: dataset_id.to_string(),
            rule_table: default_rule_table(),
            audit_table: default_audit_table(),
            staging_path: default_staging_path(),
            strict_columns: false,
            local: LocalBackends::default(),
        }
    }

    /// Bucket name without a `gs://` scheme prefix.
    pub fn bucket(&self) -> &str {
        self.bucket_name
            .strip_prefix("gs://")
            .unwrap_or(&self.bucket_name)
            .trim_end_matches('/')
    }

    /// `projects/{project}/locations/{location}`
    pub fn location_parent(&self) -> String {
        format!("projects/{}/locations/{}", self.project_id, self.location)
    }

    pub fn rule_table_ref(&self) -> TableRef {
        TableRef::new(&self.project_id, &self.dataset_id, &self.rule_table)
    }

    pub fn audit_table_ref(&self) -> TableRef {
        TableRef::new(&self.project_id, &self.dataset_id, &self.audit_table)
    }
}

/// Fully qualified warehouse table: `project.dataset.table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableRef {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

impl TableRef {
    pub fn new(project_id: &str, dataset_id: &str, table_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            dataset_id: dataset_id.to_string(),
            table_id: table_id.to_string(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}

pub fn is_identifier(value: &str) -> bool {
    IDENTIFIER
        .as_ref()
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}

fn validate_identifier(value: &str) -> Result<(), ValidationError> {
    if is_identifier(value) {
        Ok(())
    } else {
        let mut err = ValidationError::new("identifier");
        err.message = Some(format!("'{}' is not a valid identifier", value).into());
        Err(err)
    }
}

fn default_location() -> String {
    "us".to_string()
}
fn default_sheet_path() -> String {
    "masking_policies.csv".to_string()
}
fn default_rule_table() -> String {
    "masking_policies".to_string()
}
fn default_audit_table() -> String {
    "masking_audit".to_string()
}
fn default_staging_path() -> PathBuf {
    std::env::temp_dir().join("masking_policies.csv")
}
fn default_warehouse_path() -> String {
    "maskward.duckdb".to_string()
}
fn default_catalog_path() -> PathBuf {
    PathBuf::from("maskward_catalog.json")
}
fn default_bucket_root() -> PathBuf {
    PathBuf::from("buckets")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_strips_scheme() {
        let mut config = MaskingConfig::new("proj-1", "gs://rules/", "governance");
        assert_eq!(config.bucket(), "rules");
        config.bucket_name = "plain".into();
        assert_eq!(config.bucket(), "plain");
    }

    #[test]
    fn test_table_refs_and_parent() {
        let config = MaskingConfig::new("proj-1", "rules", "governance");
        assert_eq!(
            config.rule_table_ref().to_string(),
            "proj-1.governance.masking_policies"
        );
        assert_eq!(
            config.audit_table_ref().to_string(),
            "proj-1.governance.masking_audit"
        );
        assert_eq!(config.location_parent(), "projects/proj-1/locations/us");
    }

    #[test]
    fn test_validation_rejects_bad_identifiers() {
        let config = MaskingConfig::new("proj-1", "rules", "governance");
        assert!(config.validate().is_ok());

        let bad = MaskingConfig::new("proj-1", "rules", "gov\"; DROP");
        assert!(bad.validate().is_err());

        let mut empty_location = MaskingConfig::new("proj-1", "rules", "governance");
        empty_location.location = String::new();
        assert!(empty_location.validate().is_err());
    }
}
