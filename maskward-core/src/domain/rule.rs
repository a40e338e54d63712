// maskward-core/src/domain/rule.rs

use serde::{Deserialize, Serialize};

use crate::domain::access::user_principal;
use crate::domain::configuration::TableRef;
use crate::domain::error::DomainError;
use crate::domain::schema::{FieldType, SchemaField};

/// Column order of the rule sheet and of the rule table.
pub const RULE_COLUMNS: [&str; 5] = [
    "project_id",
    "dataset_id",
    "table_id",
    "column_name",
    "restricted_users",
];

/// One row of the rule table: mask `column_name` and keep `restricted_users` out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskingRule {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
    pub column_name: String,
    pub restricted_users: Vec<String>,
}

impl MaskingRule {
    pub fn from_row(
        project_id: &str,
        dataset_id: &str,
        table_id: &str,
        column_name: &str,
        restricted_users: Option<&str>,
    ) -> Result<Self, DomainError> {
        for (label, value) in [
            ("project_id", project_id),
            ("dataset_id", dataset_id),
            ("table_id", table_id),
            ("column_name", column_name),
        ] {
            if value.trim().is_empty() {
                return Err(DomainError::InvalidRule(format!(
                    "empty {} in rule for {}.{}.{}",
                    label, project_id, dataset_id, table_id
                )));
            }
        }

        Ok(Self {
            project_id: project_id.to_string(),
            dataset_id: dataset_id.to_string(),
            table_id: table_id.to_string(),
            column_name: column_name.to_string(),
            restricted_users: parse_restricted_users(restricted_users.unwrap_or_default()),
        })
    }

    pub fn table_ref(&self) -> TableRef {
        TableRef::new(&self.project_id, &self.dataset_id, &self.table_id)
    }

    /// `{table_id}_{column_name}_mask`, the identity of the rule's tag inside the taxonomy.
    pub fn policy_tag_display_name(&self) -> String {
        format!("{}_{}_mask", self.table_id, self.column_name)
    }

    pub fn policy_tag_description(&self) -> String {
        format!("Masks column {} in {}", self.column_name, self.table_id)
    }

    /// Restricted users as IAM members (`user:<id>`).
    pub fn restricted_principals(&self) -> Vec<String> {
        self.restricted_users
            .iter()
            .map(|u| user_principal(u))
            .collect()
    }

    pub fn restricted_users_joined(&self) -> String {
        self.restricted_users.join(",")
    }
}

/// Split on commas and trim. Blank entries are dropped.
pub fn parse_restricted_users(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect()
}

/// Fixed schema of the rule table: five STRING columns.
pub fn rule_table_schema() -> Vec<SchemaField> {
    RULE_COLUMNS
        .iter()
        .map(|name| SchemaField::new(name, FieldType::String))
        .collect()
}
