// maskward-core/src/domain/audit.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::rule::MaskingRule;
use crate::domain::schema::{FieldType, SchemaField};

/// How audit rows reach the audit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuditMode {
    /// Scheduled variant: one insert right after each rule, no batch id.
    #[default]
    PerRule,
    /// Request variant: rows buffered, inserted once at the end, stamped with a batch id.
    Batched,
}

impl AuditMode {
    pub fn has_batch_id(&self) -> bool {
        matches!(self, AuditMode::Batched)
    }
}

/// One applied policy. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub taxonomy_name: String,
    pub policy_tag_name: String,
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
    pub column_name: String,
    pub restricted_users: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<i64>,
}

impl AuditRecord {
    pub fn for_rule(
        rule: &MaskingRule,
        taxonomy_name: &str,
        policy_tag_name: &str,
        timestamp: DateTime<Utc>,
        batch_id: Option<i64>,
    ) -> Self {
        Self {
            timestamp,
            taxonomy_name: taxonomy_name.to_string(),
            policy_tag_name: policy_tag_name.to_string(),
            project_id: rule.project_id.clone(),
            dataset_id: rule.dataset_id.clone(),
            table_id: rule.table_id.clone(),
            column_name: rule.column_name.clone(),
            restricted_users: rule.restricted_users_joined(),
            batch_id,
        }
    }
}

/// Next batch id given the largest one already recorded.
pub fn next_batch_id(current_max: Option<i64>) -> i64 {
    current_max.unwrap_or(0) + 1
}

/// Audit table columns; `batch_id` only in batched mode.
pub fn audit_table_schema(mode: AuditMode) -> Vec<SchemaField> {
    let mut schema = vec![
        SchemaField::new("timestamp", FieldType::Timestamp),
        SchemaField::new("taxonomy_name", FieldType::String),
        SchemaField::new("policy_tag_name", FieldType::String),
        SchemaField::new("project_id", FieldType::String),
        SchemaField::new("dataset_id", FieldType::String),
        SchemaField::new("table_id", FieldType::String),
        SchemaField::new("column_name", FieldType::String),
        SchemaField::new("restricted_users", FieldType::String),
    ];
    if mode.has_batch_id() {
        schema.push(SchemaField::new("batch_id", FieldType::Integer));
    }
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_schema_per_mode() {
        let per_rule = audit_table_schema(AuditMode::PerRule);
        let batched = audit_table_schema(AuditMode::Batched);

        assert_eq!(per_rule.len(), 8);
        assert_eq!(batched.len(), 9);
        assert_eq!(per_rule[0].field_type, FieldType::Timestamp);
        assert_eq!(batched[8].name, "batch_id");
        assert_eq!(batched[8].field_type, FieldType::Integer);
    }

    #[test]
    fn test_next_batch_id() {
        assert_eq!(next_batch_id(Some(7)), 8);
        assert_eq!(next_batch_id(Some(0)), 1);
        assert_eq!(next_batch_id(None), 1);
    }

    #[test]
    fn test_record_for_rule() -> anyhow::Result<()> {
        let rule = MaskingRule::from_row("p", "d", "customers", "email", Some("a@x.com , b@x.com"))?;
        let now = Utc::now();
        let record = AuditRecord::for_rule(&rule, "tax/1", "tax/1/policyTags/2", now, Some(4));

        assert_eq!(record.restricted_users, "a@x.com,b@x.com");
        assert_eq!(record.table_id, "customers");
        assert_eq!(record.batch_id, Some(4));
        assert_eq!(record.timestamp, now);
        Ok(())
    }
}
