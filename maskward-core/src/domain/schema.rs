// maskward-core/src/domain/schema.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::configuration::TableRef;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Timestamp,
    Date,
    Record,
    #[serde(untagged)]
    Other(String),
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::String => "STRING",
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::Boolean => "BOOLEAN",
            Self::Timestamp => "TIMESTAMP",
            Self::Date => "DATE",
            Self::Record => "RECORD",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldMode {
    #[default]
    Nullable,
    Required,
    Repeated,
}

/// A column definition. Immutable: changes go through the `with_*` / `without_*` copies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub field_type: FieldType,
    #[serde(default)]
    pub mode: FieldMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<SchemaField>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub policy_tags: Vec<String>,
}

impl SchemaField {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            mode: FieldMode::Nullable,
            description: None,
            fields: Vec::new(),
            policy_tags: Vec::new(),
        }
    }

    pub fn with_mode(mut self, mode: FieldMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_fields(mut self, fields: Vec<SchemaField>) -> Self {
        self.fields = fields;
        self
    }

    /// Same field carrying exactly `tag`. A previous association is replaced, not merged.
    pub fn with_policy_tag(&self, tag: &str) -> Self {
        Self {
            policy_tags: vec![tag.to_string()],
            ..self.clone()
        }
    }

    /// Same field (nested fields included) with every policy tag removed.
    pub fn without_policy_tags(&self) -> Self {
        Self {
            fields: self.fields.iter().map(Self::without_policy_tags).collect(),
            policy_tags: Vec::new(),
            ..self.clone()
        }
    }

    pub fn has_policy_tags(&self) -> bool {
        !self.policy_tags.is_empty() || self.fields.iter().any(Self::has_policy_tags)
    }
}

/// A table as returned by the warehouse: its reference and current schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub table_ref: TableRef,
    pub schema: Vec<SchemaField>,
}

impl Table {
    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.schema.iter().find(|f| f.name == name)
    }

    /// Schema with every policy tag cleared, and the names of the fields that changed.
    /// `None` when nothing carried a tag.
    pub fn cleared_schema(&self) -> Option<(Vec<SchemaField>, Vec<String>)> {
        let mut cleared = Vec::new();
        let schema = self
            .schema
            .iter()
            .map(|field| {
                if field.has_policy_tags() {
                    cleared.push(field.name.clone());
                    field.without_policy_tags()
                } else {
                    field.clone()
                }
            })
            .collect();

        if cleared.is_empty() {
            None
        } else {
            Some((schema, cleared))
        }
    }

    /// Schema with `column` bound to `tag`. `None` when the table has no such column.
    pub fn bound_schema(&self, column: &str, tag: &str) -> Option<Vec<SchemaField>> {
        self.field(column)?;
        Some(
            self.schema
                .iter()
                .map(|field| {
                    if field.name == column {
                        field.with_policy_tag(tag)
                    } else {
                        field.clone()
                    }
                })
                .collect(),
        )
    }
}
