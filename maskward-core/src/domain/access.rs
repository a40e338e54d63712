// maskward-core/src/domain/access.rs

use serde::{Deserialize, Serialize};

/// IAM member string for a user id or email.
pub fn user_principal(id: &str) -> String {
    format!("user:{}", id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub expression: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// `{role, members}` pair on a resource, optionally conditional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    pub role: String,
    pub members: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl Binding {
    pub fn new(role: &str, members: &[&str]) -> Self {
        Self {
            role: role.to_string(),
            members: members.iter().map(|m| m.to_string()).collect(),
            condition: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLogConfig {
    pub log_type: String,
    #[serde(default)]
    pub exempted_members: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditConfig {
    pub service: String,
    #[serde(default)]
    pub audit_log_configs: Vec<AuditLogConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct IamPolicy {
    #[serde(default)]
    pub version: i32,
    #[serde(default)]
    pub bindings: Vec<Binding>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub audit_configs: Vec<AuditConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

impl IamPolicy {
    /// Replacement policy with every `restricted` member removed from every binding.
    ///
    /// Bindings left without members are dropped. Roles, conditions, member order and
    /// audit configs survive; the etag does not, so the write is an unconditional overwrite.
    pub fn without_members(&self, restricted: &[String]) -> IamPolicy {
        let bindings = self
            .bindings
            .iter()
            .filter_map(|binding| {
                let members: Vec<String> = binding
                    .members
                    .iter()
                    .filter(|m| !restricted.contains(m))
                    .cloned()
                    .collect();
                if members.is_empty() {
                    None
                } else {
                    Some(Binding {
                        role: binding.role.clone(),
                        members,
                        condition: binding.condition.clone(),
                    })
                }
            })
            .collect();

        IamPolicy {
            version: self.version,
            bindings,
            audit_configs: self.audit_configs.clone(),
            etag: None,
        }
    }

    pub fn members(&self) -> impl Iterator<Item = &String> {
        self.bindings.iter().flat_map(|b| b.members.iter())
    }
}
