// maskward-core/src/domain/taxonomy.rs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::rule::MaskingRule;

/// Display name of the taxonomy every masking tag lives under.
pub const MASKING_TAXONOMY: &str = "Masking";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyType {
    PolicyTypeUnspecified,
    FineGrainedAccessControl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    /// Resource name: `projects/{p}/locations/{l}/taxonomies/{id}`.
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub activated_policy_types: Vec<PolicyType>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaxonomy {
    pub display_name: String,
    pub description: Option<String>,
    pub activated_policy_types: Vec<PolicyType>,
}

impl NewTaxonomy {
    /// The `Masking` taxonomy, activated for fine-grained access control.
    pub fn masking() -> Self {
        Self {
            display_name: MASKING_TAXONOMY.to_string(),
            description: None,
            activated_policy_types: vec![PolicyType::FineGrainedAccessControl],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTag {
    /// Resource name: `{taxonomy}/policyTags/{id}`.
    pub name: String,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_policy_tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPolicyTag {
    pub display_name: String,
    pub description: Option<String>,
}

impl NewPolicyTag {
    pub fn for_rule(rule: &MaskingRule) -> Self {
        Self {
            display_name: rule.policy_tag_display_name(),
            description: Some(rule.policy_tag_description()),
        }
    }
}

/// Display name → resource name for the tags of one taxonomy.
///
/// Built once per run from a single listing. When the catalog holds duplicate
/// display names, the first one listed wins.
#[derive(Debug, Clone, Default)]
pub struct PolicyTagIndex {
    by_display_name: HashMap<String, String>,
}

impl PolicyTagIndex {
    pub fn from_tags<'a>(tags: impl IntoIterator<Item = &'a PolicyTag>) -> Self {
        let mut by_display_name = HashMap::new();
        for tag in tags {
            by_display_name
                .entry(tag.display_name.clone())
                .or_insert_with(|| tag.name.clone());
        }
        Self { by_display_name }
    }

    pub fn get(&self, display_name: &str) -> Option<&str> {
        self.by_display_name.get(display_name).map(String::as_str)
    }

    pub fn insert(&mut self, tag: &PolicyTag) {
        self.by_display_name
            .insert(tag.display_name.clone(), tag.name.clone());
    }

    pub fn len(&self) -> usize {
        self.by_display_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_display_name.is_empty()
    }
}

/// First taxonomy named `display_name`, in listing order.
pub fn find_by_display_name<'a>(
    taxonomies: &'a [Taxonomy],
    display_name: &str,
) -> Option<&'a Taxonomy> {
    taxonomies.iter().find(|t| t.display_name == display_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str, display: &str) -> PolicyTag {
        PolicyTag {
            name: name.into(),
            display_name: display.into(),
            description: None,
            parent_policy_tag: None,
        }
    }

    #[test]
    fn test_index_first_listed_wins() {
        let tags = vec![
            tag("t/policyTags/1", "customers_email_mask"),
            tag("t/policyTags/2", "customers_email_mask"),
            tag("t/policyTags/3", "orders_card_mask"),
        ];
        let index = PolicyTagIndex::from_tags(&tags);

        assert_eq!(index.len(), 2);
        assert_eq!(index.get("customers_email_mask"), Some("t/policyTags/1"));
        assert_eq!(index.get("missing"), None);
    }

    #[test]
    fn test_index_insert_created_tag() {
        let mut index = PolicyTagIndex::default();
        assert!(index.is_empty());
        index.insert(&tag("t/policyTags/7", "orders_card_mask"));
        assert_eq!(index.get("orders_card_mask"), Some("t/policyTags/7"));
    }

    #[test]
    fn test_find_taxonomy_first_match() {
        let taxonomies = vec![
            Taxonomy {
                name: "x/taxonomies/1".into(),
                display_name: "PII".into(),
                description: None,
                activated_policy_types: vec![],
            },
            Taxonomy {
                name: "x/taxonomies/2".into(),
                display_name: MASKING_TAXONOMY.into(),
                description: None,
                activated_policy_types: vec![PolicyType::FineGrainedAccessControl],
            },
            Taxonomy {
                name: "x/taxonomies/3".into(),
                display_name: MASKING_TAXONOMY.into(),
                description: None,
                activated_policy_types: vec![],
            },
        ];

        let found = find_by_display_name(&taxonomies, MASKING_TAXONOMY).map(|t| t.name.as_str());
        assert_eq!(found, Some("x/taxonomies/2"));
        assert!(find_by_display_name(&taxonomies, "Other").is_none());
    }

    #[test]
    fn test_new_policy_tag_for_rule() -> anyhow::Result<()> {
        let rule = MaskingRule::from_row("p", "d", "orders", "card", Some("a"))?;
        let new_tag = NewPolicyTag::for_rule(&rule);
        assert_eq!(new_tag.display_name, "orders_card_mask");
        assert_eq!(
            new_tag.description.as_deref(),
            Some("Masks column card in orders")
        );
        Ok(())
    }
}
