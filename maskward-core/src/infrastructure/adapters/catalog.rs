// maskward-core/src/infrastructure/adapters/catalog.rs
//
// Policy-tag catalog kept in a single JSON document. Every mutation rewrites the
// whole file through `atomic_write`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::domain::access::{Binding, IamPolicy};
use crate::domain::taxonomy::{NewPolicyTag, NewTaxonomy, PolicyTag, Taxonomy};
use crate::error::MaskwardError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write;
use crate::ports::catalog::PolicyTagManager;

#[derive(Debug, Default, Serialize, Deserialize)]
struct CatalogState {
    #[serde(default)]
    next_id: u64,
    /// Listing order is creation order.
    #[serde(default)]
    taxonomies: Vec<Taxonomy>,
    #[serde(default)]
    policy_tags: Vec<PolicyTag>,
    /// Resource name → policy. Absent means empty.
    #[serde(default)]
    iam_policies: BTreeMap<String, IamPolicy>,
}

impl CatalogState {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn has_taxonomy(&self, name: &str) -> bool {
        self.taxonomies.iter().any(|t| t.name == name)
    }

    fn has_resource(&self, name: &str) -> bool {
        self.has_taxonomy(name) || self.policy_tags.iter().any(|t| t.name == name)
    }
}

pub struct LocalPolicyTagManager {
    path: Option<PathBuf>,
    state: Mutex<CatalogState>,
}

impl LocalPolicyTagManager {
    /// Catalog backed by `path`; an absent file starts empty.
    pub fn open(path: &Path) -> Result<Self, InfrastructureError> {
        let state = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            if content.trim().is_empty() {
                CatalogState::default()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            CatalogState::default()
        };
        debug!(path = ?path, taxonomies = state.taxonomies.len(), "Catalog opened");

        Ok(Self {
            path: Some(path.to_path_buf()),
            state: Mutex::new(state),
        })
    }

    /// Catalog that lives only as long as the value.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(CatalogState::default()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, CatalogState>, MaskwardError> {
        self.state
            .lock()
            .map_err(|_| MaskwardError::InternalError("Catalog Mutex Poisoned".into()))
    }

    fn persist(&self, state: &CatalogState) -> Result<(), MaskwardError> {
        if let Some(path) = &self.path {
            let json = serde_json::to_string_pretty(state).map_err(InfrastructureError::from)?;
            atomic_write(path, json)?;
        }
        Ok(())
    }

    /// Adds `member` to the `role` binding of `resource`, creating the binding if needed.
    pub fn grant(&self, resource: &str, role: &str, member: &str) -> Result<(), MaskwardError> {
        let mut state = self.lock()?;
        if !state.has_resource(resource) {
            return Err(InfrastructureError::NotFound(resource.to_string()).into());
        }

        let policy = state.iam_policies.entry(resource.to_string()).or_default();
        match policy.bindings.iter_mut().find(|b| b.role == role) {
            Some(binding) if binding.members.iter().any(|m| m == member) => {}
            Some(binding) => binding.members.push(member.to_string()),
            None => policy.bindings.push(Binding::new(role, &[member])),
        }
        self.persist(&state)
    }
}

#[async_trait]
impl PolicyTagManager for LocalPolicyTagManager {
    async fn list_taxonomies(&self, parent: &str) -> Result<Vec<Taxonomy>, MaskwardError> {
        let prefix = format!("{}/taxonomies/", parent);
        let state = self.lock()?;
        Ok(state
            .taxonomies
            .iter()
            .filter(|t| t.name.starts_with(&prefix))
            .cloned()
            .collect())
    }

    async fn create_taxonomy(
        &self,
        parent: &str,
        taxonomy: NewTaxonomy,
    ) -> Result<Taxonomy, MaskwardError> {
        let mut state = self.lock()?;
        let prefix = format!("{}/taxonomies/", parent);
        if state
            .taxonomies
            .iter()
            .any(|t| t.name.starts_with(&prefix) && t.display_name == taxonomy.display_name)
        {
            return Err(InfrastructureError::Api(format!(
                "Taxonomy '{}' already exists under {}",
                taxonomy.display_name, parent
            ))
            .into());
        }

        let id = state.allocate();
        let created = Taxonomy {
            name: format!("{}{}", prefix, id),
            display_name: taxonomy.display_name,
            description: taxonomy.description,
            activated_policy_types: taxonomy.activated_policy_types,
        };
        state.taxonomies.push(created.clone());
        self.persist(&state)?;
        Ok(created)
    }

    async fn delete_taxonomy(&self, name: &str) -> Result<(), MaskwardError> {
        let mut state = self.lock()?;
        if !state.has_taxonomy(name) {
            return Err(InfrastructureError::NotFound(name.to_string()).into());
        }

        let tag_prefix = format!("{}/policyTags/", name);
        state.taxonomies.retain(|t| t.name != name);
        state.policy_tags.retain(|t| !t.name.starts_with(&tag_prefix));
        state
            .iam_policies
            .retain(|resource, _| resource != name && !resource.starts_with(&tag_prefix));
        self.persist(&state)
    }

    async fn list_policy_tags(&self, taxonomy: &str) -> Result<Vec<PolicyTag>, MaskwardError> {
        let state = self.lock()?;
        if !state.has_taxonomy(taxonomy) {
            return Err(InfrastructureError::NotFound(taxonomy.to_string()).into());
        }
        let prefix = format!("{}/policyTags/", taxonomy);
        Ok(state
            .policy_tags
            .iter()
            .filter(|t| t.name.starts_with(&prefix))
            .cloned()
            .collect())
    }

    async fn create_policy_tag(
        &self,
        taxonomy: &str,
        policy_tag: NewPolicyTag,
    ) -> Result<PolicyTag, MaskwardError> {
        let mut state = self.lock()?;
        if !state.has_taxonomy(taxonomy) {
            return Err(InfrastructureError::NotFound(taxonomy.to_string()).into());
        }
        let prefix = format!("{}/policyTags/", taxonomy);
        if state
            .policy_tags
            .iter()
            .any(|t| t.name.starts_with(&prefix) && t.display_name == policy_tag.display_name)
        {
            return Err(InfrastructureError::Api(format!(
                "Policy tag '{}' already exists in {}",
                policy_tag.display_name, taxonomy
            ))
            .into());
        }

        let id = state.allocate();
        let created = PolicyTag {
            name: format!("{}{}", prefix, id),
            display_name: policy_tag.display_name,
            description: policy_tag.description,
            parent_policy_tag: None,
        };
        state.policy_tags.push(created.clone());
        self.persist(&state)?;
        Ok(created)
    }

    async fn get_iam_policy(&self, resource: &str) -> Result<IamPolicy, MaskwardError> {
        let state = self.lock()?;
        if !state.has_resource(resource) {
            return Err(InfrastructureError::NotFound(resource.to_string()).into());
        }
        let mut policy = state.iam_policies.get(resource).cloned().unwrap_or_default();
        policy.etag = Some(format!("etag-{}", state.next_id));
        Ok(policy)
    }

    async fn set_iam_policy(
        &self,
        resource: &str,
        policy: IamPolicy,
    ) -> Result<IamPolicy, MaskwardError> {
        let mut state = self.lock()?;
        if !state.has_resource(resource) {
            return Err(InfrastructureError::NotFound(resource.to_string()).into());
        }
        let stored = IamPolicy {
            etag: None,
            ..policy
        };
        state
            .iam_policies
            .insert(resource.to_string(), stored.clone());
        self.persist(&state)?;
        Ok(stored)
    }
}
