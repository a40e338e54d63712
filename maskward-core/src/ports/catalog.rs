// maskward-core/src/ports/catalog.rs

use crate::domain::access::IamPolicy;
use crate::domain::taxonomy::{NewPolicyTag, NewTaxonomy, PolicyTag, Taxonomy};
use crate::error::MaskwardError;
use async_trait::async_trait;

/// Taxonomies, policy tags and the IAM policies attached to tags.
#[async_trait]
pub trait PolicyTagManager: Send + Sync {
    /// Taxonomies under `projects/{p}/locations/{l}`, in the catalog's listing order.
    async fn list_taxonomies(&self, parent: &str) -> Result<Vec<Taxonomy>, MaskwardError>;

    async fn create_taxonomy(
        &self,
        parent: &str,
        taxonomy: NewTaxonomy,
    ) -> Result<Taxonomy, MaskwardError>;

    /// Deletes the taxonomy and every policy tag under it.
    async fn delete_taxonomy(&self, name: &str) -> Result<(), MaskwardError>;

    async fn list_policy_tags(&self, taxonomy: &str) -> Result<Vec<PolicyTag>, MaskwardError>;

    async fn create_policy_tag(
        &self,
        taxonomy: &str,
        policy_tag: NewPolicyTag,
    ) -> Result<PolicyTag, MaskwardError>;

    async fn get_iam_policy(&self, resource: &str) -> Result<IamPolicy, MaskwardError>;

    /// Replaces the whole policy on `resource`.
    async fn set_iam_policy(
        &self,
        resource: &str,
        policy: IamPolicy,
    ) -> Result<IamPolicy, MaskwardError>;
}
