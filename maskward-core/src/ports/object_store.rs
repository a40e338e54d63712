// maskward-core/src/ports/object_store.rs

use crate::error::MaskwardError;
use async_trait::async_trait;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Download an object as UTF-8 text. A missing object is `InfrastructureError::NotFound`.
    async fn fetch_text(&self, bucket: &str, object: &str) -> Result<String, MaskwardError>;
}
