// maskward-core/src/infrastructure/adapters/bucket.rs

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

use crate::error::MaskwardError;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::resolve_within;
use crate::ports::object_store::ObjectStore;

/// Object store over a directory: `{root}/{bucket}/{object}`.
pub struct LocalBucketStore {
    root: PathBuf,
}

impl LocalBucketStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ObjectStore for LocalBucketStore {
    async fn fetch_text(&self, bucket: &str, object: &str) -> Result<String, MaskwardError> {
        let bucket_dir = resolve_within(&self.root, bucket)?;
        let path = resolve_within(&bucket_dir, object)?;
        debug!(path = ?path, "Fetching object");

        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(
                InfrastructureError::NotFound(format!("gs://{}/{}", bucket, object)).into(),
            ),
            Err(e) => Err(e.into()),
        }
    }
}
