//! Filesystem blob store.

use crate::plugins::Plugin;
use crate::storage::{BlobStore, UploadResult, object_key};
use crate::{IngestError, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Writes uploads below a root directory and returns `file://` URLs.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Plugin for LocalBlobStore {
    fn name(&self) -> &str {
        "local-blob-store"
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, bytes: &[u8], file_name: &str, _mime_type: &str) -> Result<UploadResult> {
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| {
            IngestError::storage_with_source(format!("failed to create {}", self.root.display()), e)
        })?;

        let key = object_key(file_name);
        let path = self.root.join(&key);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| IngestError::storage_with_source(format!("failed to write {}", path.display()), e))?;

        let absolute = tokio::fs::canonicalize(&path).await.unwrap_or(path);
        tracing::debug!(path = %absolute.display(), bytes = bytes.len(), "Stored upload");

        Ok(UploadResult {
            url: format!("file://{}", absolute.display()),
            key,
        })
    }
}
