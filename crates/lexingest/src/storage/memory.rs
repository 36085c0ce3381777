//! In-memory blob store.

use crate::Result;
use crate::plugins::Plugin;
use crate::storage::{BlobStore, UploadResult, object_key};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Keeps uploads in process memory under `memory://{key}` URLs.
///
/// Cloning shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlobStore {
    objects: Arc<DashMap<String, StoredObject>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<StoredObject> {
        self.objects.get(key).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

impl Plugin for InMemoryBlobStore {
    fn name(&self) -> &str {
        "memory-blob-store"
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn upload(&self, bytes: &[u8], file_name: &str, mime_type: &str) -> Result<UploadResult> {
        let key = object_key(file_name);
        self.objects.insert(
            key.clone(),
            StoredObject {
                file_name: file_name.to_string(),
                mime_type: mime_type.to_string(),
                bytes: bytes.to_vec(),
            },
        );

        Ok(UploadResult {
            url: format!("memory://{}", key),
            key,
        })
    }
}
