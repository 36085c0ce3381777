//! Blob storage for original uploads.
//!
//! The pipeline uploads the original bytes of every job after extraction. A
//! failed upload fails the job.

pub mod local;
pub mod memory;

#[cfg(feature = "http")]
pub mod http;

use crate::core::config::StorageConfig;
use crate::plugins::Plugin;
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use local::LocalBlobStore;
pub use memory::InMemoryBlobStore;

#[cfg(feature = "http")]
pub use http::HttpBlobStore;

/// Location of an uploaded object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    pub url: String,
    pub key: String,
}

/// Trait for blob stores.
#[async_trait]
pub trait BlobStore: Plugin {
    /// Store `bytes` and return where they went.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Storage` on any failure.
    async fn upload(&self, bytes: &[u8], file_name: &str, mime_type: &str) -> Result<UploadResult>;
}

/// Build the blob store selected by the configuration.
pub fn from_config(config: &StorageConfig) -> Result<Arc<dyn BlobStore>> {
    match config {
        StorageConfig::Memory => Ok(Arc::new(InMemoryBlobStore::new())),
        StorageConfig::Local { root } => Ok(Arc::new(LocalBlobStore::new(root.clone()))),
        #[cfg(feature = "http")]
        StorageConfig::Http {
            base_url,
            bearer_token,
            timeout_secs,
        } => Ok(Arc::new(HttpBlobStore::new(
            base_url.clone(),
            bearer_token.clone(),
            *timeout_secs,
        )?)),
        #[cfg(not(feature = "http"))]
        StorageConfig::Http { .. } => Err(crate::IngestError::config(
            "HTTP storage requires the `http` feature",
        )),
    }
}

/// Object key for an upload: a fresh UUID followed by the sanitised file name.
pub fn object_key(file_name: &str) -> String {
    format!("{}-{}", uuid::Uuid::new_v4(), sanitize_file_name(file_name))
}

/// Keep ASCII alphanumerics, `.`, `-` and `_`; replace everything else.
///
/// Path separators never survive, so a key can't escape its storage root.
pub fn sanitize_file_name(file_name: &str) -> String {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = sanitized.trim_start_matches('.');
    if trimmed.is_empty() {
        "upload".to_string()
    } else {
        trimmed.to_string()
    }
}
