//! HTTP object store client.
//!
//! Objects are `PUT` to `{base_url}/{key}` with the declared content type.

use crate::plugins::Plugin;
use crate::storage::{BlobStore, UploadResult, object_key};
use crate::{IngestError, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

pub struct HttpBlobStore {
    client: Client,
    base_url: String,
    bearer_token: Option<String>,
}

impl HttpBlobStore {
    pub fn new(base_url: impl Into<String>, bearer_token: Option<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| IngestError::storage_with_source("failed to build HTTP client", e))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token,
        })
    }
}

impl Plugin for HttpBlobStore {
    fn name(&self) -> &str {
        "http-blob-store"
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn upload(&self, bytes: &[u8], file_name: &str, mime_type: &str) -> Result<UploadResult> {
        let key = object_key(file_name);
        let url = format!("{}/{}", self.base_url, key);

        let mut request = self
            .client
            .put(&url)
            .header(CONTENT_TYPE, mime_type)
            .body(bytes.to_vec());
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IngestError::storage_with_source(format!("upload to {} failed", url), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::storage(format!("upload to {} returned {}", url, status)));
        }

        Ok(UploadResult { url, key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_put_object() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path_regex(r"^/bucket/[0-9a-f-]{36}-contract\.pdf$"))
            .and(header("content-type", "application/pdf"))
            .and(header("authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let store = HttpBlobStore::new(format!("{}/bucket/", server.uri()), Some("token".to_string()), 5).unwrap();
        let uploaded = store.upload(b"%PDF-1.4", "contract.pdf", "application/pdf").await.unwrap();

        assert!(uploaded.url.starts_with(&format!("{}/bucket/", server.uri())));
        assert!(uploaded.url.ends_with(&uploaded.key));
    }

    #[tokio::test]
    async fn test_rejected_upload_is_storage_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let store = HttpBlobStore::new(server.uri(), None, 5).unwrap();
        let err = store.upload(b"x", "a.txt", "text/plain").await.unwrap_err();
        assert_eq!(err.kind(), "storage");
        assert!(err.to_string().contains("403"));
    }
}
