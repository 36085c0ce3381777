//! OCR backend backed by an HTTP recognition service.
//!
//! Request: `POST {endpoint}` with JSON `{"image": "<base64>"}`.
//! Response: `{"text": ..., "confidence": ..., "pages": [{"page_number", "text", "confidence"?}]}`.

use crate::core::config::OcrServiceConfig;
use crate::plugins::{OcrBackend, OcrResponse, Plugin};
use crate::{IngestError, Result};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct RecognizeRequest<'a> {
    image: &'a str,
}

/// HTTP OCR client.
pub struct HttpOcrBackend {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpOcrBackend {
    pub fn new(config: &OcrServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IngestError::ocr_with_source("failed to build HTTP client", e))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Parse a recognition service response body.
pub fn parse_response(body: &[u8]) -> Result<OcrResponse> {
    serde_json::from_slice(body).map_err(|e| IngestError::ocr_with_source("malformed OCR response", e))
}

impl Plugin for HttpOcrBackend {
    fn name(&self) -> &str {
        "http-ocr"
    }

    fn description(&self) -> &str {
        "Delegates text recognition to an HTTP service"
    }
}

#[async_trait]
impl OcrBackend for HttpOcrBackend {
    async fn recognize(&self, image_bytes: &[u8]) -> Result<OcrResponse> {
        let encoded = STANDARD.encode(image_bytes);
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&RecognizeRequest { image: &encoded });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| IngestError::ocr_with_source(format!("OCR request to {} failed", self.endpoint), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::ocr(format!("OCR service returned {}", status)));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| IngestError::ocr_with_source("failed to read OCR response", e))?;

        let parsed = parse_response(&body)?;
        tracing::debug!(
            endpoint = %self.endpoint,
            pages = parsed.pages.len(),
            confidence = parsed.confidence,
            "OCR response received"
        );
        Ok(parsed)
    }
}
