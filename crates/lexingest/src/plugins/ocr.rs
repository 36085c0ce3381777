//! OCR backend plugin trait.
//!
//! The pipeline does not recognise text itself. Image extraction hands the
//! preprocessed bytes to an [`OcrBackend`] and takes confidence and page
//! boundaries from its response.

use crate::Result;
use crate::plugins::Plugin;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One page reported by a recognition service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrPage {
    pub page_number: u32,
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Response of a recognition call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrResponse {
    #[serde(default)]
    pub text: String,
    /// Reported confidence. Not trusted to be within `[0, 1]`.
    pub confidence: f64,
    #[serde(default)]
    pub pages: Vec<OcrPage>,
}

/// Trait for OCR backends.
///
/// Implementations must be `Send + Sync`; one backend instance serves every
/// image job of a batch concurrently.
#[async_trait]
pub trait OcrBackend: Plugin {
    /// Recognise text in an encoded image.
    ///
    /// # Errors
    ///
    /// Returns `IngestError::Ocr` when the service fails or answers with
    /// something that is not a recognition response.
    async fn recognize(&self, image_bytes: &[u8]) -> Result<OcrResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_pages_default_empty() {
        let response: OcrResponse = serde_json::from_str(r#"{"text": "hi", "confidence": 0.8}"#).unwrap();
        assert_eq!(response.text, "hi");
        assert!(response.pages.is_empty());
    }

    #[test]
    fn test_response_with_pages() {
        let response: OcrResponse = serde_json::from_str(
            r#"{"text": "a b", "confidence": 0.7, "pages": [
                {"page_number": 1, "text": "a", "confidence": 0.9},
                {"page_number": 2, "text": "b"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(response.pages.len(), 2);
        assert_eq!(response.pages[0].confidence, Some(0.9));
        assert_eq!(response.pages[1].confidence, None);
    }
}
