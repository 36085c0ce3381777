//! Image extractor: preprocessing followed by OCR delegation.

use crate::core::batch_mode::run_parser;
use crate::core::mime::DocumentCategory;
use crate::image::ImagePreprocessor;
use crate::plugins::{DocumentExtractor, OcrBackend, Plugin};
use crate::types::{ExtractionMethod, ExtractionResult};
use crate::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Image extractor.
///
/// Every image goes through [`ImagePreprocessor`] first. Whatever bytes come
/// out (processed PNG, or the original on passthrough) are sent to the OCR
/// backend, whose confidence and pages are taken as-is apart from clamping.
pub struct ImageExtractor {
    preprocessor: ImagePreprocessor,
    ocr: Arc<dyn OcrBackend>,
}

impl ImageExtractor {
    pub fn new(preprocessor: ImagePreprocessor, ocr: Arc<dyn OcrBackend>) -> Self {
        Self { preprocessor, ocr }
    }
}

impl Plugin for ImageExtractor {
    fn name(&self) -> &str {
        "image-extractor"
    }

    fn description(&self) -> &str {
        "Preprocesses images and delegates recognition to an OCR backend"
    }
}

#[async_trait]
impl DocumentExtractor for ImageExtractor {
    fn category(&self) -> DocumentCategory {
        DocumentCategory::Image
    }

    async fn extract_bytes(&self, content: &[u8], mime_type: &str) -> Result<ExtractionResult> {
        let preprocessor = self.preprocessor.clone();
        let prepared = run_parser(content, mime_type, move |bytes| Ok(preprocessor.prepare(bytes))).await?;

        tracing::debug!(backend = self.ocr.name(), bytes = prepared.processed_size(), "Sending image to OCR");
        let response = self.ocr.recognize(&prepared.bytes).await?;

        let text = if response.text.is_empty() && !response.pages.is_empty() {
            response
                .pages
                .iter()
                .map(|page| page.text.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        } else {
            response.text
        };

        let ocr_pages = response.pages.len();
        let pages = if ocr_pages == 0 && !text.trim().is_empty() {
            1
        } else {
            ocr_pages as u32
        };

        let mut result = ExtractionResult::new(text, response.confidence, pages, ExtractionMethod::ImageOcr)
            .with_metadata("original_size", Value::from(prepared.original_size))
            .with_metadata("processed_size", Value::from(prepared.processed_size()))
            .with_metadata("preprocessing_applied", Value::Bool(prepared.applied))
            .with_metadata("ocr_backend", Value::String(self.ocr.name().to_string()))
            .with_metadata("ocr_pages", Value::from(ocr_pages));

        if let Some((width, height)) = prepared.original_dimensions {
            result = result
                .with_metadata("original_width", Value::from(width))
                .with_metadata("original_height", Value::from(height));
        }
        if let Some((width, height)) = prepared.processed_dimensions {
            result = result
                .with_metadata("processed_width", Value::from(width))
                .with_metadata("processed_height", Value::from(height));
        }
        if let Some(reason) = prepared.passthrough_reason {
            result = result.with_metadata("preprocessing_skipped", Value::String(reason));
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IngestError;
    use crate::plugins::{OcrPage, OcrResponse};
    use std::sync::Mutex;

    struct RecordingOcr {
        seen: Mutex<Vec<Vec<u8>>>,
        response: OcrResponse,
    }

    impl Plugin for RecordingOcr {
        fn name(&self) -> &str {
            "recording-ocr"
        }
    }

    #[async_trait]
    impl OcrBackend for RecordingOcr {
        async fn recognize(&self, image_bytes: &[u8]) -> Result<OcrResponse> {
            self.seen.lock().unwrap().push(image_bytes.to_vec());
            Ok(self.response.clone())
        }
    }

    struct FailingOcr;

    impl Plugin for FailingOcr {
        fn name(&self) -> &str {
            "failing-ocr"
        }
    }

    #[async_trait]
    impl OcrBackend for FailingOcr {
        async fn recognize(&self, _image_bytes: &[u8]) -> Result<OcrResponse> {
            Err(IngestError::ocr("service down"))
        }
    }

    fn recording(response: OcrResponse) -> Arc<RecordingOcr> {
        Arc::new(RecordingOcr {
            seen: Mutex::new(Vec::new()),
            response,
        })
    }

    #[tokio::test]
    async fn test_corrupt_image_still_reaches_ocr() {
        let ocr = recording(OcrResponse {
            text: "scanned".to_string(),
            confidence: 1.4,
            pages: vec![],
        });
        let extractor = ImageExtractor::new(ImagePreprocessor::default(), ocr.clone());

        let result = extractor.extract_bytes(b"not an image", "image/png").await.unwrap();

        assert_eq!(ocr.seen.lock().unwrap().as_slice(), &[b"not an image".to_vec()]);
        assert_eq!(result.confidence.value(), 1.0);
        assert_eq!(result.pages, 1);
        assert_eq!(result.extra_metadata["preprocessing_applied"], false);
        assert_eq!(result.extra_metadata["original_size"], 12);
        assert_eq!(result.extra_metadata["processed_size"], 12);
    }

    #[tokio::test]
    async fn test_pages_come_from_ocr_response() {
        let ocr = recording(OcrResponse {
            text: String::new(),
            confidence: 0.7,
            pages: vec![
                OcrPage {
                    page_number: 1,
                    text: "first".to_string(),
                    confidence: None,
                },
                OcrPage {
                    page_number: 2,
                    text: "second".to_string(),
                    confidence: Some(0.6),
                },
            ],
        });
        let extractor = ImageExtractor::new(ImagePreprocessor::default(), ocr);

        let result = extractor.extract_bytes(b"xx", "image/jpeg").await.unwrap();
        assert_eq!(result.pages, 2);
        assert_eq!(result.text, "first\nsecond");
        assert_eq!(result.confidence.value(), 0.7);
        assert_eq!(result.method, ExtractionMethod::ImageOcr);
    }

    #[tokio::test]
    async fn test_ocr_failure_propagates() {
        let extractor = ImageExtractor::new(ImagePreprocessor::default(), Arc::new(FailingOcr));
        let err = extractor.extract_bytes(b"xx", "image/png").await.unwrap_err();
        assert_eq!(err.kind(), "ocr");
    }
}
