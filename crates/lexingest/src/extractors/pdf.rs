//! PDF text-layer extractor.
//!
//! Reads the embedded text layer with `lopdf`. Encrypted documents and
//! documents whose content streams cannot be decoded are reported as errors;
//! the dispatcher turns those into an unavailable OCR-fallback outcome.

use crate::core::batch_mode::run_parser;
use crate::core::mime::{DocumentCategory, PDF_MIME_TYPE};
use crate::plugins::{DocumentExtractor, Plugin};
use crate::types::{ExtractionMethod, ExtractionResult};
use crate::{IngestError, Result};
use async_trait::async_trait;
use lopdf::Document;

/// Confidence reported for text read from an embedded text layer.
pub const PDF_TEXT_LAYER_CONFIDENCE: f64 = 0.95;

/// Text layer of a parsed PDF.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfTextLayer {
    pub text: String,
    pub page_count: u32,
    pub version: String,
}

/// Parse `content` and read the text of every page in page order.
pub fn read_text_layer(content: &[u8]) -> Result<PdfTextLayer> {
    let doc = Document::load_mem(content)
        .map_err(|e| IngestError::extraction_with_source(PDF_MIME_TYPE, "failed to parse PDF", e))?;

    if doc.is_encrypted() {
        return Err(IngestError::extraction(PDF_MIME_TYPE, "PDF is encrypted"));
    }

    let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
    let mut text = String::new();

    for page_number in &page_numbers {
        let page_text = doc.extract_text(&[*page_number]).map_err(|e| {
            IngestError::extraction_with_source(
                PDF_MIME_TYPE,
                format!("text layer of page {} is unreadable", page_number),
                e,
            )
        })?;

        let page_text = page_text.trim_end();
        if page_text.is_empty() {
            continue;
        }
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(page_text);
    }

    tracing::debug!(pages = page_numbers.len(), chars = text.len(), "Read PDF text layer");

    Ok(PdfTextLayer {
        text,
        page_count: page_numbers.len() as u32,
        version: doc.version.clone(),
    })
}

/// PDF document extractor.
pub struct PdfExtractor;

impl PdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PdfExtractor {
    fn name(&self) -> &str {
        "pdf-extractor"
    }

    fn description(&self) -> &str {
        "Extracts the embedded text layer of PDF documents"
    }
}

#[async_trait]
impl DocumentExtractor for PdfExtractor {
    fn category(&self) -> DocumentCategory {
        DocumentCategory::Pdf
    }

    async fn extract_bytes(&self, content: &[u8], _mime_type: &str) -> Result<ExtractionResult> {
        let layer = run_parser(content, PDF_MIME_TYPE, read_text_layer).await?;

        Ok(ExtractionResult::new(
            layer.text,
            PDF_TEXT_LAYER_CONFIDENCE,
            layer.page_count,
            ExtractionMethod::PdfTextLayer,
        )
        .with_metadata("pdf_version", serde_json::Value::String(layer.version)))
    }
}
