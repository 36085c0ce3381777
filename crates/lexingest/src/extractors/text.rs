//! Plain text extractor.

use crate::Result;
use crate::core::mime::DocumentCategory;
use crate::extractors::estimate_pages;
use crate::plugins::{DocumentExtractor, Plugin};
use crate::types::{ExtractionMethod, ExtractionResult};
use async_trait::async_trait;
use encoding_rs::WINDOWS_1252;

pub const UTF8_CONFIDENCE: f64 = 1.0;
pub const LEGACY_CONFIDENCE: f64 = 0.9;

const UTF8_BOM: &str = "\u{feff}";

/// Decoded plain text and the encoding it was read as.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static str,
    pub legacy: bool,
}

/// Decode `content` as UTF-8, falling back to Windows-1252.
///
/// Windows-1252 maps every byte, so the fallback never fails. A leading
/// UTF-8 byte-order mark is dropped.
pub fn decode_text(content: &[u8]) -> DecodedText {
    match simdutf8::basic::from_utf8(content) {
        Ok(text) => DecodedText {
            text: text.strip_prefix(UTF8_BOM).unwrap_or(text).to_string(),
            encoding: crate::types::UTF8_ENCODING,
            legacy: false,
        },
        Err(_) => {
            let (text, _, _) = WINDOWS_1252.decode(content);
            DecodedText {
                text: text.into_owned(),
                encoding: WINDOWS_1252.name(),
                legacy: true,
            }
        }
    }
}

/// Plain text extractor.
pub struct PlainTextExtractor;

impl PlainTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for PlainTextExtractor {
    fn name(&self) -> &str {
        "plain-text-extractor"
    }

    fn description(&self) -> &str {
        "Decodes plain text files"
    }
}

#[async_trait]
impl DocumentExtractor for PlainTextExtractor {
    fn category(&self) -> DocumentCategory {
        DocumentCategory::Text
    }

    async fn extract_bytes(&self, content: &[u8], _mime_type: &str) -> Result<ExtractionResult> {
        let decoded = decode_text(content);

        let (confidence, method) = if decoded.legacy {
            tracing::warn!(encoding = decoded.encoding, "Text is not valid UTF-8, decoded as legacy encoding");
            (LEGACY_CONFIDENCE, ExtractionMethod::PlainTextLegacy)
        } else {
            (UTF8_CONFIDENCE, ExtractionMethod::PlainTextUtf8)
        };

        let pages = estimate_pages(&decoded.text);
        Ok(ExtractionResult::new(decoded.text, confidence, pages, method).with_encoding(decoded.encoding))
    }
}
