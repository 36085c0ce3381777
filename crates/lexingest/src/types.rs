use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Free-form extractor metadata attached to a result.
pub type ExtraMetadata = HashMap<String, serde_json::Value>;

/// One uploaded file to be ingested.
///
/// Jobs are consumed by the pipeline and dropped once the
/// [`ProcessedDocument`] has been assembled.
#[derive(Debug, Clone)]
pub struct DocumentJob {
    pub file_name: String,
    /// MIME type declared by the uploader.
    pub mime_type: String,
    /// Size declared by the uploader.
    pub size_bytes: u64,
    pub bytes: Vec<u8>,
}

impl DocumentJob {
    /// Create a job whose declared size is the length of `bytes`.
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            size_bytes: bytes.len() as u64,
            bytes,
        }
    }

    /// Override the declared size.
    pub fn with_declared_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }
}

/// Self-reported extraction quality, always within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Confidence(f64);

impl Confidence {
    pub const ZERO: Confidence = Confidence(0.0);
    pub const FULL: Confidence = Confidence(1.0);

    /// Clamp `value` into `[0, 1]`. NaN maps to zero.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Confidence(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for Confidence {
    fn from(value: f64) -> Self {
        Confidence::new(value)
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Which extraction path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    PdfTextLayer,
    PdfOcrFallback,
    WordDocument,
    ImageOcr,
    PlainTextUtf8,
    PlainTextLegacy,
}

impl ExtractionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            ExtractionMethod::PdfTextLayer => "pdf-text-layer",
            ExtractionMethod::PdfOcrFallback => "pdf-ocr-fallback",
            ExtractionMethod::WordDocument => "word-document",
            ExtractionMethod::ImageOcr => "image-ocr",
            ExtractionMethod::PlainTextUtf8 => "plain-text-utf8",
            ExtractionMethod::PlainTextLegacy => "plain-text-legacy",
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw output of a single format extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub text: String,
    pub confidence: Confidence,
    pub pages: u32,
    pub encoding: String,
    pub method: ExtractionMethod,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra_metadata: ExtraMetadata,
}

impl ExtractionResult {
    pub fn new(text: String, confidence: impl Into<Confidence>, pages: u32, method: ExtractionMethod) -> Self {
        Self {
            text,
            confidence: confidence.into(),
            pages,
            encoding: UTF8_ENCODING.to_string(),
            method,
            extra_metadata: HashMap::new(),
        }
    }

    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = encoding.into();
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra_metadata.insert(key.into(), value);
        self
    }
}

pub const UTF8_ENCODING: &str = "UTF-8";

/// A degraded extraction path that produced no text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnavailableExtraction {
    pub method: ExtractionMethod,
    pub reason: String,
}

impl UnavailableExtraction {
    /// The structurally valid empty result reported for this outcome:
    /// no text, zero confidence, zero pages.
    pub fn placeholder(&self) -> ExtractionResult {
        ExtractionResult::new(String::new(), Confidence::ZERO, 0, self.method)
    }
}

/// What the dispatcher produced for a job.
///
/// A genuine empty document is `Extracted` with empty text; `Unavailable`
/// means the extraction path itself was degraded.
#[derive(Debug, Clone)]
pub enum ExtractionOutcome {
    Extracted(ExtractionResult),
    Unavailable(UnavailableExtraction),
}

impl ExtractionOutcome {
    pub fn is_unavailable(&self) -> bool {
        matches!(self, ExtractionOutcome::Unavailable(_))
    }

    pub fn method(&self) -> ExtractionMethod {
        match self {
            ExtractionOutcome::Extracted(result) => result.method,
            ExtractionOutcome::Unavailable(unavailable) => unavailable.method,
        }
    }

    /// Collapse into a result plus the unavailability reason, if any.
    pub fn into_parts(self) -> (ExtractionResult, Option<String>) {
        match self {
            ExtractionOutcome::Extracted(result) => (result, None),
            ExtractionOutcome::Unavailable(unavailable) => (unavailable.placeholder(), Some(unavailable.reason)),
        }
    }
}

/// Language tag produced by the stop-word heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Language {
    #[default]
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "de")]
    German,
    #[serde(rename = "it")]
    Italian,
    #[serde(rename = "pt")]
    Portuguese,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::English,
        Language::Spanish,
        Language::French,
        Language::German,
        Language::Italian,
        Language::Portuguese,
    ];

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::German => "de",
            Language::Italian => "it",
            Language::Portuguese => "pt",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Metadata attached to a [`ProcessedDocument`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub language: Language,
    pub encoding: String,
    pub created_at: DateTime<Utc>,
    pub method: ExtractionMethod,
    /// Set when the extraction path was unavailable and the text is a placeholder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_reason: Option<String>,
    /// Extractor-specific fields. Keys never collide with the fields above,
    /// see [`crate::core::assembler::RESERVED_METADATA_KEYS`].
    #[serde(flatten)]
    pub extra: ExtraMetadata,
}

/// Final artifact of one pipeline run, owned by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedDocument {
    pub document_id: Uuid,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub storage_url: String,
    pub extracted_text: String,
    pub confidence: Confidence,
    pub pages: u32,
    pub word_count: usize,
    pub processing_time_ms: u64,
    pub metadata: DocumentMetadata,
}

/// One failed entry of a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchFailure {
    pub file_name: String,
    pub error: String,
    /// Error kind tag, see [`crate::IngestError::kind`].
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<Uuid>,
}

/// Aggregate outcome of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub successful: Vec<ProcessedDocument>,
    pub failed: Vec<BatchFailure>,
    /// Number of jobs submitted, regardless of how many were attempted.
    pub total_processed: usize,
    /// Percentage of successful jobs, 0 for an empty batch.
    pub success_rate: f64,
}

impl BatchResult {
    pub fn from_parts(successful: Vec<ProcessedDocument>, failed: Vec<BatchFailure>, submitted: usize) -> Self {
        let success_rate = if submitted == 0 {
            0.0
        } else {
            successful.len() as f64 / submitted as f64 * 100.0
        };
        Self {
            successful,
            failed,
            total_processed: submitted,
            success_rate,
        }
    }
}
