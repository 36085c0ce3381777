//! Extraction dispatch and fallback policy.
//!
//! The dispatcher receives a [`ValidatedJob`] whose category was resolved by
//! the validator and hands it to the one extractor registered for that
//! category. Policy on failure:
//!
//! - PDF: any fault of the text-layer path becomes
//!   [`ExtractionOutcome::Unavailable`] tagged `pdf-ocr-fallback`.
//! - Everything else: the fault is returned as `IngestError::Extraction`
//!   carrying the declared MIME type and the original error as its source.

use crate::core::config::IngestConfig;
use crate::core::mime::DocumentCategory;
use crate::core::validation::ValidatedJob;
use crate::extractors::{ImageExtractor, PdfExtractor, PlainTextExtractor, WordExtractor};
use crate::image::ImagePreprocessor;
use crate::plugins::{DocumentExtractor, OcrBackend};
use crate::types::{ExtractionMethod, ExtractionOutcome, UnavailableExtraction};
use crate::{IngestError, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// Routes validated jobs to format extractors.
#[derive(Clone)]
pub struct ExtractionDispatcher {
    extractors: HashMap<DocumentCategory, Arc<dyn DocumentExtractor>>,
}

impl ExtractionDispatcher {
    /// An empty dispatcher. Use [`register`](Self::register) to add extractors.
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Dispatcher with the built-in extractors.
    ///
    /// Image extraction is only available when an OCR backend is given.
    pub fn with_defaults(config: &IngestConfig, ocr: Option<Arc<dyn OcrBackend>>) -> Self {
        let mut dispatcher = Self::empty();
        dispatcher.register(Arc::new(PdfExtractor::new()));
        dispatcher.register(Arc::new(WordExtractor::new()));
        dispatcher.register(Arc::new(PlainTextExtractor::new()));
        if let Some(ocr) = ocr {
            let preprocessor = ImagePreprocessor::new(config.preprocessing.clone());
            dispatcher.register(Arc::new(ImageExtractor::new(preprocessor, ocr)));
        }
        dispatcher
    }

    /// Register `extractor` for its category, replacing any previous one.
    pub fn register(&mut self, extractor: Arc<dyn DocumentExtractor>) -> Option<Arc<dyn DocumentExtractor>> {
        self.extractors.insert(extractor.category(), extractor)
    }

    pub fn extractor_for(&self, category: DocumentCategory) -> Option<&Arc<dyn DocumentExtractor>> {
        self.extractors.get(&category)
    }

    /// Extract text from a validated job.
    pub async fn extract(&self, job: &ValidatedJob) -> Result<ExtractionOutcome> {
        let category = job.category();
        let mime_type = job.mime_type();

        let extractor = self.extractors.get(&category).ok_or_else(|| {
            IngestError::extraction(mime_type, format!("no extractor available for {} documents", category))
        })?;

        tracing::debug!(category = %category, extractor = extractor.name(), "Dispatching extraction");

        match extractor.extract_bytes(job.bytes(), mime_type).await {
            Ok(result) => Ok(ExtractionOutcome::Extracted(result)),
            Err(e) if category == DocumentCategory::Pdf => {
                tracing::warn!(error = %e, "PDF text layer unavailable, using OCR fallback");
                Ok(ExtractionOutcome::Unavailable(UnavailableExtraction {
                    method: ExtractionMethod::PdfOcrFallback,
                    reason: e.to_string(),
                }))
            }
            Err(e) => Err(wrap_extraction_error(mime_type, e)),
        }
    }

    /// Run `initialize` on every registered extractor.
    pub fn initialize(&self) -> Result<()> {
        for extractor in self.extractors.values() {
            extractor.initialize()?;
        }
        Ok(())
    }

    /// Run `shutdown` on every registered extractor.
    pub fn shutdown(&self) -> Result<()> {
        for extractor in self.extractors.values() {
            extractor.shutdown()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ExtractionDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<(&str, &str)> = self
            .extractors
            .iter()
            .map(|(category, extractor)| (category.as_str(), extractor.name()))
            .collect();
        names.sort();
        f.debug_struct("ExtractionDispatcher").field("extractors", &names).finish()
    }
}

/// Wrap a non-PDF extractor fault with the declared MIME type.
fn wrap_extraction_error(mime_type: &str, error: IngestError) -> IngestError {
    match error {
        IngestError::Extraction { .. } => error,
        other => IngestError::Extraction {
            mime_type: mime_type.to_string(),
            message: other.to_string(),
            source: Some(Box::new(other)),
        },
    }
}
