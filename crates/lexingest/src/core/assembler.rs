//! Final artifact assembly.

use crate::storage::UploadResult;
use crate::text::Enrichment;
use crate::types::{DocumentJob, DocumentMetadata, ExtraMetadata, ExtractionOutcome, ProcessedDocument};
use chrono::Utc;
use std::time::Instant;
use uuid::Uuid;

/// Metadata fields owned by the pipeline. Extractors cannot override them
/// through their extra metadata, which is flattened into the same object.
pub const RESERVED_METADATA_KEYS: &[&str] = &["language", "encoding", "created_at", "method", "unavailable_reason"];

/// Everything the assembler combines into a [`ProcessedDocument`].
pub struct AssemblyParts {
    pub document_id: Uuid,
    pub job: DocumentJob,
    pub outcome: ExtractionOutcome,
    pub enrichment: Enrichment,
    pub upload: UploadResult,
    pub started: Instant,
}

/// Build the final document.
///
/// `processing_time_ms` is the wall-clock time since `started`; `created_at`
/// is stamped now. The job's bytes are dropped here.
pub fn assemble(parts: AssemblyParts) -> ProcessedDocument {
    let AssemblyParts {
        document_id,
        job,
        outcome,
        enrichment,
        upload,
        started,
    } = parts;

    let (result, unavailable_reason) = outcome.into_parts();

    ProcessedDocument {
        document_id,
        original_name: job.file_name,
        mime_type: job.mime_type,
        size_bytes: job.size_bytes,
        storage_url: upload.url,
        word_count: enrichment.word_count,
        extracted_text: result.text,
        confidence: result.confidence,
        pages: result.pages,
        processing_time_ms: started.elapsed().as_millis() as u64,
        metadata: DocumentMetadata {
            language: enrichment.language,
            encoding: result.encoding,
            created_at: Utc::now(),
            method: result.method,
            unavailable_reason,
            extra: without_reserved_keys(result.extra_metadata),
        },
    }
}

fn without_reserved_keys(mut extra: ExtraMetadata) -> ExtraMetadata {
    for key in RESERVED_METADATA_KEYS {
        if extra.remove(*key).is_some() {
            tracing::warn!(key = *key, "Dropping extractor metadata that shadows a pipeline field");
        }
    }
    extra
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ExtractionMethod, ExtractionResult, Language, UnavailableExtraction};

    fn parts(outcome: ExtractionOutcome, enrichment: Enrichment) -> AssemblyParts {
        AssemblyParts {
            document_id: Uuid::new_v4(),
            job: DocumentJob::new("memo.txt", "text/plain", b"one two".to_vec()),
            outcome,
            enrichment,
            upload: UploadResult {
                url: "memory://k".to_string(),
                key: "k".to_string(),
            },
            started: Instant::now(),
        }
    }

    #[test]
    fn test_assemble_extracted() {
        let result = ExtractionResult::new("one two".to_string(), 1.0, 1, ExtractionMethod::PlainTextUtf8)
            .with_metadata("custom", serde_json::json!(true));
        let doc = assemble(parts(
            ExtractionOutcome::Extracted(result),
            Enrichment {
                word_count: 2,
                language: Language::English,
            },
        ));

        assert_eq!(doc.original_name, "memo.txt");
        assert_eq!(doc.size_bytes, 7);
        assert_eq!(doc.storage_url, "memory://k");
        assert_eq!(doc.word_count, 2);
        assert_eq!(doc.metadata.encoding, "UTF-8");
        assert!(doc.metadata.unavailable_reason.is_none());

        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["metadata"]["custom"], true);
        assert_eq!(json["metadata"]["language"], "en");
    }

    #[test]
    fn test_extractor_metadata_cannot_shadow_pipeline_fields() {
        let result = ExtractionResult::new("one two".to_string(), 1.0, 1, ExtractionMethod::PlainTextUtf8)
            .with_metadata("language", serde_json::json!("xx"))
            .with_metadata("method", serde_json::json!("custom"))
            .with_metadata("encoding", serde_json::json!("EBCDIC"))
            .with_metadata("author", serde_json::json!("Ada"));
        let doc = assemble(parts(
            ExtractionOutcome::Extracted(result),
            Enrichment {
                word_count: 2,
                language: Language::English,
            },
        ));

        assert!(!doc.metadata.extra.contains_key("language"));
        assert!(!doc.metadata.extra.contains_key("method"));
        assert!(!doc.metadata.extra.contains_key("encoding"));
        assert_eq!(doc.metadata.extra["author"], "Ada");

        let json = serde_json::to_string(&doc).unwrap();
        assert_eq!(json.matches("\"language\"").count(), 1);
        assert_eq!(json.matches("\"method\"").count(), 1);

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["metadata"]["language"], "en");
        assert_eq!(value["metadata"]["encoding"], "UTF-8");
        assert_eq!(value["metadata"]["method"], "plain-text-utf8");
    }

    #[test]
    fn test_assemble_unavailable() {
        let doc = assemble(parts(
            ExtractionOutcome::Unavailable(UnavailableExtraction {
                method: ExtractionMethod::PdfOcrFallback,
                reason: "encrypted".to_string(),
            }),
            Enrichment {
                word_count: 0,
                language: Language::English,
            },
        ));

        assert_eq!(doc.extracted_text, "");
        assert_eq!(doc.confidence.value(), 0.0);
        assert_eq!(doc.pages, 0);
        assert_eq!(doc.metadata.method, ExtractionMethod::PdfOcrFallback);
        assert_eq!(doc.metadata.unavailable_reason.as_deref(), Some("encrypted"));
    }
}
