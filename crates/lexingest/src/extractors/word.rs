//! Word-family extractor.
//!
//! Reads raw text from the OOXML container (`word/document.xml`) with `zip`
//! and `roxmltree`, plus the package properties in `docProps/`. Content the
//! converter cannot represent as text (tracked deletions, drawings, embedded
//! objects) is skipped and reported as a warning in the result metadata.
//!
//! Legacy binary `.doc` files are not OLE-parsed; a non-ZIP payload is an
//! extraction error.

use crate::core::batch_mode::run_parser;
use crate::core::mime::DocumentCategory;
use crate::extractors::estimate_pages;
use crate::plugins::{DocumentExtractor, Plugin};
use crate::types::{ExtraMetadata, ExtractionMethod, ExtractionResult};
use crate::{IngestError, Result};
use async_trait::async_trait;
use roxmltree::{Document, Node};
use serde_json::Value;
use std::io::{Cursor, Read};

/// Confidence reported for text read from a Word container.
pub const WORD_CONFIDENCE: f64 = 0.98;

const DOCUMENT_PART: &str = "word/document.xml";
const CORE_PROPERTIES_PART: &str = "docProps/core.xml";
const APP_PROPERTIES_PART: &str = "docProps/app.xml";

/// Text and side information read from a Word container.
#[derive(Debug, Clone, Default)]
pub struct WordContent {
    pub text: String,
    pub warnings: Vec<String>,
    pub properties: ExtraMetadata,
}

#[derive(Default)]
struct WalkState {
    paragraphs: Vec<String>,
    deleted_runs: usize,
    skipped_objects: usize,
}

/// Read text, warnings and package properties from a Word document.
///
/// `mime_type` is only used for error context.
pub fn read_word_document(content: &[u8], mime_type: &str) -> Result<WordContent> {
    let mut archive = zip::ZipArchive::new(Cursor::new(content)).map_err(|e| {
        IngestError::extraction_with_source(
            mime_type,
            "not an OOXML container (legacy binary Word documents are not supported)",
            e,
        )
    })?;

    let document_xml = read_part(&mut archive, DOCUMENT_PART, mime_type)?.ok_or_else(|| {
        IngestError::extraction(mime_type, format!("container has no {}", DOCUMENT_PART))
    })?;

    let doc = Document::parse(&document_xml)
        .map_err(|e| IngestError::extraction_with_source(mime_type, format!("failed to parse {}", DOCUMENT_PART), e))?;

    let mut state = WalkState::default();
    collect_paragraphs(doc.root_element(), &mut state);

    let text = state
        .paragraphs
        .into_iter()
        .filter(|p| !p.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut warnings = Vec::new();
    if state.deleted_runs > 0 {
        warnings.push(format!("skipped {} tracked deletion(s)", state.deleted_runs));
    }
    if state.skipped_objects > 0 {
        warnings.push(format!(
            "skipped {} embedded drawing(s) or object(s)",
            state.skipped_objects
        ));
    }

    let mut properties = ExtraMetadata::new();
    // Package properties are optional; a broken docProps part only costs metadata.
    if let Ok(Some(core_xml)) = read_part(&mut archive, CORE_PROPERTIES_PART, mime_type) {
        read_core_properties(&core_xml, &mut properties);
    }
    if let Ok(Some(app_xml)) = read_part(&mut archive, APP_PROPERTIES_PART, mime_type) {
        read_app_properties(&app_xml, &mut properties);
    }

    Ok(WordContent {
        text,
        warnings,
        properties,
    })
}

fn read_part(archive: &mut zip::ZipArchive<Cursor<&[u8]>>, name: &str, mime_type: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(name) {
        Ok(file) => file,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(IngestError::extraction_with_source(
                mime_type,
                format!("failed to open {}", name),
                e,
            ));
        }
    };

    let mut xml = String::new();
    file.read_to_string(&mut xml)?;
    Ok(Some(xml))
}

fn collect_paragraphs(node: Node, state: &mut WalkState) {
    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "p" => {
                let mut paragraph = String::new();
                append_run_text(child, &mut paragraph, state);
                state.paragraphs.push(paragraph);
            }
            "drawing" | "pict" | "object" => state.skipped_objects += 1,
            "del" => state.deleted_runs += 1,
            "Fallback" | "sectPr" => {}
            _ => collect_paragraphs(child, state),
        }
    }
}

fn append_run_text(node: Node, out: &mut String, state: &mut WalkState) {
    for child in node.children().filter(|n| n.is_element()) {
        match child.tag_name().name() {
            "t" => out.push_str(child.text().unwrap_or_default()),
            "tab" => out.push('\t'),
            "br" | "cr" => out.push('\n'),
            "del" | "delText" => state.deleted_runs += 1,
            "drawing" | "pict" | "object" => state.skipped_objects += 1,
            "pPr" | "rPr" | "instrText" | "Fallback" => {}
            _ => append_run_text(child, out, state),
        }
    }
}

fn read_core_properties(xml: &str, properties: &mut ExtraMetadata) {
    let Ok(doc) = Document::parse(xml) else {
        return;
    };

    for node in doc.root_element().children().filter(|n| n.is_element()) {
        let key = match node.tag_name().name() {
            "title" => "title",
            "creator" => "author",
            "created" => "created",
            "modified" => "modified",
            _ => continue,
        };
        if let Some(value) = node.text().map(str::trim).filter(|v| !v.is_empty()) {
            properties.insert(key.to_string(), Value::String(value.to_string()));
        }
    }
}

fn read_app_properties(xml: &str, properties: &mut ExtraMetadata) {
    let Ok(doc) = Document::parse(xml) else {
        return;
    };

    let declared_pages = doc
        .root_element()
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == "Pages")
        .and_then(|n| n.text())
        .and_then(|text| text.trim().parse::<u64>().ok());

    if let Some(pages) = declared_pages {
        properties.insert("declared_pages".to_string(), Value::from(pages));
    }
}

/// Word-family document extractor.
pub struct WordExtractor;

impl WordExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Plugin for WordExtractor {
    fn name(&self) -> &str {
        "word-extractor"
    }

    fn description(&self) -> &str {
        "Extracts raw text and package properties from Word documents"
    }
}

#[async_trait]
impl DocumentExtractor for WordExtractor {
    fn category(&self) -> DocumentCategory {
        DocumentCategory::Word
    }

    async fn extract_bytes(&self, content: &[u8], mime_type: &str) -> Result<ExtractionResult> {
        let mime_owned = mime_type.to_string();
        let word = run_parser(content, mime_type, move |bytes| read_word_document(bytes, &mime_owned)).await?;

        for warning in &word.warnings {
            tracing::debug!(warning = %warning, "Word conversion warning");
        }

        let pages = estimate_pages(&word.text);
        let mut result = ExtractionResult::new(word.text, WORD_CONFIDENCE, pages, ExtractionMethod::WordDocument)
            .with_metadata(
                "warnings",
                Value::Array(word.warnings.into_iter().map(Value::String).collect()),
            );
        result.extra_metadata.extend(word.properties);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::mime::DOCX_MIME_TYPE;
    use std::io::Write;

    fn build_docx(body: &str, core: Option<&str>) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buffer);
            let options = zip::write::SimpleFileOptions::default();
            zip.start_file(DOCUMENT_PART, options).unwrap();
            write!(
                zip,
                r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
                body
            )
            .unwrap();
            if let Some(core) = core {
                zip.start_file(CORE_PROPERTIES_PART, options).unwrap();
                zip.write_all(core.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn test_paragraphs_tabs_and_breaks() {
        let docx = build_docx(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>Party</w:t></w:r><w:r><w:tab/><w:t>Tenant</w:t></w:r></w:p>
               <w:p><w:r><w:t>Line one</w:t><w:br/><w:t>Line two</w:t></w:r></w:p>"#,
            None,
        );
        let content = read_word_document(&docx, DOCX_MIME_TYPE).unwrap();
        assert_eq!(content.text, "Party\tTenant\n\nLine one\nLine two");
        assert!(content.warnings.is_empty());
    }

    #[test]
    fn test_deletions_and_drawings_warn() {
        let docx = build_docx(
            r#"<w:p><w:r><w:t>Kept</w:t></w:r><w:del><w:r><w:delText>Removed</w:delText></w:r></w:del></w:p>
               <w:p><w:r><w:drawing><w:t>ignored</w:t></w:drawing></w:r></w:p>"#,
            None,
        );
        let content = read_word_document(&docx, DOCX_MIME_TYPE).unwrap();
        assert_eq!(content.text, "Kept");
        assert_eq!(content.warnings.len(), 2);
        assert!(content.warnings[0].contains("tracked deletion"));
        assert!(content.warnings[1].contains("drawing"));
    }

    #[test]
    fn test_table_cells_become_paragraphs() {
        let docx = build_docx(
            r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>A1</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>B1</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
            None,
        );
        let content = read_word_document(&docx, DOCX_MIME_TYPE).unwrap();
        assert_eq!(content.text, "A1\n\nB1");
    }

    #[test]
    fn test_core_properties() {
        let docx = build_docx(
            r#"<w:p><w:r><w:t>Body</w:t></w:r></w:p>"#,
            Some(
                r#"<?xml version="1.0" encoding="UTF-8"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/">
<dc:title>Master Services Agreement</dc:title><dc:creator>Legal</dc:creator><dcterms:created>2024-01-02T03:04:05Z</dcterms:created>
</cp:coreProperties>"#,
            ),
        );
        let content = read_word_document(&docx, DOCX_MIME_TYPE).unwrap();
        assert_eq!(content.properties["title"], "Master Services Agreement");
        assert_eq!(content.properties["author"], "Legal");
        assert_eq!(content.properties["created"], "2024-01-02T03:04:05Z");
    }

    #[test]
    fn test_legacy_binary_doc_is_error() {
        let ole_header = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1, 0, 0, 0, 0];
        let err = read_word_document(&ole_header, "application/msword").unwrap_err();
        match err {
            IngestError::Extraction { mime_type, .. } => assert_eq!(mime_type, "application/msword"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_extractor_result_shape() {
        let text = "x".repeat(3001);
        let docx = build_docx(&format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", text), None);
        let result = WordExtractor::new().extract_bytes(&docx, DOCX_MIME_TYPE).await.unwrap();
        assert_eq!(result.confidence.value(), WORD_CONFIDENCE);
        assert_eq!(result.pages, 2);
        assert_eq!(result.method, ExtractionMethod::WordDocument);
        assert_eq!(result.extra_metadata["warnings"], Value::Array(vec![]));
    }
}
