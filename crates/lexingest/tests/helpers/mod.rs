//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use lexingest::{
    BlobStore, IngestConfig, IngestError, IngestPipeline, InMemoryBlobStore, OcrBackend, OcrPage, OcrResponse, Plugin,
    UploadResult,
};
use lopdf::{Document, Object, Stream, dictionary};
use std::io::{Cursor, Write};
use std::sync::{Arc, Mutex};

pub const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Single-font PDF with one text run per page.
pub fn build_pdf(page_texts: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut page_ids = Vec::new();
    for text in page_texts {
        let content = format!("BT /F1 11 Tf 72 720 Td ({}) Tj ET", text);
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        page_ids.push(doc.add_object(dictionary! {
            "Type" => "Page",
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            "Resources" => resources_id,
            "Contents" => content_id,
        }));
    }

    let kids: Vec<Object> = page_ids.iter().map(|&id| id.into()).collect();
    let pages_id = doc.add_object(dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => Object::Integer(page_texts.len() as i64),
    });
    for page_id in &page_ids {
        if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(*page_id) {
            dict.set("Parent", pages_id);
        }
    }
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Minimal DOCX with one paragraph per entry.
pub fn build_docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
        .collect();

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buffer);
        let options = zip::write::SimpleFileOptions::default();
        zip.start_file("word/document.xml", options).unwrap();
        write!(
            zip,
            r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        )
        .unwrap();
        zip.finish().unwrap();
    }
    buffer.into_inner()
}

/// Small grayscale-ish PNG.
pub fn build_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        let v = ((x + y) % 256) as u8;
        image::Rgb([v, v / 2, 255 - v])
    });
    let mut buffer = Cursor::new(Vec::new());
    img.write_to(&mut buffer, image::ImageFormat::Png).unwrap();
    buffer.into_inner()
}

/// OCR backend returning a fixed response and recording every request.
pub struct StaticOcr {
    pub response: OcrResponse,
    pub requests: Mutex<Vec<Vec<u8>>>,
}

impl StaticOcr {
    pub fn new(text: &str, confidence: f64) -> Arc<Self> {
        Arc::new(Self {
            response: OcrResponse {
                text: text.to_string(),
                confidence,
                pages: vec![OcrPage {
                    page_number: 1,
                    text: text.to_string(),
                    confidence: Some(confidence),
                }],
            },
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl Plugin for StaticOcr {
    fn name(&self) -> &str {
        "static-ocr"
    }
}

#[async_trait]
impl OcrBackend for StaticOcr {
    async fn recognize(&self, image_bytes: &[u8]) -> lexingest::Result<OcrResponse> {
        self.requests.lock().unwrap().push(image_bytes.to_vec());
        Ok(self.response.clone())
    }
}

/// Pipeline over an in-memory store that the test can inspect.
pub fn memory_pipeline(config: IngestConfig) -> (IngestPipeline, InMemoryBlobStore) {
    let store = InMemoryBlobStore::new();
    let pipeline = IngestPipeline::builder(config)
        .blob_store(Arc::new(store.clone()))
        .build()
        .unwrap();
    (pipeline, store)
}

/// Blob store that rejects uploads, either all of them or only those for
/// one file name. Accepted uploads go to an inner memory store.
pub struct FailingStore {
    only: Option<String>,
    inner: InMemoryBlobStore,
}

impl FailingStore {
    pub fn always() -> Arc<Self> {
        Arc::new(Self {
            only: None,
            inner: InMemoryBlobStore::new(),
        })
    }

    pub fn for_file(file_name: &str) -> Arc<Self> {
        Arc::new(Self {
            only: Some(file_name.to_string()),
            inner: InMemoryBlobStore::new(),
        })
    }

    pub fn stored(&self) -> usize {
        self.inner.len()
    }
}

impl Plugin for FailingStore {
    fn name(&self) -> &str {
        "failing-store"
    }
}

#[async_trait]
impl BlobStore for FailingStore {
    async fn upload(&self, bytes: &[u8], file_name: &str, mime_type: &str) -> lexingest::Result<UploadResult> {
        match &self.only {
            Some(only) if only != file_name => self.inner.upload(bytes, file_name, mime_type).await,
            _ => Err(IngestError::storage("bucket unreachable")),
        }
    }
}
