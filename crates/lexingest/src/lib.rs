//! lexingest - document ingestion pipeline
//!
//! lexingest accepts uploaded files, validates them, extracts their text with
//! a per-format strategy, enriches the text with a word count and language
//! guess, stores the original bytes and returns a [`ProcessedDocument`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use lexingest::{DocumentJob, IngestConfig, IngestPipeline};
//!
//! # async fn example() -> lexingest::Result<()> {
//! let pipeline = IngestPipeline::new(IngestConfig::default())?;
//! let bytes = std::fs::read("contract.pdf")?;
//! let doc = pipeline
//!     .process(DocumentJob::new("contract.pdf", "application/pdf", bytes))
//!     .await?;
//! println!("{} pages, confidence {}", doc.pages, doc.confidence);
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Core** (`core`): validation, dispatch, assembly, pipeline, configuration
//! - **Extractors** (`extractors`): PDF text layer, Word, image OCR, plain text
//! - **Plugins** (`plugins`): extractor and OCR backend traits
//! - **Storage** (`storage`): blob stores for the original uploads
//! - **Jobs** (`jobs`): per-document status and progress
//!
//! # Features
//!
//! - `http` (default): HTTP OCR backend and HTTP blob store

#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod extractors;
pub mod image;
pub mod jobs;
pub mod ocr;
pub mod plugins;
pub mod stopwords;
pub mod storage;
pub mod text;
pub mod types;

pub use error::{IngestError, Result, ValidationError};
pub use types::*;

pub use core::config::{IngestConfig, LanguageDetectionConfig, OcrServiceConfig, PreprocessingConfig, StorageConfig};
pub use core::io::{FileJob, JobSource};
pub use core::mime::DocumentCategory;
pub use core::pipeline::{IngestPipeline, IngestPipelineBuilder};
pub use core::validation::{ValidatedJob, Validator};

pub use jobs::{JobStatus, JobTracker, StatusReport};
pub use plugins::{DocumentExtractor, OcrBackend, OcrPage, OcrResponse, Plugin};
pub use storage::{BlobStore, InMemoryBlobStore, LocalBlobStore, UploadResult};
