//! Core orchestration.
//!
//! - **Validation** (`validation`): gatekeeping of submitted jobs
//! - **MIME** (`mime`): category table and allowed-type matching
//! - **Dispatch** (`dispatcher`): routing to extractors and the PDF fallback
//! - **Sources** (`io`): jobs loaded lazily, e.g. from the filesystem
//! - **Assembly** (`assembler`): building the final [`ProcessedDocument`](crate::ProcessedDocument)
//! - **Pipeline** (`pipeline`): single jobs, background submission and batches
//! - **Configuration** (`config`): file, discovery and environment loading

pub mod assembler;
pub mod batch_mode;
pub mod config;
pub mod dispatcher;
pub mod io;
pub mod mime;
pub mod pipeline;
pub mod validation;

pub use config::{IngestConfig, LanguageDetectionConfig, OcrServiceConfig, PreprocessingConfig, StorageConfig};
pub use dispatcher::ExtractionDispatcher;
pub use io::{FileJob, JobSource};
pub use mime::DocumentCategory;
pub use pipeline::{IngestPipeline, IngestPipelineBuilder};
pub use validation::{ValidatedJob, Validator};
