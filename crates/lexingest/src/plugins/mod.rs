//! Plugin seams of the pipeline.
//!
//! - [`DocumentExtractor`] - one format extractor per document category
//! - [`OcrBackend`] - external text recognition for images
//!
//! Blob stores implement [`Plugin`] too; their trait lives in
//! [`crate::storage`]. Plugins are injected into the pipeline builder rather
//! than registered globally.

pub mod extractor;
pub mod ocr;
pub mod traits;

pub use extractor::DocumentExtractor;
pub use ocr::{OcrBackend, OcrPage, OcrResponse};
pub use traits::Plugin;
