//! Image handling ahead of OCR.

pub mod preprocess;

pub use preprocess::{ImagePreprocessor, PreparedImage};
