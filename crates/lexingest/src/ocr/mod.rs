//! OCR backend implementations.
//!
//! The [`OcrBackend`](crate::plugins::OcrBackend) trait lives in `plugins`;
//! this module holds the concrete clients.

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::HttpOcrBackend;
