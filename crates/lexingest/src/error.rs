//! Error types for lexingest.
//!
//! Every fallible operation in the crate returns [`IngestError`]. The taxonomy
//! mirrors the stages of the ingestion pipeline:
//!
//! - `Validation` - the submitted file was rejected before any processing
//!   (missing, oversized, unsupported type). Never retried.
//! - `Extraction` - a format-specific extractor failed. Always carries the
//!   declared MIME type of the job and the underlying cause.
//! - `Storage` - the blob store upload failed after extraction succeeded.
//!   The whole job is reported as failed.
//! - `Ocr` - the recognition service failed. The dispatcher wraps these into
//!   `Extraction` before they reach the caller.
//!
//! # Error Handling Philosophy
//!
//! `IngestError::Io` (from `std::io::Error`) bubbles up unchanged. Application
//! errors are wrapped with context and keep their cause in `#[source]`.
//!
//! The PDF text-layer fallback is *not* an error: it is represented by
//! [`crate::types::ExtractionOutcome::Unavailable`].
use thiserror::Error;

/// Result type alias using `IngestError`.
pub type Result<T> = std::result::Result<T, IngestError>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Reason a submitted file was rejected by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no file provided")]
    MissingFile,

    #[error("file is {size_bytes} bytes, exceeding the {max_bytes} byte limit")]
    Oversized { size_bytes: u64, max_bytes: u64 },

    #[error("unsupported file type: {mime_type}")]
    UnsupportedType { mime_type: String },
}

impl ValidationError {
    /// Stable tag for the rejection reason.
    pub fn reason(&self) -> &'static str {
        match self {
            ValidationError::MissingFile => "missing-file",
            ValidationError::Oversized { .. } => "oversized",
            ValidationError::UnsupportedType { .. } => "unsupported-type",
        }
    }
}

/// Main error type for all lexingest operations.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Extraction error ({mime_type}): {message}")]
    Extraction {
        mime_type: String,
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("OCR error: {message}")]
    Ocr {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Image processing error: {message}")]
    ImageProcessing {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<BoxedSource>,
    },

    #[error("Unknown document: {0}")]
    UnknownDocument(String),

    #[error("Invalid status transition for {document_id}: {from} -> {to}")]
    InvalidTransition { document_id: String, from: String, to: String },

    #[error("Job timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<toml::de::Error> for IngestError {
    fn from(err: toml::de::Error) -> Self {
        IngestError::Config {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<toml::ser::Error> for IngestError {
    fn from(err: toml::ser::Error) -> Self {
        IngestError::Serialization {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml_ng::Error> for IngestError {
    fn from(err: serde_yaml_ng::Error) -> Self {
        IngestError::Config {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

macro_rules! error_constructor {
    ($name:ident, $with_source:ident, $variant:ident) => {
        #[doc = concat!("Create a `", stringify!($variant), "` error")]
        pub fn $name<S: Into<String>>(message: S) -> Self {
            Self::$variant {
                message: message.into(),
                source: None,
            }
        }

        #[doc = concat!("Create a `", stringify!($variant), "` error with source")]
        pub fn $with_source<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
            message: S,
            source: E,
        ) -> Self {
            Self::$variant {
                message: message.into(),
                source: Some(Box::new(source)),
            }
        }
    };
}

impl IngestError {
    error_constructor!(ocr, ocr_with_source, Ocr);
    error_constructor!(storage, storage_with_source, Storage);
    error_constructor!(image_processing, image_processing_with_source, ImageProcessing);
    error_constructor!(serialization, serialization_with_source, Serialization);
    error_constructor!(config, config_with_source, Config);

    /// Create an `Extraction` error for the given declared MIME type.
    pub fn extraction<M: Into<String>, S: Into<String>>(mime_type: M, message: S) -> Self {
        Self::Extraction {
            mime_type: mime_type.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create an `Extraction` error with source.
    pub fn extraction_with_source<M, S, E>(mime_type: M, message: S, source: E) -> Self
    where
        M: Into<String>,
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Extraction {
            mime_type: mime_type.into(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Stable snake-case tag for the error kind.
    ///
    /// Used as the implicit kind of batch failure entries.
    pub fn kind(&self) -> &'static str {
        match self {
            IngestError::Io(_) => "io",
            IngestError::Validation(_) => "validation",
            IngestError::Extraction { .. } => "extraction",
            IngestError::Ocr { .. } => "ocr",
            IngestError::Storage { .. } => "storage",
            IngestError::ImageProcessing { .. } => "image_processing",
            IngestError::Serialization { .. } => "serialization",
            IngestError::Config { .. } => "config",
            IngestError::UnknownDocument(_) => "unknown_document",
            IngestError::InvalidTransition { .. } => "invalid_transition",
            IngestError::Timeout { .. } => "timeout",
            IngestError::Other(_) => "other",
        }
    }
}
