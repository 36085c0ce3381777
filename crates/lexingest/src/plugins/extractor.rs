//! Document extractor plugin trait.

use crate::Result;
use crate::core::mime::DocumentCategory;
use crate::plugins::Plugin;
use crate::types::ExtractionResult;
use async_trait::async_trait;

/// Trait for format extractors.
///
/// An extractor serves exactly one [`DocumentCategory`]. It never decides
/// fallbacks; it reports faults as errors and leaves policy to
/// [`ExtractionDispatcher`](crate::core::dispatcher::ExtractionDispatcher).
///
/// # Example
///
/// ```rust
/// use lexingest::plugins::{Plugin, DocumentExtractor};
/// use lexingest::core::mime::DocumentCategory;
/// use lexingest::types::{ExtractionMethod, ExtractionResult};
/// use lexingest::Result;
/// use async_trait::async_trait;
///
/// struct ShoutingTextExtractor;
///
/// impl Plugin for ShoutingTextExtractor {
///     fn name(&self) -> &str { "shouting-text" }
/// }
///
/// #[async_trait]
/// impl DocumentExtractor for ShoutingTextExtractor {
///     fn category(&self) -> DocumentCategory {
///         DocumentCategory::Text
///     }
///
///     async fn extract_bytes(&self, content: &[u8], _mime_type: &str) -> Result<ExtractionResult> {
///         let text = String::from_utf8_lossy(content).to_uppercase();
///         Ok(ExtractionResult::new(text, 1.0, 1, ExtractionMethod::PlainTextUtf8))
///     }
/// }
/// ```
#[async_trait]
pub trait DocumentExtractor: Plugin {
    /// Category this extractor serves.
    fn category(&self) -> DocumentCategory;

    /// Extract text from `content`.
    ///
    /// `mime_type` is the declared type of the job, passed through for error
    /// context and for extractors that handle several container variants.
    async fn extract_bytes(&self, content: &[u8], mime_type: &str) -> Result<ExtractionResult>;
}
