//! Built-in format extractors, one per document category.

pub mod image;
pub mod pdf;
pub mod text;
pub mod word;

pub use self::image::ImageExtractor;
pub use self::pdf::PdfExtractor;
pub use self::text::PlainTextExtractor;
pub use self::word::WordExtractor;

/// Characters per estimated page for formats without real page boundaries.
pub const CHARS_PER_PAGE: usize = 3000;

/// Estimate the page count of `text` as `ceil(chars / 3000)`.
pub fn estimate_pages(text: &str) -> u32 {
    text.chars().count().div_ceil(CHARS_PER_PAGE) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_pages() {
        assert_eq!(estimate_pages(""), 0);
        assert_eq!(estimate_pages("a"), 1);
        assert_eq!(estimate_pages(&"a".repeat(3000)), 1);
        assert_eq!(estimate_pages(&"a".repeat(3001)), 2);
        assert_eq!(estimate_pages(&"é".repeat(3000)), 1);
    }
}
