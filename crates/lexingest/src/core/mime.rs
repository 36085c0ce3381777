//! MIME type normalisation and document category resolution.
//!
//! A declared MIME type is resolved exactly once into a [`DocumentCategory`].
//! Everything downstream of the validator works with the category and never
//! matches MIME strings again.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const PDF_MIME_TYPE: &str = "application/pdf";
pub const LEGACY_WORD_MIME_TYPE: &str = "application/msword";
pub const DOCX_MIME_TYPE: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const PLAIN_TEXT_MIME_TYPE: &str = "text/plain";
pub const IMAGE_MIME_PREFIX: &str = "image/";

/// The four document families the pipeline knows how to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    Pdf,
    Word,
    Image,
    Text,
}

impl DocumentCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentCategory::Pdf => "pdf",
            DocumentCategory::Word => "word",
            DocumentCategory::Image => "image",
            DocumentCategory::Text => "text",
        }
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single MIME matching rule: exact type or type prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeRule {
    Exact(&'static str),
    Prefix(&'static str),
}

impl MimeRule {
    /// An exact rule also accepts the registered type followed by
    /// parameters (`text/plain; charset=utf-8`), but not a longer subtype.
    pub fn matches(&self, mime_type: &str) -> bool {
        match self {
            MimeRule::Exact(expected) => essence_matches(mime_type, expected),
            MimeRule::Prefix(prefix) => mime_type.starts_with(prefix),
        }
    }
}

/// `mime_type` is `expected`, optionally followed by `;` parameters.
fn essence_matches(mime_type: &str, expected: &str) -> bool {
    match mime_type.strip_prefix(expected) {
        Some(rest) => rest.is_empty() || rest.trim_start().starts_with(';'),
        None => false,
    }
}

/// Category table, tested in order; the first matching category wins.
pub const CATEGORY_TABLE: &[(DocumentCategory, &[MimeRule])] = &[
    (DocumentCategory::Pdf, &[MimeRule::Exact(PDF_MIME_TYPE)]),
    (
        DocumentCategory::Word,
        &[
            MimeRule::Exact(LEGACY_WORD_MIME_TYPE),
            MimeRule::Prefix("application/vnd.openxmlformats-officedocument.wordprocessingml"),
            MimeRule::Prefix("application/vnd.ms-word"),
        ],
    ),
    (DocumentCategory::Image, &[MimeRule::Prefix(IMAGE_MIME_PREFIX)]),
    (DocumentCategory::Text, &[MimeRule::Exact(PLAIN_TEXT_MIME_TYPE)]),
];

/// Lowercase and trim a declared MIME type.
///
/// Parameters are kept; exact rules skip over them when matching.
pub fn normalize_mime_type(mime_type: &str) -> String {
    mime_type.trim().to_ascii_lowercase()
}

/// Classify a (normalised) MIME type into its category.
pub fn classify(mime_type: &str) -> Option<DocumentCategory> {
    CATEGORY_TABLE
        .iter()
        .find(|(_, rules)| rules.iter().any(|rule| rule.matches(mime_type)))
        .map(|(category, _)| *category)
}

/// Check a MIME type against a configured allow-list entry.
///
/// Entries ending in `/*` or `/` are prefix rules. Everything else is exact,
/// with the same parameter tolerance as [`MimeRule::Exact`].
pub fn matches_allowed(mime_type: &str, entry: &str) -> bool {
    let entry = normalize_mime_type(entry);
    if let Some(prefix) = entry.strip_suffix('*') {
        return mime_type.starts_with(prefix);
    }
    if entry.ends_with('/') {
        return mime_type.starts_with(&entry);
    }
    essence_matches(mime_type, &entry)
}
