//! Word count and language heuristic.
//!
//! The language tag is a best-effort signal: the first `sample_tokens`
//! lowercase tokens are scored against each stop-word list and the single
//! best language wins. Ties and texts with no stop words at all report
//! English. It is not a language identification system.

use crate::core::config::LanguageDetectionConfig;
use crate::stopwords::stopwords_for;
use crate::types::Language;
use serde::{Deserialize, Serialize};

/// Output of [`MetadataEnricher::enrich`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrichment {
    pub word_count: usize,
    pub language: Language,
}

/// Derives word count and language from extracted text.
#[derive(Debug, Clone)]
pub struct MetadataEnricher {
    sample_tokens: usize,
}

impl MetadataEnricher {
    pub fn new(config: &LanguageDetectionConfig) -> Self {
        Self {
            sample_tokens: config.sample_tokens,
        }
    }

    pub fn enrich(&self, text: &str) -> Enrichment {
        Enrichment {
            word_count: word_count(text),
            language: detect_language(text, self.sample_tokens),
        }
    }
}

impl Default for MetadataEnricher {
    fn default() -> Self {
        Self::new(&LanguageDetectionConfig::default())
    }
}

/// Number of non-empty whitespace-delimited tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Score the first `sample_tokens` tokens against every stop-word list.
pub fn detect_language(text: &str, sample_tokens: usize) -> Language {
    let tokens: Vec<String> = text
        .split_whitespace()
        .take(sample_tokens)
        .map(|token| token.trim_matches(|c: char| !c.is_alphabetic()).to_lowercase())
        .filter(|token| !token.is_empty())
        .collect();

    let mut best = Language::default();
    let mut best_score = 0usize;
    let mut tied = false;

    for language in Language::ALL {
        let stopwords = stopwords_for(language);
        let score = tokens.iter().filter(|token| stopwords.contains(token.as_str())).count();

        if score > best_score {
            best = language;
            best_score = score;
            tied = false;
        } else if score == best_score && score > 0 {
            tied = true;
        }
    }

    if best_score == 0 || tied {
        Language::default()
    } else {
        best
    }
}
