//! Stop-word lists used by the language heuristic.
//!
//! Each list holds the most frequent function words of its language. The
//! lists are intentionally short: they only need to separate the supported
//! languages from each other on the first hundred tokens of a document.
//!
//! ```rust
//! use lexingest::stopwords::stopwords_for;
//! use lexingest::types::Language;
//!
//! assert!(stopwords_for(Language::English).contains("the"));
//! assert!(stopwords_for(Language::French).contains("les"));
//! ```

use crate::types::Language;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

const EN: &[&str] = &[
    "the", "and", "of", "to", "in", "is", "that", "it", "for", "was", "with", "as", "on", "be", "this", "are", "by",
    "at", "from", "or", "an", "have", "not", "which", "shall", "will", "any", "such", "all", "has", "been", "were",
    "their", "they", "we", "you", "he", "she", "its", "would",
];

const ES: &[&str] = &[
    "el", "la", "los", "las", "y", "en", "que", "es", "por", "con", "para", "una", "un", "del", "se", "al", "lo",
    "como", "más", "pero", "sus", "su", "fue", "son", "está", "este", "esta", "también", "entre", "cuando", "muy",
    "sin", "sobre", "ser", "hay", "dicho", "dicha",
];

const FR: &[&str] = &[
    "le", "la", "les", "et", "des", "est", "en", "un", "une", "du", "que", "qui", "dans", "pour", "pas", "sur",
    "au", "aux", "avec", "ce", "cette", "il", "elle", "sont", "par", "plus", "ont", "mais", "ou", "nous", "vous",
    "leur", "été", "être", "ces",
];

const DE: &[&str] = &[
    "der", "die", "das", "und", "ist", "ein", "eine", "nicht", "mit", "von", "zu", "den", "dem", "des", "auf",
    "für", "im", "sich", "auch", "als", "es", "wird", "werden", "sind", "bei", "oder", "aus", "nach", "wie", "wir",
    "sie", "ich", "einer", "durch",
];

const IT: &[&str] = &[
    "il", "lo", "gli", "della", "delle", "degli", "che", "è", "per", "non", "una", "con", "sono", "nel", "nella",
    "alla", "anche", "come", "più", "ma", "questo", "questa", "tra", "essere", "ha", "hanno", "dei", "di", "da",
    "sul", "dal",
];

const PT: &[&str] = &[
    "o", "os", "as", "um", "uma", "não", "que", "é", "com", "para", "por", "mais", "do", "da", "dos", "das", "no",
    "na", "nos", "em", "foi", "são", "também", "ao", "seu", "sua", "como", "mas", "ele", "ela", "isso", "está",
];

/// Stop-word sets keyed by language.
pub static STOPWORDS: Lazy<HashMap<Language, HashSet<&'static str>>> = Lazy::new(|| {
    Language::ALL
        .iter()
        .map(|&language| {
            let words = match language {
                Language::English => EN,
                Language::Spanish => ES,
                Language::French => FR,
                Language::German => DE,
                Language::Italian => IT,
                Language::Portuguese => PT,
            };
            (language, words.iter().copied().collect())
        })
        .collect()
});

/// Stop words of `language`.
pub fn stopwords_for(language: Language) -> &'static HashSet<&'static str> {
    // every Language variant is inserted above
    &STOPWORDS[&language]
}
