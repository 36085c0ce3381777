//! Text analysis over extracted content.

pub mod enrichment;

pub use enrichment::{Enrichment, MetadataEnricher, detect_language, word_count};
