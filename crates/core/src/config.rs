//! Search settings with sensible defaults.
//!
//! [`SearchSettings`] bounds query size, the vector attempt timeout and how
//! much of the corpus the source and stats listings sample.

use crate::error::SearchError;
use crate::models::MAX_QUERY_CHARS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchSettings {
    /// Longest accepted query, in characters.
    pub max_query_chars: usize,
    /// Budget for embedding the query plus the vector query, in milliseconds.
    pub vector_timeout_ms: u64,
    /// When false every search goes straight to the lexical scorer.
    pub use_embeddings: bool,
    /// Source listings scan `limit * source_sample_factor` documents...
    pub source_sample_factor: usize,
    /// ...but never more than this.
    pub source_sample_cap: usize,
    /// Documents scanned for the stats categories and sources.
    pub stats_sample_size: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_query_chars: MAX_QUERY_CHARS,
            vector_timeout_ms: 5_000,
            use_embeddings: true,
            source_sample_factor: 10,
            source_sample_cap: 1_000,
            stats_sample_size: 100,
        }
    }
}

impl SearchSettings {
    pub fn vector_timeout(&self) -> Duration {
        Duration::from_millis(self.vector_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_query_chars == 0 {
            return Err(SearchError::Config(
                "max_query_chars must be greater than 0".into(),
            ));
        }
        if self.vector_timeout_ms == 0 {
            return Err(SearchError::Config(
                "vector_timeout_ms must be greater than 0".into(),
            ));
        }
        if self.source_sample_factor == 0 || self.source_sample_cap == 0 {
            return Err(SearchError::Config(
                "source sampling must scan at least one document".into(),
            ));
        }
        if self.stats_sample_size == 0 {
            return Err(SearchError::Config(
                "stats_sample_size must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
