//! Deterministic lexical ranking used when vector retrieval is disabled or
//! fails.
//!
//! Every candidate accumulates additive points from five signals: exact
//! phrase occurrences, token overlap, partial (substring) word matches,
//! metadata field hits and a small legal synonym table. Scores are raw
//! weights and are never normalized to [0, 1].

use crate::error::SearchError;
use crate::models::{BookFilter, DocumentChunk, ScoreKind, ScoredResult};
use crate::normalize::{
    normalize_query, phrase_haystack, word_set, NormalizedQuery, DEFAULT_STOP_WORDS,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LexicalWeights {
    pub phrase: f64,
    pub extra_phrase_occurrence: f64,
    pub token_overlap: f64,
    pub consecutive_tokens: f64,
    pub partial_match: f64,
    pub category: f64,
    pub book: f64,
    pub source: f64,
    pub synonym: f64,
}

impl Default for LexicalWeights {
    fn default() -> Self {
        Self {
            phrase: 20.0,
            extra_phrase_occurrence: 5.0,
            token_overlap: 3.0,
            consecutive_tokens: 10.0,
            partial_match: 1.0,
            category: 8.0,
            book: 6.0,
            source: 4.0,
            synonym: 3.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LexicalConfig {
    pub stop_words: Vec<String>,
    /// Head term to the words that count as a match for it.
    pub synonyms: BTreeMap<String, Vec<String>>,
    pub weights: LexicalWeights,
    /// Only tokens and content words longer than this take part in partial
    /// matching.
    pub partial_min_chars: usize,
    /// Score given to every document of an unmatched sample.
    pub fallback_score: f64,
}

impl Default for LexicalConfig {
    fn default() -> Self {
        let synonyms = [
            ("constitution", &["constitutional", "constitution"][..]),
            ("rights", &["fundamental", "basic", "human"]),
            ("law", &["legal", "statute", "act"]),
            ("court", &["judicial", "tribunal"]),
            ("contract", &["agreement", "obligation"]),
            ("criminal", &["penal", "offence", "crime"]),
            ("tort", &["civil", "liability", "damages"]),
        ]
        .into_iter()
        .map(|(head, words)| {
            (
                head.to_string(),
                words.iter().map(|word| word.to_string()).collect(),
            )
        })
        .collect();

        Self {
            stop_words: DEFAULT_STOP_WORDS.iter().map(|word| word.to_string()).collect(),
            synonyms,
            weights: LexicalWeights::default(),
            partial_min_chars: 3,
            fallback_score: 0.0,
        }
    }
}

impl LexicalConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, SearchError> {
        let raw = std::fs::read_to_string(path).map_err(|error| {
            SearchError::Config(format!("cannot read {}: {error}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        let weights = self.weights;
        let all = [
            weights.phrase,
            weights.extra_phrase_occurrence,
            weights.token_overlap,
            weights.consecutive_tokens,
            weights.partial_match,
            weights.category,
            weights.book,
            weights.source,
            weights.synonym,
        ];
        if all.iter().any(|weight| !weight.is_finite() || *weight < 0.0) {
            return Err(SearchError::Config(
                "lexical weights must be finite and non-negative".into(),
            ));
        }
        if !self.fallback_score.is_finite() {
            return Err(SearchError::Config("fallback_score must be finite".into()));
        }
        Ok(())
    }
}

/// Pure function of (query, corpus, config).
#[derive(Debug, Clone)]
pub struct LexicalScorer {
    config: LexicalConfig,
    stop_words: HashSet<String>,
}

impl Default for LexicalScorer {
    fn default() -> Self {
        Self::new(LexicalConfig::default())
    }
}

impl LexicalScorer {
    pub fn new(config: LexicalConfig) -> Self {
        let stop_words = config
            .stop_words
            .iter()
            .map(|word| word.to_lowercase())
            .collect();
        Self { config, stop_words }
    }

    pub fn config(&self) -> &LexicalConfig {
        &self.config
    }

    pub fn normalize(&self, raw: &str) -> NormalizedQuery {
        normalize_query(raw, &self.stop_words)
    }

    pub fn score(&self, query: &NormalizedQuery, chunk: &DocumentChunk) -> f64 {
        let weights = &self.config.weights;
        let content = chunk.content.to_lowercase();
        let words = word_set(&content);
        let mut score = 0.0;

        if !query.phrase.is_empty() {
            let haystack = phrase_haystack(&content, query, &self.stop_words);
            let occurrences = haystack.matches(query.phrase.as_str()).count();
            if occurrences > 0 {
                score += weights.phrase;
                score += weights.extra_phrase_occurrence * (occurrences - 1) as f64;
            }
        }

        if query.tokens.is_empty() {
            return score;
        }

        let overlap = query
            .tokens
            .iter()
            .filter(|token| words.contains(token.as_str()))
            .count();
        score += weights.token_overlap * overlap as f64;

        if content.contains(query.sorted_token_run().as_str()) {
            score += weights.consecutive_tokens;
        }

        let long_enough = |word: &&String| word.chars().count() > self.config.partial_min_chars;
        let long_words: Vec<&String> = words.iter().filter(long_enough).collect();
        for token in query.tokens.iter().filter(long_enough) {
            let partial = long_words
                .iter()
                .filter(|word| word.contains(token.as_str()) || token.contains(word.as_str()))
                .count();
            score += weights.partial_match * partial as f64;
        }

        let metadata = &chunk.metadata;
        for (field, weight) in [
            (&metadata.category, weights.category),
            (&metadata.book, weights.book),
            (&metadata.source, weights.source),
        ] {
            let Some(value) = field.as_deref() else {
                continue;
            };
            let value = value.to_lowercase();
            let hits = query
                .tokens
                .iter()
                .filter(|token| value.contains(token.as_str()))
                .count();
            score += weight * hits as f64;
        }

        for (head, synonyms) in &self.config.synonyms {
            if !query.tokens.contains(head) {
                continue;
            }
            let hits = synonyms
                .iter()
                .filter(|synonym| words.contains(synonym.as_str()))
                .count();
            score += weights.synonym * hits as f64;
        }

        score
    }

    /// Ranks `corpus` for `query`, keeping at most `limit` results.
    ///
    /// When nothing scores above zero the first `limit` admitted documents
    /// are returned as a [`ScoreKind::Fallback`] sample.
    pub fn rank(
        &self,
        query: &NormalizedQuery,
        filter: &BookFilter,
        corpus: &[DocumentChunk],
        limit: usize,
    ) -> Vec<ScoredResult> {
        let admitted = corpus.iter().filter(|chunk| filter.admits(chunk));

        let mut scored: Vec<ScoredResult> = admitted
            .clone()
            .filter_map(|chunk| {
                let score = self.score(query, chunk);
                (score > 0.0).then(|| ScoredResult {
                    document: chunk.clone(),
                    score,
                    kind: ScoreKind::Lexical,
                })
            })
            .collect();

        if scored.is_empty() {
            return admitted
                .take(limit)
                .map(|chunk| ScoredResult {
                    document: chunk.clone(),
                    score: self.config.fallback_score,
                    kind: ScoreKind::Fallback,
                })
                .collect();
        }

        // stable: ties keep corpus order
        scored.sort_by(|left, right| right.score.total_cmp(&left.score));
        scored.truncate(limit);
        scored
    }
}
