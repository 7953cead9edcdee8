use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use std::collections::{BTreeSet, HashMap};

pub const MIN_LIMIT: usize = 1;
pub const MAX_LIMIT: usize = 20;
pub const DEFAULT_LIMIT: usize = 5;
pub const MAX_QUERY_CHARS: usize = 500;

/// Metadata keys the scorer and the source extractor understand.
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ChunkMetadata {
    pub source: Option<String>,
    pub book: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub page: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentChunk {
    #[serde(default)]
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: ChunkMetadata,
}

impl DocumentChunk {
    pub fn new(id: impl Into<String>, content: impl Into<String>, metadata: ChunkMetadata) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata,
        }
    }

    pub fn source(&self) -> Option<&str> {
        self.metadata.source.as_deref()
    }
}

/// Book filter after validation.
///
/// A malformed filter is kept as [`BookFilter::Nothing`] so that it matches no
/// candidate instead of failing the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookFilter {
    Any,
    Contains(String),
    Nothing,
}

impl BookFilter {
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Any;
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_control) {
            return Self::Nothing;
        }

        Self::Contains(trimmed.to_lowercase())
    }

    pub fn admits(&self, chunk: &DocumentChunk) -> bool {
        match self {
            Self::Any => true,
            Self::Nothing => false,
            Self::Contains(needle) => chunk
                .source()
                .is_some_and(|source| source.to_lowercase().contains(needle.as_str())),
        }
    }

    pub fn as_substring(&self) -> Option<&str> {
        match self {
            Self::Contains(needle) => Some(needle.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SearchQuery {
    pub text: String,
    pub limit: usize,
    pub book_filter: Option<String>,
    pub include_sources: bool,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            limit: DEFAULT_LIMIT,
            book_filter: None,
            include_sources: true,
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = clamp_limit(limit);
        self
    }

    pub fn with_book_filter(mut self, filter: impl Into<String>) -> Self {
        self.book_filter = Some(filter.into());
        self
    }

    pub fn with_sources(mut self, include_sources: bool) -> Self {
        self.include_sources = include_sources;
        self
    }

    pub fn effective_limit(&self) -> usize {
        clamp_limit(self.limit)
    }

    /// Text echoed back in the response.
    pub fn display_text(&self) -> String {
        match self.book_filter.as_deref() {
            Some(filter) => format!("{} (filtered by: {})", self.text, filter),
            None => self.text.clone(),
        }
    }
}

pub fn clamp_limit(limit: usize) -> usize {
    limit.clamp(MIN_LIMIT, MAX_LIMIT)
}

/// Which scale a score is expressed in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ScoreKind {
    /// Similarity in [0, 1] derived from vector distance.
    Vector,
    /// Raw additive lexical weight.
    Lexical,
    /// Placeholder for an unmatched sample document.
    Fallback,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalPath {
    Vector,
    Lexical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredResult {
    pub document: DocumentChunk,
    pub score: f64,
    pub kind: ScoreKind,
}

#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<ScoredResult>,
    pub sources: BTreeSet<String>,
    pub path: RetrievalPath,
}

impl SearchResponse {
    pub fn total_results(&self) -> usize {
        self.results.len()
    }

    /// False when the results are only an unmatched sample of the corpus.
    pub fn matched(&self) -> bool {
        self.results
            .iter()
            .any(|result| result.kind != ScoreKind::Fallback)
    }

    pub fn to_api(&self) -> ApiSearchResponse {
        ApiSearchResponse {
            query: self.query.clone(),
            results: self
                .results
                .iter()
                .map(|result| ApiSearchResult {
                    content: result.document.content.clone(),
                    source: crate::sources::normalize_source(result.document.source()),
                    relevance_score: result.score,
                    score_kind: result.kind,
                })
                .collect(),
            total_results: self.total_results(),
            sources: self.sources.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiSearchResult {
    pub content: String,
    pub source: String,
    pub relevance_score: f64,
    pub score_kind: ScoreKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiSearchResponse {
    pub query: String,
    pub results: Vec<ApiSearchResult>,
    pub total_results: usize,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceListing {
    pub total_sources: usize,
    pub sources: Vec<String>,
    pub note: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CorpusStats {
    pub total_documents: usize,
    pub total_sources: usize,
    pub available_categories: Vec<String>,
    pub database_size: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthReport {
    pub status: String,
    pub version: String,
    pub database_status: String,
    pub total_documents: usize,
    pub embeddings: String,
    pub checked_at: DateTime<Utc>,
}

/// Free-form metadata as some corpus exports carry it.
pub type RawMetadata = HashMap<String, serde_json::Value>;

impl From<&RawMetadata> for ChunkMetadata {
    fn from(raw: &RawMetadata) -> Self {
        let text = |key: &str| {
            raw.get(key).and_then(|value| match value {
                serde_json::Value::String(text) => Some(text.clone()),
                serde_json::Value::Number(number) => Some(number.to_string()),
                _ => None,
            })
        };

        Self {
            source: text("source"),
            book: text("book"),
            author: text("author"),
            category: text("category"),
            page: raw
                .get("page")
                .and_then(serde_json::Value::as_u64)
                .and_then(|page| u32::try_from(page).ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_with_source(source: &str) -> DocumentChunk {
        DocumentChunk::new(
            "doc-1",
            "text",
            ChunkMetadata {
                source: Some(source.to_string()),
                ..Default::default()
            },
        )
    }

    #[test]
    fn limit_is_clamped() {
        assert_eq!(SearchQuery::new("q").with_limit(0).limit, 1);
        assert_eq!(SearchQuery::new("q").with_limit(50).limit, 20);
        assert_eq!(SearchQuery::new("q").with_limit(7).limit, 7);
    }

    #[test]
    fn book_filter_is_case_insensitive() {
        let filter = BookFilter::parse(Some("law_of_TORTS"));
        assert!(filter.admits(&chunk_with_source("Law_of_Torts.pdf")));
        assert!(!filter.admits(&chunk_with_source("Indian_Contract_Act.pdf")));
    }

    #[test]
    fn malformed_filter_matches_nothing() {
        assert_eq!(BookFilter::parse(Some("   ")), BookFilter::Nothing);
        assert_eq!(BookFilter::parse(Some("torts\u{0}")), BookFilter::Nothing);
        assert!(!BookFilter::Nothing.admits(&chunk_with_source("Law_of_Torts.pdf")));
    }

    #[test]
    fn filtered_query_is_echoed_with_filter() {
        let query = SearchQuery::new("negligence").with_book_filter("Law of Torts");
        assert_eq!(query.display_text(), "negligence (filtered by: Law of Torts)");
    }

    #[test]
    fn raw_metadata_accepts_numeric_fields() -> Result<(), serde_json::Error> {
        let raw: RawMetadata =
            serde_json::from_str(r#"{"source": "IPC.txt", "page": 12, "extra": true}"#)?;
        let metadata = ChunkMetadata::from(&raw);
        assert_eq!(metadata.source.as_deref(), Some("IPC.txt"));
        assert_eq!(metadata.page, Some(12));
        assert_eq!(metadata.book, None);
        Ok(())
    }
}
