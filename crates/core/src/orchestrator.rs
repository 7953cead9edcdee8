use crate::aggregate::rank_vector_matches;
use crate::config::SearchSettings;
use crate::embeddings::Embedder;
use crate::lexical::LexicalScorer;
use crate::models::{
    BookFilter, CorpusStats, HealthReport, RetrievalPath, ScoredResult, SearchResponse,
    SourceListing,
};
use crate::sources::{distinct_sources, extract_sources};
use crate::traits::{Corpus, VectorIndex, VectorMatch};
use crate::{RetrievalError, SearchError, SearchQuery};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Stand-in index for coordinators built without vector retrieval.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVectorIndex;

#[async_trait]
impl VectorIndex for NoVectorIndex {
    async fn search_vector(
        &self,
        _query_vector: &[f32],
        _limit: usize,
        _book_filter: Option<&str>,
    ) -> Result<Vec<VectorMatch>, RetrievalError> {
        Err(RetrievalError::Unavailable(
            "vector retrieval is not configured".to_string(),
        ))
    }
}

/// Steps of a single search.
///
/// ```text
/// VectorAttempt ──DimensionMismatch──► Recreating ──ok──► VectorAttempt (recreated)
///       │                                  │                    │
///       └────────── any other failure ─────┴─── any failure ────┴──► LexicalFallback
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalState {
    VectorAttempt { recreated: bool },
    Recreating,
    LexicalFallback,
}

impl RetrievalState {
    pub fn on_vector_error(self, error: &RetrievalError) -> Self {
        match (self, error) {
            (
                Self::VectorAttempt { recreated: false },
                RetrievalError::DimensionMismatch { .. },
            ) => Self::Recreating,
            _ => Self::LexicalFallback,
        }
    }

    pub fn on_recreated(self, outcome: &Result<(), RetrievalError>) -> Self {
        match (self, outcome) {
            (Self::Recreating, Ok(())) => Self::VectorAttempt { recreated: true },
            _ => Self::LexicalFallback,
        }
    }
}

struct VectorBackend<V> {
    index: V,
    embedder: Arc<dyn Embedder>,
}

pub struct SearchCoordinator<C, V = NoVectorIndex>
where
    C: Corpus,
    V: VectorIndex,
{
    corpus: C,
    vector: Option<VectorBackend<V>>,
    scorer: LexicalScorer,
    settings: SearchSettings,
}

impl<C> SearchCoordinator<C, NoVectorIndex>
where
    C: Corpus + Send + Sync,
{
    /// Lexical-only coordinator.
    pub fn new(corpus: C, scorer: LexicalScorer, settings: SearchSettings) -> Self {
        Self {
            corpus,
            vector: None,
            scorer,
            settings,
        }
    }
}

impl<C, V> SearchCoordinator<C, V>
where
    C: Corpus + Send + Sync,
    V: VectorIndex + Send + Sync,
{
    pub fn with_vector<W>(self, index: W, embedder: Arc<dyn Embedder>) -> SearchCoordinator<C, W>
    where
        W: VectorIndex + Send + Sync,
    {
        SearchCoordinator {
            corpus: self.corpus,
            vector: Some(VectorBackend { index, embedder }),
            scorer: self.scorer,
            settings: self.settings,
        }
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    fn embeddings_enabled(&self) -> bool {
        self.settings.use_embeddings && self.vector.is_some()
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        let request_id = Uuid::new_v4();
        self.search_inner(query)
            .instrument(info_span!("search", %request_id))
            .await
    }

    async fn search_inner(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        let text = query.text.trim();
        if text.is_empty() {
            return Err(SearchError::InvalidQuery("query is empty".to_string()));
        }
        let length = text.chars().count();
        if length > self.settings.max_query_chars {
            return Err(SearchError::InvalidQuery(format!(
                "query has {length} characters, the limit is {}",
                self.settings.max_query_chars
            )));
        }

        let limit = query.effective_limit();
        let filter = BookFilter::parse(query.book_filter.as_deref());
        if filter == BookFilter::Nothing {
            debug!(filter = ?query.book_filter, "book filter is malformed, matching nothing");
        }

        let mut state = if self.embeddings_enabled() && filter != BookFilter::Nothing {
            RetrievalState::VectorAttempt { recreated: false }
        } else {
            RetrievalState::LexicalFallback
        };

        let (results, path) = loop {
            state = match state {
                RetrievalState::VectorAttempt { .. } => {
                    match self.attempt_vector(text, limit, &filter).await {
                        Ok(results) if !results.is_empty() => {
                            break (results, RetrievalPath::Vector)
                        }
                        Ok(_) => {
                            debug!("vector index returned no usable matches");
                            RetrievalState::LexicalFallback
                        }
                        Err(error) => {
                            let next = state.on_vector_error(&error);
                            warn!(%error, ?next, "vector retrieval failed");
                            next
                        }
                    }
                }
                RetrievalState::Recreating => {
                    let outcome = self.recreate_index().await;
                    if let Err(error) = &outcome {
                        warn!(%error, "vector index recreation failed");
                    }
                    state.on_recreated(&outcome)
                }
                RetrievalState::LexicalFallback => {
                    break (self.lexical(text, limit, &filter).await?, RetrievalPath::Lexical);
                }
            };
        };

        let sources = extract_sources(&results, query.include_sources);
        info!(
            ?path,
            limit,
            results = results.len(),
            sources = sources.len(),
            "search complete"
        );

        Ok(SearchResponse {
            query: query.display_text(),
            results,
            sources,
            path,
        })
    }

    async fn attempt_vector(
        &self,
        text: &str,
        limit: usize,
        filter: &BookFilter,
    ) -> Result<Vec<ScoredResult>, RetrievalError> {
        let Some(backend) = &self.vector else {
            return Err(RetrievalError::Unavailable(
                "vector retrieval is not configured".to_string(),
            ));
        };

        let timeout = self.settings.vector_timeout();
        let attempt = async {
            let query_vector = backend.embedder.embed(text).await?;
            let matches = backend
                .index
                .search_vector(&query_vector, limit, filter.as_substring())
                .await?;
            Ok::<_, RetrievalError>(matches)
        };

        let matches = tokio::time::timeout(timeout, attempt)
            .await
            .map_err(|_| {
                RetrievalError::Unavailable(format!("vector attempt timed out after {timeout:?}"))
            })??;

        let matches = matches
            .into_iter()
            .filter(|found| filter.admits(&found.document))
            .collect();
        Ok(rank_vector_matches(matches, limit))
    }

    async fn recreate_index(&self) -> Result<(), RetrievalError> {
        let Some(backend) = &self.vector else {
            return Err(RetrievalError::Unavailable(
                "vector retrieval is not configured".to_string(),
            ));
        };

        let timeout = self.settings.vector_timeout();
        tokio::time::timeout(timeout, backend.index.recreate())
            .await
            .map_err(|_| {
                RetrievalError::Unavailable(format!("index recreation timed out after {timeout:?}"))
            })?
    }

    async fn lexical(
        &self,
        text: &str,
        limit: usize,
        filter: &BookFilter,
    ) -> Result<Vec<ScoredResult>, SearchError> {
        let corpus = self.corpus.snapshot().await?;
        let normalized = self.scorer.normalize(text);
        Ok(self.scorer.rank(&normalized, filter, &corpus, limit))
    }

    /// Sorted, normalized sources from a sample of the corpus.
    pub async fn list_sources(&self, limit: usize) -> Result<SourceListing, SearchError> {
        let limit = limit.max(1);
        let sample_size = limit
            .saturating_mul(self.settings.source_sample_factor)
            .min(self.settings.source_sample_cap);

        let corpus = self.corpus.snapshot().await?;
        let sources = distinct_sources(corpus.iter().take(sample_size));

        Ok(SourceListing {
            total_sources: sources.len(),
            sources: sources.into_iter().take(limit).collect(),
            note: concat!(
                "This is a sample of available sources. ",
                "More sources may be available in the full corpus."
            )
            .to_string(),
        })
    }

    pub async fn stats(&self) -> Result<CorpusStats, SearchError> {
        let corpus = self.corpus.snapshot().await?;
        let sample = &corpus[..corpus.len().min(self.settings.stats_sample_size)];

        let categories: BTreeSet<String> = sample
            .iter()
            .filter_map(|chunk| chunk.metadata.category.clone())
            .collect();

        Ok(CorpusStats {
            total_documents: corpus.len(),
            total_sources: distinct_sources(sample).len(),
            available_categories: categories.into_iter().collect(),
            database_size: format!("{} documents", group_thousands(corpus.len())),
        })
    }

    /// Never fails; an unreachable corpus is reported as unhealthy.
    pub async fn health(&self) -> HealthReport {
        let embeddings = if self.embeddings_enabled() {
            "enabled"
        } else {
            "disabled"
        };

        let (status, database_status, total_documents) = match self.corpus.count().await {
            Ok(count) => ("healthy", "connected", count),
            Err(error) => {
                warn!(%error, "health check could not reach the corpus");
                ("unhealthy", "unavailable", 0)
            }
        };

        HealthReport {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database_status: database_status.to_string(),
            total_documents,
            embeddings: embeddings.to_string(),
            checked_at: Utc::now(),
        }
    }
}

/// Comma thousands separators (`2,600,000`) for the human-readable
/// `database_size` field, which clients display as-is.
fn group_thousands(value: usize) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (index, ch) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::CharacterNgramEmbedder;
    use crate::models::{ChunkMetadata, DocumentChunk, ScoreKind};
    use crate::stores::memory::{sample_chunks, InMemoryCorpus, InMemoryVectorIndex};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeVectorIndex {
        outcomes: std::sync::Mutex<Vec<Result<Vec<VectorMatch>, RetrievalError>>>,
        calls: AtomicUsize,
        recreations: AtomicUsize,
        recreate_ok: bool,
        delay: Option<Duration>,
    }

    impl FakeVectorIndex {
        fn new(outcomes: Vec<Result<Vec<VectorMatch>, RetrievalError>>) -> Self {
            Self {
                outcomes: std::sync::Mutex::new(outcomes),
                calls: AtomicUsize::new(0),
                recreations: AtomicUsize::new(0),
                recreate_ok: true,
                delay: None,
            }
        }
    }

    #[async_trait]
    impl VectorIndex for FakeVectorIndex {
        async fn search_vector(
            &self,
            _query_vector: &[f32],
            _limit: usize,
            _book_filter: Option<&str>,
        ) -> Result<Vec<VectorMatch>, RetrievalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let mut outcomes = self
                .outcomes
                .lock()
                .map_err(|_| RetrievalError::Unavailable("poisoned".to_string()))?;
            if outcomes.is_empty() {
                return Err(RetrievalError::Unavailable("no scripted outcome".to_string()));
            }
            outcomes.remove(0)
        }

        async fn recreate(&self) -> Result<(), RetrievalError> {
            self.recreations.fetch_add(1, Ordering::SeqCst);
            if self.recreate_ok {
                Ok(())
            } else {
                Err(RetrievalError::Unavailable("cannot rebuild".to_string()))
            }
        }
    }

    struct BrokenCorpus;

    #[async_trait]
    impl Corpus for BrokenCorpus {
        async fn snapshot(&self) -> Result<Arc<Vec<DocumentChunk>>, SearchError> {
            Err(SearchError::CorpusUnavailable("disk detached".to_string()))
        }
    }

    fn lexical_only() -> SearchCoordinator<InMemoryCorpus> {
        SearchCoordinator::new(
            InMemoryCorpus::sample(),
            LexicalScorer::default(),
            SearchSettings::default(),
        )
    }

    fn with_fake(index: FakeVectorIndex) -> SearchCoordinator<InMemoryCorpus, FakeVectorIndex> {
        lexical_only().with_vector(index, Arc::new(CharacterNgramEmbedder::default()))
    }

    fn matches(distances: &[(&str, f64)]) -> Vec<VectorMatch> {
        distances
            .iter()
            .map(|(id, distance)| VectorMatch {
                document: DocumentChunk::new(
                    *id,
                    "vector hit",
                    ChunkMetadata {
                        source: Some(format!("{id}.txt")),
                        ..Default::default()
                    },
                ),
                distance: *distance,
            })
            .collect()
    }

    #[test]
    fn mismatch_recreates_once() {
        let mismatch = RetrievalError::DimensionMismatch {
            expected: 768,
            actual: 128,
        };
        let unavailable = RetrievalError::Unavailable("down".to_string());

        let first = RetrievalState::VectorAttempt { recreated: false };
        assert_eq!(first.on_vector_error(&mismatch), RetrievalState::Recreating);
        assert_eq!(first.on_vector_error(&unavailable), RetrievalState::LexicalFallback);

        let retried = RetrievalState::Recreating.on_recreated(&Ok(()));
        assert_eq!(retried, RetrievalState::VectorAttempt { recreated: true });
        assert_eq!(retried.on_vector_error(&mismatch), RetrievalState::LexicalFallback);
        assert_eq!(
            RetrievalState::Recreating.on_recreated(&Err(unavailable)),
            RetrievalState::LexicalFallback
        );
    }

    #[tokio::test]
    async fn lexical_path_ranks_tort_chunk_first() -> Result<(), SearchError> {
        let response = lexical_only()
            .search(&SearchQuery::new("tort liability"))
            .await?;

        assert_eq!(response.path, RetrievalPath::Lexical);
        assert!(response.matched());
        assert_eq!(response.results[0].document.source(), Some("Law_of_Torts.pdf"));
        assert!(response.sources.contains("Law_of_Torts.pdf"));
        Ok(())
    }

    #[tokio::test]
    async fn unmatched_query_returns_fallback_sample() -> Result<(), SearchError> {
        let coordinator = lexical_only();

        let response = coordinator
            .search(&SearchQuery::new("xyz123nonexistent").with_limit(3))
            .await?;
        assert_eq!(response.total_results(), 3);
        assert!(!response.matched());
        assert!(response.sources.is_empty());

        let response = coordinator
            .search(&SearchQuery::new("xyz123nonexistent").with_limit(20))
            .await?;
        assert_eq!(response.total_results(), 5);

        let body = response.to_api();
        assert!(body.sources.is_empty());
        assert!(body.results.iter().all(|result| {
            result.score_kind == ScoreKind::Fallback && result.relevance_score == 0.0
        }));
        Ok(())
    }

    #[tokio::test]
    async fn vector_results_are_preferred_and_normalized() -> Result<(), SearchError> {
        let index = FakeVectorIndex::new(vec![Ok(matches(&[("a", 0.2), ("b", 0.4), ("c", 0.8)]))]);
        let response = with_fake(index).search(&SearchQuery::new("rights")).await?;

        assert_eq!(response.path, RetrievalPath::Vector);
        let scores: Vec<f64> = response.results.iter().map(|result| result.score).collect();
        assert_eq!(scores, vec![0.75, 0.5, 0.0]);
        assert_eq!(
            response.sources.iter().cloned().collect::<Vec<_>>(),
            vec!["a.pdf", "b.pdf", "c.pdf"]
        );
        Ok(())
    }

    #[tokio::test]
    async fn unavailable_index_falls_back_without_retry() -> Result<(), SearchError> {
        let index = FakeVectorIndex::new(vec![Err(RetrievalError::Unavailable("down".into()))]);
        let coordinator = with_fake(index);
        let response = coordinator.search(&SearchQuery::new("tort liability")).await?;

        assert_eq!(response.path, RetrievalPath::Lexical);
        let backend = coordinator.vector.as_ref().map(|backend| &backend.index);
        assert_eq!(backend.map(|index| index.calls.load(Ordering::SeqCst)), Some(1));
        assert_eq!(backend.map(|index| index.recreations.load(Ordering::SeqCst)), Some(0));
        Ok(())
    }

    #[tokio::test]
    async fn mismatch_recreates_then_retries_once() -> Result<(), SearchError> {
        let mismatch = RetrievalError::DimensionMismatch {
            expected: 768,
            actual: 128,
        };
        let index = FakeVectorIndex::new(vec![Err(mismatch), Ok(matches(&[("a", 0.3)]))]);
        let coordinator = with_fake(index);
        let response = coordinator.search(&SearchQuery::new("rights")).await?;

        assert_eq!(response.path, RetrievalPath::Vector);
        let backend = coordinator.vector.as_ref().map(|backend| &backend.index);
        assert_eq!(backend.map(|index| index.calls.load(Ordering::SeqCst)), Some(2));
        assert_eq!(backend.map(|index| index.recreations.load(Ordering::SeqCst)), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn repeated_mismatch_ends_in_lexical_fallback() -> Result<(), SearchError> {
        let mismatch = RetrievalError::DimensionMismatch {
            expected: 768,
            actual: 128,
        };
        let index = FakeVectorIndex::new(vec![Err(mismatch.clone()), Err(mismatch)]);
        let coordinator = with_fake(index);
        let response = coordinator.search(&SearchQuery::new("rights")).await?;

        assert_eq!(response.path, RetrievalPath::Lexical);
        let backend = coordinator.vector.as_ref().map(|backend| &backend.index);
        assert_eq!(backend.map(|index| index.calls.load(Ordering::SeqCst)), Some(2));
        Ok(())
    }

    #[tokio::test]
    async fn failed_recreation_falls_back() -> Result<(), SearchError> {
        let mut index = FakeVectorIndex::new(vec![Err(RetrievalError::DimensionMismatch {
            expected: 768,
            actual: 128,
        })]);
        index.recreate_ok = false;
        let coordinator = with_fake(index);
        let response = coordinator.search(&SearchQuery::new("rights")).await?;

        assert_eq!(response.path, RetrievalPath::Lexical);
        let backend = coordinator.vector.as_ref().map(|backend| &backend.index);
        assert_eq!(backend.map(|index| index.calls.load(Ordering::SeqCst)), Some(1));
        Ok(())
    }

    #[tokio::test]
    async fn slow_index_times_out_into_lexical() -> Result<(), SearchError> {
        let mut index = FakeVectorIndex::new(vec![Ok(matches(&[("a", 0.1)]))]);
        index.delay = Some(Duration::from_millis(200));
        let settings = SearchSettings {
            vector_timeout_ms: 20,
            ..Default::default()
        };
        let coordinator =
            SearchCoordinator::new(InMemoryCorpus::sample(), LexicalScorer::default(), settings)
                .with_vector(index, Arc::new(CharacterNgramEmbedder::default()));

        let response = coordinator.search(&SearchQuery::new("tort liability")).await?;
        assert_eq!(response.path, RetrievalPath::Lexical);
        Ok(())
    }

    #[tokio::test]
    async fn empty_vector_result_uses_lexical() -> Result<(), SearchError> {
        let index = FakeVectorIndex::new(vec![Ok(Vec::new())]);
        let response = with_fake(index).search(&SearchQuery::new("criminal")).await?;
        assert_eq!(response.path, RetrievalPath::Lexical);
        assert_eq!(response.results[0].document.id, "doc_4");
        Ok(())
    }

    #[tokio::test]
    async fn disabled_embeddings_never_touch_the_index() -> Result<(), SearchError> {
        let settings = SearchSettings {
            use_embeddings: false,
            ..Default::default()
        };
        let coordinator =
            SearchCoordinator::new(InMemoryCorpus::sample(), LexicalScorer::default(), settings)
                .with_vector(
                    FakeVectorIndex::new(Vec::new()),
                    Arc::new(CharacterNgramEmbedder::default()),
                );

        let response = coordinator.search(&SearchQuery::new("rights")).await?;
        assert_eq!(response.path, RetrievalPath::Lexical);
        let backend = coordinator.vector.as_ref().map(|backend| &backend.index);
        assert_eq!(backend.map(|index| index.calls.load(Ordering::SeqCst)), Some(0));
        assert_eq!(coordinator.health().await.embeddings, "disabled");
        Ok(())
    }

    #[tokio::test]
    async fn in_memory_index_answers_through_vector_path(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let embedder: Arc<dyn Embedder> = Arc::new(CharacterNgramEmbedder::default());
        let corpus = InMemoryCorpus::sample();
        let index = InMemoryVectorIndex::build(corpus.clone(), Arc::clone(&embedder)).await?;
        let coordinator =
            SearchCoordinator::new(corpus, LexicalScorer::default(), SearchSettings::default())
                .with_vector(index, embedder);

        let response = coordinator
            .search(&SearchQuery::new("contract agreement obligations").with_limit(2))
            .await?;
        assert_eq!(response.path, RetrievalPath::Vector);
        assert_eq!(response.total_results(), 2);
        for result in &response.results {
            assert!((0.0..=1.0).contains(&result.score));
            assert_eq!((result.score * 1000.0).round() / 1000.0, result.score);
        }
        Ok(())
    }

    #[tokio::test]
    async fn vector_results_honour_book_filter() -> Result<(), SearchError> {
        let index = FakeVectorIndex::new(vec![Ok(matches(&[("Penal_Code", 0.1), ("Torts", 0.2)]))]);
        let query = SearchQuery::new("crime").with_book_filter("penal");
        let response = with_fake(index).search(&query).await?;

        assert_eq!(response.path, RetrievalPath::Vector);
        assert_eq!(response.total_results(), 1);
        assert_eq!(response.query, "crime (filtered by: penal)");
        Ok(())
    }

    #[tokio::test]
    async fn malformed_filter_matches_nothing() -> Result<(), SearchError> {
        let index = FakeVectorIndex::new(vec![Ok(matches(&[("a", 0.1)]))]);
        let coordinator = with_fake(index);
        let response = coordinator
            .search(&SearchQuery::new("rights").with_book_filter("   "))
            .await?;

        assert_eq!(response.total_results(), 0);
        assert!(response.sources.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn sources_can_be_left_out() -> Result<(), SearchError> {
        let response = lexical_only()
            .search(&SearchQuery::new("rights").with_sources(false))
            .await?;
        assert!(response.total_results() > 0);
        assert!(response.sources.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn invalid_queries_are_rejected() {
        let coordinator = lexical_only();
        assert!(matches!(
            coordinator.search(&SearchQuery::new("   ")).await,
            Err(SearchError::InvalidQuery(_))
        ));
        assert!(matches!(
            coordinator.search(&SearchQuery::new("x".repeat(501))).await,
            Err(SearchError::InvalidQuery(_))
        ));
    }

    #[tokio::test]
    async fn broken_corpus_is_distinct_from_no_matches() {
        let coordinator = SearchCoordinator::new(
            BrokenCorpus,
            LexicalScorer::default(),
            SearchSettings::default(),
        );
        assert!(matches!(
            coordinator.search(&SearchQuery::new("rights")).await,
            Err(SearchError::CorpusUnavailable(_))
        ));
        assert_eq!(coordinator.health().await.status, "unhealthy");
    }

    #[tokio::test]
    async fn empty_corpus_has_zero_results() -> Result<(), SearchError> {
        let coordinator = SearchCoordinator::new(
            InMemoryCorpus::new(Vec::new()),
            LexicalScorer::default(),
            SearchSettings::default(),
        );
        let response = coordinator.search(&SearchQuery::new("rights")).await?;
        assert_eq!(response.to_api().total_results, 0);
        Ok(())
    }

    #[tokio::test]
    async fn source_listing_is_sorted_and_limited() -> Result<(), SearchError> {
        let coordinator = lexical_only();

        let listing = coordinator.list_sources(50).await?;
        assert_eq!(listing.total_sources, 4);
        assert_eq!(
            listing.sources,
            vec![
                "Constitution_of_India.pdf",
                "Indian_Contract_Act.pdf",
                "Indian_Penal_Code.pdf",
                "Law_of_Torts.pdf",
            ]
        );

        let listing = coordinator.list_sources(2).await?;
        assert_eq!(listing.sources.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn stats_summarize_the_sample() -> Result<(), SearchError> {
        let stats = lexical_only().stats().await?;
        assert_eq!(stats.total_documents, 5);
        assert_eq!(stats.total_sources, 4);
        assert_eq!(
            stats.available_categories,
            vec!["Constitutional Law", "Contract Law", "Criminal Law", "Tort Law"]
        );
        assert_eq!(stats.database_size, "5 documents");
        Ok(())
    }

    #[tokio::test]
    async fn health_reports_counts() {
        let report = lexical_only().health().await;
        assert_eq!(report.status, "healthy");
        assert_eq!(report.total_documents, 5);
        assert_eq!(report.embeddings, "disabled");
    }

    #[test]
    fn thousands_are_grouped() {
        assert_eq!(group_thousands(5), "5");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(2_600_000), "2,600,000");
    }

    #[tokio::test]
    async fn sample_chunks_match_lexical_ranking_of_search() -> Result<(), SearchError> {
        let scorer = LexicalScorer::default();
        let normalized = scorer.normalize("fundamental rights");
        let direct = scorer.rank(&normalized, &BookFilter::Any, &sample_chunks(), 5);
        let response = lexical_only()
            .search(&SearchQuery::new("Fundamental Rights"))
            .await?;
        assert_eq!(direct, response.results);
        Ok(())
    }
}
