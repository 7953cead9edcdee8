pub mod aggregate;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod lexical;
pub mod models;
pub mod normalize;
pub mod orchestrator;
pub mod sources;
pub mod stores;
pub mod traits;

pub use aggregate::{rank_vector_matches, relevance_from_distances};
pub use config::SearchSettings;
pub use embeddings::{
    CharacterNgramEmbedder, Embedder, RemoteEmbedder, DEFAULT_EMBEDDING_DIMENSIONS,
};
pub use error::{CorpusError, RetrievalError, SearchError};
pub use lexical::{LexicalConfig, LexicalScorer, LexicalWeights};
pub use models::{
    ApiSearchResponse, ApiSearchResult, BookFilter, ChunkMetadata, CorpusStats, DocumentChunk,
    HealthReport, RetrievalPath, ScoreKind, ScoredResult, SearchQuery, SearchResponse,
    SourceListing,
};
pub use normalize::{normalize_query, NormalizedQuery};
pub use orchestrator::{NoVectorIndex, RetrievalState, SearchCoordinator};
pub use sources::{extract_sources, normalize_source};
pub use stores::{InMemoryCorpus, InMemoryVectorIndex, QdrantStore};
pub use traits::{Corpus, VectorIndex, VectorMatch};
