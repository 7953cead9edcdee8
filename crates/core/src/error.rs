use thiserror::Error;

/// Failures raised by the vector retrieval path.
///
/// These never leave [`crate::SearchCoordinator::search`]; every variant
/// sends the request down the lexical path instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RetrievalError {
    #[error("retrieval unavailable: {0}")]
    Unavailable(String),

    #[error("vector dimension mismatch: index expects {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

impl From<reqwest::Error> for RetrievalError {
    fn from(error: reqwest::Error) -> Self {
        Self::Unavailable(error.to_string())
    }
}

impl From<url::ParseError> for RetrievalError {
    fn from(error: url::ParseError) -> Self {
        Self::Unavailable(format!("bad endpoint: {error}"))
    }
}

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corpus parse error in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no corpus files found in {0}")]
    Empty(String),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("corpus unavailable: {0}")]
    CorpusUnavailable(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<CorpusError> for SearchError {
    fn from(error: CorpusError) -> Self {
        Self::CorpusUnavailable(error.to_string())
    }
}

pub type Result<T, E = SearchError> = std::result::Result<T, E>;
