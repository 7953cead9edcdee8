use crate::{DocumentChunk, RetrievalError, SearchError};
use async_trait::async_trait;
use std::sync::Arc;

/// A document together with its distance from the query vector. Smaller is
/// closer.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorMatch {
    pub document: DocumentChunk,
    pub distance: f64,
}

#[async_trait]
pub trait VectorIndex {
    /// Nearest neighbours of `query_vector`, closest first.
    async fn search_vector(
        &self,
        query_vector: &[f32],
        limit: usize,
        book_filter: Option<&str>,
    ) -> Result<Vec<VectorMatch>, RetrievalError>;

    /// Rebuilds whatever the index needs after a dimension mismatch.
    async fn recreate(&self) -> Result<(), RetrievalError> {
        Err(RetrievalError::Unavailable(
            "index does not support recreation".to_string(),
        ))
    }
}

/// Read-only access to every chunk of the corpus.
#[async_trait]
pub trait Corpus {
    async fn snapshot(&self) -> Result<Arc<Vec<DocumentChunk>>, SearchError>;

    async fn count(&self) -> Result<usize, SearchError> {
        Ok(self.snapshot().await?.len())
    }
}

#[async_trait]
impl<T> VectorIndex for Box<T>
where
    T: VectorIndex + Send + Sync + ?Sized,
{
    async fn search_vector(
        &self,
        query_vector: &[f32],
        limit: usize,
        book_filter: Option<&str>,
    ) -> Result<Vec<VectorMatch>, RetrievalError> {
        (**self).search_vector(query_vector, limit, book_filter).await
    }

    async fn recreate(&self) -> Result<(), RetrievalError> {
        (**self).recreate().await
    }
}
