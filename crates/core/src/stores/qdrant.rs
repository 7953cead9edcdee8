use crate::error::RetrievalError;
use crate::models::{ChunkMetadata, DocumentChunk, RawMetadata};
use crate::traits::{VectorIndex, VectorMatch};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Extra candidates fetched per requested result when a book filter is
/// applied client side.
const FILTERED_OVERFETCH: usize = 10;
const MAX_FETCH: usize = 1000;

/// Vector adapter over a Qdrant collection whose points carry the chunk text
/// under `content` (or `document`) and the chunk metadata as flat payload keys.
pub struct QdrantStore {
    endpoint: Url,
    collection: String,
    client: Client,
    vector_size: AtomicUsize,
}

impl QdrantStore {
    pub fn new(
        endpoint: &str,
        collection: impl Into<String>,
        vector_size: usize,
        timeout: Duration,
    ) -> Result<Self, RetrievalError> {
        let mut endpoint = Url::parse(endpoint)?;
        if !endpoint.path().ends_with('/') {
            let path = format!("{}/", endpoint.path());
            endpoint.set_path(&path);
        }

        Ok(Self {
            endpoint,
            collection: collection.into(),
            client: Client::builder().timeout(timeout).build()?,
            vector_size: AtomicUsize::new(vector_size),
        })
    }

    pub fn vector_size(&self) -> usize {
        self.vector_size.load(Ordering::Relaxed)
    }

    fn collection_url(&self, suffix: &str) -> Result<Url, RetrievalError> {
        let path = if suffix.is_empty() {
            format!("collections/{}", self.collection)
        } else {
            format!("collections/{}/{}", self.collection, suffix)
        };
        Ok(self.endpoint.join(&path)?)
    }
}

#[async_trait]
impl VectorIndex for QdrantStore {
    async fn search_vector(
        &self,
        query_vector: &[f32],
        limit: usize,
        book_filter: Option<&str>,
    ) -> Result<Vec<VectorMatch>, RetrievalError> {
        let expected = self.vector_size();
        if query_vector.len() != expected {
            return Err(RetrievalError::DimensionMismatch {
                expected,
                actual: query_vector.len(),
            });
        }

        let body = search_body(query_vector, limit, book_filter);
        let response = self
            .client
            .post(self.collection_url("points/search")?)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::BAD_REQUEST {
            let details = response.text().await.unwrap_or_default();
            if let Some(expected) = parse_expected_dimension(&details) {
                return Err(RetrievalError::DimensionMismatch {
                    expected,
                    actual: query_vector.len(),
                });
            }
            return Err(RetrievalError::Unavailable(format!("qdrant rejected query: {details}")));
        }
        if !status.is_success() {
            return Err(RetrievalError::Unavailable(format!("qdrant answered {status}")));
        }

        let parsed: Value = response.json().await?;
        let hits = parsed
            .pointer("/result")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        debug!(hits = hits.len(), "qdrant search returned");

        let matches = hits.iter().filter_map(match_from_hit).collect();
        Ok(keep_book(matches, book_filter, limit))
    }

    async fn recreate(&self) -> Result<(), RetrievalError> {
        let response = self.client.get(self.collection_url("")?).send().await?;
        if !response.status().is_success() {
            return Err(RetrievalError::Unavailable(format!(
                "qdrant collection lookup answered {}",
                response.status()
            )));
        }

        let parsed: Value = response.json().await?;
        let size = parsed
            .pointer("/result/config/params/vectors/size")
            .and_then(Value::as_u64)
            .and_then(|size| usize::try_from(size).ok())
            .ok_or_else(|| {
                RetrievalError::Unavailable("collection has no single vector size".to_string())
            })?;

        info!(collection = %self.collection, size, "refreshed qdrant vector size");
        self.vector_size.store(size, Ordering::Relaxed);
        Ok(())
    }
}

/// Qdrant's `match.text` is case sensitive without a full-text index and
/// token based with one, so the book filter never goes to the server. A
/// filtered search over-fetches and [`keep_book`] narrows the hits.
fn search_body(query_vector: &[f32], limit: usize, book_filter: Option<&str>) -> Value {
    let fetch = match book_filter {
        Some(_) => limit.saturating_mul(FILTERED_OVERFETCH).min(MAX_FETCH).max(limit),
        None => limit,
    };
    json!({
        "vector": query_vector,
        "limit": fetch,
        "with_payload": true,
    })
}

/// Case-insensitive substring match of the book filter against `source`.
fn keep_book(
    matches: Vec<VectorMatch>,
    book_filter: Option<&str>,
    limit: usize,
) -> Vec<VectorMatch> {
    let Some(needle) = book_filter.map(str::to_lowercase) else {
        return matches.into_iter().take(limit).collect();
    };
    matches
        .into_iter()
        .filter(|found| {
            found
                .document
                .source()
                .is_some_and(|source| source.to_lowercase().contains(&needle))
        })
        .take(limit)
        .collect()
}

fn match_from_hit(hit: &Value) -> Option<VectorMatch> {
    let id = match hit.pointer("/id")? {
        Value::String(id) => id.clone(),
        Value::Number(id) => id.to_string(),
        _ => return None,
    };

    let payload = hit.pointer("/payload").and_then(Value::as_object);
    let content = payload
        .and_then(|payload| payload.get("content").or_else(|| payload.get("document")))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let metadata = payload
        .map(|payload| {
            let raw: RawMetadata = payload
                .iter()
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            ChunkMetadata::from(&raw)
        })
        .unwrap_or_default();

    let similarity = hit.pointer("/score").and_then(Value::as_f64).unwrap_or(0.0);

    Some(VectorMatch {
        document: DocumentChunk::new(id, content, metadata),
        distance: (1.0 - similarity).max(0.0),
    })
}

/// Reads the width out of a Qdrant error such as
/// `Vector dimension error: expected dim: 768, got 128`.
fn parse_expected_dimension(details: &str) -> Option<usize> {
    let (_, rest) = details.split_once("expected dim:")?;
    let digits: String = rest
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}
