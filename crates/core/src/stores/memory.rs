use crate::embeddings::Embedder;
use crate::error::{CorpusError, RetrievalError};
use crate::models::{ChunkMetadata, DocumentChunk, RawMetadata};
use crate::traits::{Corpus, VectorIndex, VectorMatch};
use crate::SearchError;
use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};
use walkdir::WalkDir;

/// One record of a corpus export. `document` and `text` are accepted as
/// aliases of `content`.
#[derive(Debug, Deserialize)]
struct CorpusRecord {
    #[serde(default)]
    id: String,
    #[serde(alias = "document", alias = "text")]
    content: String,
    #[serde(default)]
    metadata: RawMetadata,
}

/// Corpus held in memory and shared as an immutable snapshot.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCorpus {
    chunks: Arc<Vec<DocumentChunk>>,
}

impl InMemoryCorpus {
    pub fn new(chunks: Vec<DocumentChunk>) -> Self {
        let chunks = chunks
            .into_iter()
            .enumerate()
            .map(|(index, mut chunk)| {
                if chunk.id.is_empty() {
                    let source = chunk.source().unwrap_or_default();
                    chunk.id = make_chunk_id(source, index, &chunk.content);
                }
                chunk
            })
            .collect();

        Self {
            chunks: Arc::new(chunks),
        }
    }

    /// The five-document sample used for local runs and tests.
    pub fn sample() -> Self {
        Self::new(sample_chunks())
    }

    /// Loads a JSON file holding an array of records, or every `.json` file
    /// below a directory in path order.
    pub fn load(path: &Path) -> Result<Self, CorpusError> {
        let files = if path.is_dir() {
            let files = discover_corpus_files(path);
            if files.is_empty() {
                return Err(CorpusError::Empty(path.display().to_string()));
            }
            files
        } else {
            vec![path.to_path_buf()]
        };

        let mut chunks = Vec::new();
        for file in &files {
            let raw = std::fs::read_to_string(file)?;
            let records: Vec<CorpusRecord> =
                serde_json::from_str(&raw).map_err(|source| CorpusError::Parse {
                    path: file.display().to_string(),
                    source,
                })?;
            debug!(path = %file.display(), records = records.len(), "loaded corpus file");

            chunks.extend(records.into_iter().map(|record| DocumentChunk {
                id: record.id,
                content: record.content,
                metadata: ChunkMetadata::from(&record.metadata),
            }));
        }

        info!(files = files.len(), chunks = chunks.len(), "corpus loaded");
        Ok(Self::new(chunks))
    }

    pub fn chunks(&self) -> &[DocumentChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[async_trait]
impl Corpus for InMemoryCorpus {
    async fn snapshot(&self) -> Result<Arc<Vec<DocumentChunk>>, SearchError> {
        Ok(Arc::clone(&self.chunks))
    }

    async fn count(&self) -> Result<usize, SearchError> {
        Ok(self.chunks.len())
    }
}

pub fn discover_corpus_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_json = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

fn make_chunk_id(source: &str, index: usize, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update((index as u64).to_le_bytes());
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub fn sample_chunks() -> Vec<DocumentChunk> {
    fn entry(
        id: &str,
        content: &str,
        source: &str,
        book: &str,
        author: &str,
        category: &str,
        page: u32,
    ) -> DocumentChunk {
        DocumentChunk::new(
            id,
            content,
            ChunkMetadata {
                source: Some(source.to_string()),
                book: Some(book.to_string()),
                author: Some(author.to_string()),
                category: Some(category.to_string()),
                page: Some(page),
            },
        )
    }

    vec![
        entry(
            "doc_1",
            "The Constitution of India is the supreme law of India. It lays down the framework defining fundamental political principles, establishes the structure, procedures, powers and duties of government institutions and sets out fundamental rights, directive principles and the duties of citizens.",
            "Constitution_of_India.pdf",
            "Constitution of India",
            "Constituent Assembly",
            "Constitutional Law",
            1,
        ),
        entry(
            "doc_2",
            "Fundamental Rights are basic human freedoms that every Indian citizen has the right to enjoy for a proper and harmonious development of personality. These rights universally apply to all citizens, irrespective of race, place of birth, religion, caste or gender.",
            "Constitution_of_India.pdf",
            "Constitution of India",
            "Constituent Assembly",
            "Constitutional Law",
            12,
        ),
        entry(
            "doc_3",
            "A tort is a civil wrong that causes a claimant to suffer loss or harm, resulting in legal liability for the person who commits the tortious act. Tort law in India is primarily based on English common law principles.",
            "Law_of_Torts.pdf",
            "Law of Torts",
            "Ratanlal & Dhirajlal",
            "Tort Law",
            1,
        ),
        entry(
            "doc_4",
            "Criminal law is the body of law that relates to crime. It proscribes conduct perceived as threatening, harmful, or otherwise endangering to the property, health, safety, and moral welfare of people.",
            "Indian_Penal_Code.pdf",
            "Indian Penal Code",
            "Macaulay",
            "Criminal Law",
            1,
        ),
        entry(
            "doc_5",
            "Contract law is the body of law that governs making and enforcing agreements. A contract is a legally binding agreement between two or more parties that creates mutual obligations enforceable by law.",
            "Indian_Contract_Act.pdf",
            "Indian Contract Act, 1872",
            "Legislature",
            "Contract Law",
            1,
        ),
    ]
}

/// Brute-force cosine index over an [`InMemoryCorpus`].
pub struct InMemoryVectorIndex {
    corpus: InMemoryCorpus,
    embedder: Arc<dyn Embedder>,
    vectors: RwLock<Vec<Vec<f32>>>,
}

impl InMemoryVectorIndex {
    pub async fn build(
        corpus: InMemoryCorpus,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, RetrievalError> {
        let vectors = embed_all(&corpus, embedder.as_ref()).await?;
        Ok(Self::from_vectors(corpus, embedder, vectors))
    }

    /// Wraps vectors computed elsewhere, one per chunk in corpus order.
    pub fn from_vectors(
        corpus: InMemoryCorpus,
        embedder: Arc<dyn Embedder>,
        vectors: Vec<Vec<f32>>,
    ) -> Self {
        Self {
            corpus,
            embedder,
            vectors: RwLock::new(vectors),
        }
    }
}

async fn embed_all(
    corpus: &InMemoryCorpus,
    embedder: &dyn Embedder,
) -> Result<Vec<Vec<f32>>, RetrievalError> {
    let mut vectors = Vec::with_capacity(corpus.len());
    for chunk in corpus.chunks() {
        vectors.push(embedder.embed(&chunk.content).await?);
    }
    Ok(vectors)
}

fn cosine_distance(left: &[f32], right: &[f32]) -> f64 {
    let dot: f64 = left
        .iter()
        .zip(right)
        .map(|(a, b)| f64::from(*a) * f64::from(*b))
        .sum();
    let norm = |values: &[f32]| values.iter().map(|v| f64::from(*v).powi(2)).sum::<f64>().sqrt();
    let denominator = norm(left) * norm(right);
    if denominator == 0.0 {
        return 1.0;
    }
    (1.0 - dot / denominator).max(0.0)
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn search_vector(
        &self,
        query_vector: &[f32],
        limit: usize,
        book_filter: Option<&str>,
    ) -> Result<Vec<VectorMatch>, RetrievalError> {
        let vectors = self.vectors.read().await;
        if vectors.len() != self.corpus.len() {
            return Err(RetrievalError::Unavailable(format!(
                "index holds {} vectors for {} chunks",
                vectors.len(),
                self.corpus.len()
            )));
        }

        if let Some(width) = vectors.first().map(Vec::len) {
            if width != query_vector.len() {
                return Err(RetrievalError::DimensionMismatch {
                    expected: width,
                    actual: query_vector.len(),
                });
            }
        }

        let needle = book_filter.map(str::to_lowercase);
        let mut matches: Vec<VectorMatch> = self
            .corpus
            .chunks()
            .iter()
            .zip(vectors.iter())
            .filter(|(chunk, _)| match &needle {
                Some(needle) => chunk
                    .source()
                    .is_some_and(|source| source.to_lowercase().contains(needle.as_str())),
                None => true,
            })
            .map(|(chunk, vector)| VectorMatch {
                document: chunk.clone(),
                distance: cosine_distance(query_vector, vector),
            })
            .collect();

        matches.sort_by(|left, right| left.distance.total_cmp(&right.distance));
        matches.truncate(limit);
        Ok(matches)
    }

    async fn recreate(&self) -> Result<(), RetrievalError> {
        let rebuilt = embed_all(&self.corpus, self.embedder.as_ref()).await?;
        info!(
            chunks = rebuilt.len(),
            dimensions = self.embedder.dimensions(),
            "in-memory vector index recreated"
        );
        *self.vectors.write().await = rebuilt;
        Ok(())
    }
}
