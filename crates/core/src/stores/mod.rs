pub mod memory;
pub mod qdrant;

pub use memory::{discover_corpus_files, sample_chunks, InMemoryCorpus, InMemoryVectorIndex};
pub use qdrant::QdrantStore;
