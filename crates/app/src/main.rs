use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use legal_search_core::{
    CharacterNgramEmbedder, Embedder, InMemoryCorpus, InMemoryVectorIndex, LexicalConfig,
    LexicalScorer, NoVectorIndex, QdrantStore, RemoteEmbedder, SearchCoordinator, SearchQuery,
    SearchSettings, VectorIndex, DEFAULT_EMBEDDING_DIMENSIONS,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

type DynVectorIndex = Box<dyn VectorIndex + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum VectorBackend {
    /// Lexical scoring only.
    None,
    /// Brute-force index embedded over the loaded corpus.
    Memory,
    /// Qdrant collection over HTTP.
    Qdrant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EmbedderKind {
    /// Local character trigram hashing.
    Ngram,
    /// HTTP embedding service.
    Remote,
}

#[derive(Parser)]
#[command(name = "legal-search", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Corpus JSON file or directory of JSON files. Defaults to the built-in sample.
    #[arg(long, env = "CORPUS_PATH")]
    corpus: Option<PathBuf>,

    /// JSON file overriding stop words, synonyms and lexical weights.
    #[arg(long, env = "LEXICAL_CONFIG")]
    lexical_config: Option<PathBuf>,

    /// Where vector similarity search runs.
    #[arg(long, value_enum, env = "VECTOR_BACKEND", default_value = "none")]
    vector_backend: VectorBackend,

    /// How query vectors are produced.
    #[arg(long, value_enum, env = "EMBEDDER", default_value = "ngram")]
    embedder: EmbedderKind,

    /// Embedding service URL for the remote embedder.
    #[arg(long, env = "EMBEDDING_URL")]
    embedding_url: Option<String>,

    /// Embedding model name sent to the remote embedder.
    #[arg(long, env = "EMBEDDING_MODEL", default_value = "models/embedding-001")]
    embedding_model: String,

    /// API key for the remote embedder.
    #[arg(long, env = "EMBEDDING_API_KEY", hide_env_values = true)]
    embedding_api_key: Option<String>,

    /// Query vector width.
    #[arg(long, env = "EMBEDDING_DIMENSIONS", default_value_t = DEFAULT_EMBEDDING_DIMENSIONS)]
    embedding_dimensions: usize,

    /// Qdrant base URL
    #[arg(long, env = "QDRANT_URL", default_value = "http://localhost:6333")]
    qdrant_url: String,

    /// Qdrant collection
    #[arg(long, env = "COLLECTION_NAME", default_value = "law_books")]
    qdrant_collection: String,

    /// Budget for one vector attempt, in milliseconds.
    #[arg(long, env = "VECTOR_TIMEOUT_MS", default_value = "5000")]
    vector_timeout_ms: u64,
}

#[derive(Subcommand)]
enum Command {
    /// Search the corpus and print ranked chunks as JSON.
    Search {
        /// Search query
        #[arg(long)]
        query: String,
        /// Number of results to return (clamped to 1..=20).
        #[arg(long, default_value = "5")]
        limit: usize,
        /// Only search sources containing this text.
        #[arg(long)]
        book: Option<String>,
        /// Leave the `sources` list empty.
        #[arg(long, default_value_t = false)]
        no_sources: bool,
    },
    /// List the sources found in a sample of the corpus.
    Sources {
        #[arg(long, default_value = "50")]
        limit: usize,
    },
    /// Print corpus statistics.
    Stats,
    /// Print a health report.
    Health,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let app_version = env!("CARGO_PKG_VERSION");

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    info!(
        version = app_version,
        started_at = %Utc::now().to_rfc3339(),
        "legal-search boot"
    );

    let corpus = match &cli.corpus {
        Some(path) => InMemoryCorpus::load(path)?,
        None => {
            warn!("no corpus path given, using the built-in sample corpus");
            InMemoryCorpus::sample()
        }
    };

    let scorer = match &cli.lexical_config {
        Some(path) => LexicalScorer::new(LexicalConfig::from_json_file(path)?),
        None => LexicalScorer::default(),
    };

    let settings = SearchSettings {
        vector_timeout_ms: cli.vector_timeout_ms,
        use_embeddings: cli.vector_backend != VectorBackend::None,
        ..Default::default()
    };
    settings.validate()?;

    let embedder = build_embedder(&cli)?;
    let index = build_vector_index(&cli, &corpus, Arc::clone(&embedder)).await?;
    let coordinator = SearchCoordinator::new(corpus, scorer, settings).with_vector(index, embedder);

    match cli.command {
        Command::Search {
            query,
            limit,
            book,
            no_sources,
        } => {
            let mut search_query = SearchQuery::new(query)
                .with_limit(limit)
                .with_sources(!no_sources);
            if let Some(book) = book {
                search_query = search_query.with_book_filter(book);
            }

            let response = coordinator.search(&search_query).await?;
            if !response.matched() && response.total_results() > 0 {
                warn!("no chunk matched the query, returning a sample of the corpus");
            }
            println!("{}", serde_json::to_string_pretty(&response.to_api())?);
        }
        Command::Sources { limit } => {
            let listing = coordinator.list_sources(limit).await?;
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        Command::Stats => {
            let stats = coordinator.stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Health => {
            let report = coordinator.health().await;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    Ok(())
}

fn build_embedder(cli: &Cli) -> anyhow::Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match cli.embedder {
        EmbedderKind::Ngram => Arc::new(CharacterNgramEmbedder {
            dimensions: cli.embedding_dimensions,
        }),
        EmbedderKind::Remote => {
            let url = cli.embedding_url.as_deref().ok_or_else(|| {
                anyhow::anyhow!("--embedding-url is required for the remote embedder")
            })?;
            if cli.embedding_api_key.is_none() {
                warn!("embedding API key not provided, the service may reject requests");
            }
            let embedder = RemoteEmbedder::new(
                url,
                cli.embedding_model.clone(),
                cli.embedding_api_key.clone(),
                cli.embedding_dimensions,
                Duration::from_millis(cli.vector_timeout_ms),
            )?;
            Arc::new(embedder)
        }
    };
    Ok(embedder)
}

async fn build_vector_index(
    cli: &Cli,
    corpus: &InMemoryCorpus,
    embedder: Arc<dyn Embedder>,
) -> anyhow::Result<DynVectorIndex> {
    let index: DynVectorIndex = match cli.vector_backend {
        VectorBackend::None => Box::new(NoVectorIndex),
        VectorBackend::Memory => {
            match InMemoryVectorIndex::build(corpus.clone(), embedder).await {
                Ok(index) => Box::new(index) as DynVectorIndex,
                Err(error) => {
                    warn!(%error, "could not embed the corpus, continuing with lexical search");
                    Box::new(NoVectorIndex) as DynVectorIndex
                }
            }
        }
        VectorBackend::Qdrant => Box::new(QdrantStore::new(
            &cli.qdrant_url,
            cli.qdrant_collection.clone(),
            cli.embedding_dimensions,
            Duration::from_millis(cli.vector_timeout_ms),
        )?),
    };
    Ok(index)
}
