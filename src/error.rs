//! Error types shared across the crawler, indexer and query service.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("unknown embedding model: {0}")]
    UnknownModel(String),
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to initialize embedding model {model}: {message}")]
    Init { model: String, message: String },
    #[error("failed to generate embedding: {0}")]
    Generate(String),
    #[error("embedding model returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },
}

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("vector index operation failed: {0}")]
    Usearch(String),
    #[error("index file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("index sidecar is malformed: {0}")]
    Serde(#[from] serde_json::Error),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error("index was built with model {indexed} but the active embedder is {active}")]
    ModelMismatch { indexed: String, active: String },
    #[error("index expects {expected}-dimensional vectors, embedder produced {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("no documents were processed")]
    NoDocuments,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
}

#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("failed to build crawler: {0}")]
    Build(String),
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("failed to write download: {0}")]
    Io(#[from] std::io::Error),
}

pub type CrawlerResult<T> = Result<T, CrawlerError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog table error: {0}")]
    Csv(#[from] csv::Error),
    #[error("catalog file error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("search task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to extract PDF text: {0}")]
    Pdf(String),
    #[error("unsupported document type: {0}")]
    Unsupported(String),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error("failed to list documents: {0}")]
    Io(#[from] std::io::Error),
}
