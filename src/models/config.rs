//! Configuration model loaded from external sources.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::{CANDIDATE_POOL, MAX_RESULTS, SCORE_THRESHOLD};

/// Prefix for environment overrides, e.g. `ASSESSMENT__SERVER__BIND_ADDRESS`.
const ENV_PREFIX: &str = "ASSESSMENT";

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
/// Root configuration shared by every sub-command.
pub struct AppConfig {
    pub server: ServerConfig,
    pub index: IndexConfig,
    pub ranking: RankingConfig,
    pub crawler: CrawlerConfig,
    pub ingest: IngestConfig,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
    /// Timeout for resolving URL queries, in seconds.
    pub fetch_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:5000".to_string(),
            fetch_timeout_secs: 30,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub directory: PathBuf,
    pub model: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("vector_index"),
            model: "paraphrase-multilingual-MiniLM-L12-v2".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub score_threshold: f32,
    pub candidate_pool: usize,
    /// Hard cap on unique results; `0` disables the cap.
    pub max_results: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            score_threshold: SCORE_THRESHOLD,
            candidate_pool: CANDIDATE_POOL,
            max_results: MAX_RESULTS,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    pub base_url: String,
    pub catalog_types: Vec<u8>,
    pub page_size: usize,
    pub max_pages: usize,
    pub concurrency: usize,
    pub data_dir: PathBuf,
    pub downloads_dir: PathBuf,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.shl.com/".to_string(),
            catalog_types: vec![1, 2],
            page_size: 12,
            max_pages: 32,
            concurrency: 5,
            data_dir: PathBuf::from("data"),
            downloads_dir: PathBuf::from("downloads"),
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional YAML file and the environment.
    ///
    /// Missing keys fall back to defaults; environment variables win over
    /// the file.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        builder = match path {
            Some(path) => builder.add_source(config::File::with_name(path)),
            None => builder.add_source(config::File::with_name("config").required(false)),
        };
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize::<AppConfig>()?)
    }
}
