use std::sync::Arc;

use async_trait::async_trait;

use crate::crawlers::{fetch_page_any_status, html_to_text};
use crate::domain::assessment::{AssessmentRecord, QueryInput};
use crate::error::{FetchError, QueryError};
use crate::models::config::RankingConfig;
use crate::processing::ranking::rank_and_dedupe;
use crate::repository::VectorSearch;

/// Resolves a URL to the plain text of the page behind it.
#[async_trait]
pub trait TextFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetches pages over HTTP and strips their markup. Error pages are read
/// like any other page.
pub struct HttpTextFetcher {
    client: reqwest::Client,
}

impl HttpTextFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl TextFetcher for HttpTextFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let body = fetch_page_any_status(&self.client, url).await?;
        Ok(html_to_text(&body))
    }
}

/// Turns caller input into the text that gets embedded.
pub struct QueryNormalizer {
    fetcher: Arc<dyn TextFetcher>,
}

impl QueryNormalizer {
    pub fn new(fetcher: Arc<dyn TextFetcher>) -> Self {
        Self { fetcher }
    }

    /// Raw text passes through. URLs are replaced by their page text, or by
    /// the error message when the page cannot be fetched.
    pub async fn normalize(&self, raw_query: &str) -> String {
        match QueryInput::parse(raw_query) {
            QueryInput::RawText { text } => text,
            QueryInput::UrlReference { url } => match self.fetcher.fetch_text(&url).await {
                Ok(text) => text,
                Err(error) => {
                    log::warn!("Falling back to error text for query URL {url}: {error}");
                    error.to_string()
                }
            },
        }
    }
}

/// End-to-end query pipeline: normalize, search, threshold, dedupe.
pub struct QueryService {
    index: Arc<dyn VectorSearch>,
    normalizer: QueryNormalizer,
    ranking: RankingConfig,
}

impl QueryService {
    pub fn new(
        index: Arc<dyn VectorSearch>,
        fetcher: Arc<dyn TextFetcher>,
        ranking: RankingConfig,
    ) -> Self {
        Self {
            index,
            normalizer: QueryNormalizer::new(fetcher),
            ranking,
        }
    }

    pub async fn handle_query(&self, raw_query: &str) -> Result<Vec<AssessmentRecord>, QueryError> {
        let text = self.normalizer.normalize(raw_query).await;

        let index = Arc::clone(&self.index);
        let k = self.ranking.candidate_pool;
        let hits =
            tokio::task::spawn_blocking(move || index.similarity_search_with_score(&text, k))
                .await??;

        Ok(rank_and_dedupe(
            &hits,
            self.ranking.score_threshold,
            self.ranking.max_results,
        ))
    }
}
