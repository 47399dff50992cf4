use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use scraper::Html;

use crate::domain::catalog::{CatalogEntry, ProductDetails};
use crate::error::{CrawlerError, CrawlerResult, FetchError};

pub mod catalog;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Elements whose text never reaches the extracted output.
const SKIPPED_ELEMENTS: [&str; 4] = ["script", "style", "noscript", "template"];

/// An abstraction over assessment catalog crawlers.
#[async_trait]
pub trait CatalogCrawler: Send + Sync {
    /// Walks every listing page and returns the rows discovered.
    async fn get_entries(&self) -> Vec<CatalogEntry>;

    /// Fetches the detail page for a listing row.
    async fn get_details(&self, entry: &CatalogEntry) -> Option<ProductDetails>;

    /// Downloads a linked document.
    async fn get_document(&self, url: &str) -> CrawlerResult<Vec<u8>>;
}

pub fn build_reqwest_client(timeout: Duration) -> CrawlerResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .timeout(timeout)
        .build()
        .map_err(|e| CrawlerError::Build(e.to_string()))
}

async fn send(client: &reqwest::Client, url: &str) -> Result<reqwest::Response, FetchError> {
    let res = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
    if !res.status().is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: res.status().as_u16(),
        });
    }
    Ok(res)
}

async fn read_text(res: reqwest::Response, url: &str) -> Result<String, FetchError> {
    res.text().await.map_err(|source| FetchError::Request {
        url: url.to_string(),
        source,
    })
}

/// GET a page and return its body as text. Non-2xx responses are errors.
pub async fn fetch_page(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    read_text(send(client, url).await?, url).await
}

/// GET a page and return its body as text whatever the status code.
///
/// Only transport and body-read failures are errors.
pub async fn fetch_page_any_status(
    client: &reqwest::Client,
    url: &str,
) -> Result<String, FetchError> {
    let res = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
    if !res.status().is_success() {
        log::debug!("{url} returned HTTP {}, using the body anyway", res.status());
    }
    read_text(res, url).await
}

/// GET a binary resource.
pub async fn fetch_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let bytes = send(client, url)
        .await?
        .bytes()
        .await
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
    Ok(bytes.to_vec())
}

/// Extract the visible text of an HTML document.
///
/// Each text node becomes one paragraph with its whitespace collapsed;
/// paragraphs are separated by a blank line.
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);

    document
        .tree
        .root()
        .descendants()
        .filter_map(|node| {
            let text = node.value().as_text()?;
            let skipped = node
                .parent()
                .and_then(|parent| parent.value().as_element())
                .is_some_and(|element| SKIPPED_ELEMENTS.contains(&element.name()));
            if skipped {
                return None;
            }
            let collapsed = WHITESPACE.replace_all(text, " ");
            let trimmed = collapsed.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// File name for a downloaded document: `{product}_{document}{.ext}`.
///
/// Path separators and colons in the product name are replaced so the
/// result stays a single path component.
pub fn download_file_name(product_name: &str, download_name: &str, download_url: &str) -> String {
    let safe_name = product_name.replace(['/', '\\', ':'], "_");
    let safe_download = download_name.replace(['/', '\\', ':'], "_");
    let path = url::Url::parse(download_url)
        .map(|url| url.path().to_string())
        .unwrap_or_else(|_| download_url.to_string());
    let extension = Path::new(&path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
        .unwrap_or_default();

    format!("{safe_name}_{safe_download}{extension}")
}
