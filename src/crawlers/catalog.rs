use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use tokio::sync::Semaphore;
use url::Url;

use crate::crawlers::{CatalogCrawler, fetch_bytes, fetch_page};
use crate::domain::catalog::{CatalogEntry, Download, ProductDetails};
use crate::error::{CrawlerError, CrawlerResult};
use crate::models::config::CrawlerConfig;

const CATALOG_PATH: &str = "solutions/products/product-catalog/";

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Parse the product table of one listing page.
///
/// Returns `None` when the page has no table, which ends pagination.
pub fn parse_listing(document: &Html, base_url: &Url) -> Option<Vec<CatalogEntry>> {
    let table_selector = Selector::parse("table").unwrap();
    let row_selector = Selector::parse("tbody tr").unwrap();
    let title_selector = Selector::parse("td.custom__table-heading__title a").unwrap();
    let general_selector = Selector::parse("td.custom__table-heading__general").unwrap();
    let yes_selector = Selector::parse("span.catalogue__circle.-yes").unwrap();
    let key_selector =
        Selector::parse("td.product-catalogue__keys span.product-catalogue__key").unwrap();

    let table = document.select(&table_selector).next()?;

    let entries = table
        .select(&row_selector)
        .filter_map(|row| {
            let link = row.select(&title_selector).next()?;
            let href = link.value().attr("href")?;
            let url = base_url.join(href).ok()?;

            let flags: Vec<bool> = row
                .select(&general_selector)
                .take(2)
                .map(|cell| cell.select(&yes_selector).next().is_some())
                .collect();

            let test_types = row
                .select(&key_selector)
                .map(element_text)
                .filter(|key| !key.is_empty())
                .collect::<Vec<_>>()
                .join(", ");

            Some(CatalogEntry {
                name: element_text(link),
                url: url.to_string(),
                remote_testing: flags.first().copied().unwrap_or(false),
                adaptive_irt: flags.get(1).copied().unwrap_or(false),
                test_types,
            })
        })
        .collect();

    Some(entries)
}

/// Parse a product detail page into [`ProductDetails`].
///
/// Download links are resolved against `page_url`.
pub fn parse_details(document: &Html, name: &str, page_url: &Url) -> ProductDetails {
    let section_selector =
        Selector::parse("div.product-catalogue-training-calendar__row").unwrap();
    let heading_selector = Selector::parse("h4").unwrap();
    let paragraph_selector = Selector::parse("p").unwrap();
    let download_selector = Selector::parse("li.product-catalogue__download a[href]").unwrap();
    let key_selector = Selector::parse("span.product-catalogue__key").unwrap();
    let yes_selector = Selector::parse("span.catalogue__circle.-yes").unwrap();

    let mut details = ProductDetails {
        name: name.to_string(),
        url: page_url.to_string(),
        ..Default::default()
    };

    for section in document.select(&section_selector) {
        let Some(heading) = section.select(&heading_selector).next() else {
            continue;
        };
        let heading = element_text(heading).to_lowercase();
        let paragraph = section.select(&paragraph_selector).next().map(element_text);

        match (heading.as_str(), paragraph) {
            ("description", Some(text)) => details.description = text,
            ("job levels", Some(text)) => details.job_levels = text,
            ("languages", Some(text)) => details.languages = text,
            ("assessment length", text) => {
                if let Some(text) = text {
                    details.assessment_length = text;
                }
                details.test_types = section
                    .select(&key_selector)
                    .map(element_text)
                    .filter(|key| !key.is_empty())
                    .collect::<Vec<_>>()
                    .join(", ");
                details.remote_testing = Some(section.select(&yes_selector).next().is_some());
            }
            ("downloads", _) => {
                details.downloads = section
                    .select(&download_selector)
                    .filter_map(|link| {
                        let href = link.value().attr("href")?;
                        Some(Download {
                            name: element_text(link),
                            url: page_url.join(href).ok()?.to_string(),
                        })
                    })
                    .collect();
            }
            _ => {}
        }
    }

    details
}

/// Crawler for the SHL product catalog which limits concurrent HTTP
/// requests using a [`Semaphore`].
pub struct ShlCatalogCrawler {
    base_url: Url,
    client: reqwest::Client,
    semaphore: Arc<Semaphore>,
    catalog_types: Vec<u8>,
    page_size: usize,
    max_pages: usize,
}

impl ShlCatalogCrawler {
    /// Creates a new crawler from configuration.
    ///
    /// `config.concurrency` controls how many HTTP requests may be in
    /// flight at the same time.
    pub fn new(config: &CrawlerConfig, client: reqwest::Client) -> CrawlerResult<Self> {
        Ok(Self {
            base_url: Url::parse(&config.base_url).map_err(|e| CrawlerError::Build(e.to_string()))?,
            client,
            semaphore: Arc::new(Semaphore::new(config.concurrency.max(1))),
            catalog_types: config.catalog_types.clone(),
            page_size: config.page_size,
            max_pages: config.max_pages,
        })
    }

    /// Fetches a URL and parses it into [`Html`].
    ///
    /// A permit from the internal [`Semaphore`] is acquired before issuing
    /// the request.
    async fn fetch_html(&self, url: &str) -> Option<Html> {
        let _permit = self.semaphore.acquire().await.ok()?;
        match fetch_page(&self.client, url).await {
            Ok(text) => Some(Html::parse_document(&text)),
            Err(e) => {
                log::error!("Failed to get URL {url}: {e}");
                None
            }
        }
    }

    fn listing_url(&self, catalog_type: u8, page: usize) -> Option<Url> {
        let mut url = self.base_url.join(CATALOG_PATH).ok()?;
        let start = (page - 1) * self.page_size;
        url.query_pairs_mut()
            .append_pair("type", &catalog_type.to_string())
            .append_pair("start", &start.to_string());
        Some(url)
    }

    /// Walks the listing pages of one catalog type until a page has no
    /// table, no rows, or `max_pages` is reached.
    async fn get_type_entries(&self, catalog_type: u8) -> Vec<CatalogEntry> {
        let mut result = vec![];

        for page in 1..=self.max_pages {
            let Some(url) = self.listing_url(catalog_type, page) else {
                log::error!("Failed to build listing URL for type {catalog_type}");
                break;
            };
            log::info!("Scraping page {page}, URL: {url}");

            let Some(document) = self.fetch_html(url.as_str()).await else {
                break;
            };
            match parse_listing(&document, &self.base_url) {
                Some(entries) if !entries.is_empty() => result.extend(entries),
                Some(_) => {
                    log::info!("No rows found on page {page}. Ending pagination.");
                    break;
                }
                None => {
                    log::info!("Table not found on page {page}. Ending pagination.");
                    break;
                }
            }
        }

        result
    }
}

#[async_trait]
impl CatalogCrawler for ShlCatalogCrawler {
    /// Crawls every configured catalog type concurrently; pages within a
    /// type are walked in order.
    async fn get_entries(&self) -> Vec<CatalogEntry> {
        let tasks = self
            .catalog_types
            .iter()
            .map(|catalog_type| self.get_type_entries(*catalog_type));
        let entries = futures::future::join_all(tasks).await;

        let mut entries: Vec<CatalogEntry> = entries.into_iter().flatten().collect();
        let mut seen_urls = HashSet::new();
        entries.retain(|entry| seen_urls.insert(entry.url.clone()));
        entries
    }

    async fn get_details(&self, entry: &CatalogEntry) -> Option<ProductDetails> {
        let page_url = match Url::parse(&entry.url) {
            Ok(url) => url,
            Err(e) => {
                log::error!("Invalid product URL {}: {e}", entry.url);
                return None;
            }
        };
        let document = self.fetch_html(page_url.as_str()).await?;
        Some(parse_details(&document, &entry.name, &page_url))
    }

    async fn get_document(&self, url: &str) -> CrawlerResult<Vec<u8>> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|e| CrawlerError::Build(e.to_string()))?;
        Ok(fetch_bytes(&self.client, url).await?)
    }
}

#[cfg(test)]
mod tests {
    use scraper::Html;
    use url::Url;

    use super::{parse_details, parse_listing};

    const LISTING: &str = r#"
        <html><body><table>
          <thead><tr><th>Pre-packaged Job Solutions</th></tr></thead>
          <tbody>
            <tr>
              <td class="custom__table-heading__title"><a href="/products/account-manager/">Account Manager Solution</a></td>
              <td class="custom__table-heading__general"><span class="catalogue__circle -yes"></span></td>
              <td class="custom__table-heading__general"><span class="catalogue__circle"></span></td>
              <td class="custom__table-heading__general product-catalogue__keys">
                <span class="product-catalogue__key">C</span>
                <span class="product-catalogue__key">P</span>
              </td>
            </tr>
            <tr>
              <td class="custom__table-heading__title"><a href="/products/verify/">Verify Numerical</a></td>
              <td class="custom__table-heading__general"></td>
              <td class="custom__table-heading__general"><span class="catalogue__circle -yes"></span></td>
              <td class="custom__table-heading__general product-catalogue__keys">
                <span class="product-catalogue__key">A</span>
              </td>
            </tr>
            <tr><td>no link here</td></tr>
          </tbody>
        </table></body></html>"#;

    const DETAILS: &str = r#"
        <html><body><div class="container">
          <div class="product-catalogue-training-calendar__row">
            <h4>Description</h4><p> Measures numerical reasoning. </p>
          </div>
          <div class="product-catalogue-training-calendar__row">
            <h4>Job levels</h4><p>Graduate, Manager</p>
          </div>
          <div class="product-catalogue-training-calendar__row">
            <h4>Languages</h4><p>English (USA)</p>
          </div>
          <div class="product-catalogue-training-calendar__row">
            <h4>Assessment length</h4><p>Approximate Completion Time in minutes = 18</p>
            <span class="product-catalogue__key">A</span>
            <span class="catalogue__circle -yes"></span>
          </div>
          <div class="product-catalogue-training-calendar__row">
            <h4>Downloads</h4>
            <ul>
              <li class="product-catalogue__download"><a href="/docs/Fact Sheet.pdf">Fact Sheet</a></li>
              <li class="product-catalogue__download"><span>broken</span></li>
            </ul>
          </div>
        </div></body></html>"#;

    #[test]
    fn listing_rows_are_parsed() {
        let base = Url::parse("https://catalog.example.com/").expect("valid url");

        let entries = parse_listing(&Html::parse_document(LISTING), &base).expect("table");

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "Account Manager Solution");
        assert_eq!(
            entries[0].url,
            "https://catalog.example.com/products/account-manager/"
        );
        assert!(entries[0].remote_testing);
        assert!(!entries[0].adaptive_irt);
        assert_eq!(entries[0].test_types, "C, P");
        assert!(!entries[1].remote_testing);
        assert!(entries[1].adaptive_irt);
        assert_eq!(entries[1].test_types, "A");
    }

    #[test]
    fn page_without_table_ends_pagination() {
        let base = Url::parse("https://catalog.example.com/").expect("valid url");

        assert!(parse_listing(&Html::parse_document("<p>empty</p>"), &base).is_none());
    }

    #[test]
    fn detail_sections_are_parsed() {
        let page = Url::parse("https://catalog.example.com/products/verify/").expect("valid url");

        let details = parse_details(&Html::parse_document(DETAILS), "Verify Numerical", &page);

        assert_eq!(details.name, "Verify Numerical");
        assert_eq!(details.description, "Measures numerical reasoning.");
        assert_eq!(details.job_levels, "Graduate, Manager");
        assert_eq!(details.languages, "English (USA)");
        assert_eq!(
            details.assessment_length,
            "Approximate Completion Time in minutes = 18"
        );
        assert_eq!(details.test_types, "A");
        assert_eq!(details.remote_testing, Some(true));
        assert_eq!(details.downloads.len(), 1);
        assert_eq!(details.downloads[0].name, "Fact Sheet");
        assert_eq!(
            details.downloads[0].url,
            "https://catalog.example.com/docs/Fact%20Sheet.pdf"
        );
    }

    #[test]
    fn missing_length_section_leaves_remote_unknown() {
        let page = Url::parse("https://catalog.example.com/p/").expect("valid url");

        let details = parse_details(&Html::parse_document("<div></div>"), "P", &page);

        assert_eq!(details.remote_testing, None);
        assert!(details.downloads.is_empty());
    }
}
