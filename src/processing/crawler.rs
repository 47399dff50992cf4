use std::path::{Path, PathBuf};

use futures::future;

use crate::crawlers::{CatalogCrawler, download_file_name};
use crate::domain::catalog::{Download, ProductDetails};
use crate::error::CrawlerResult;
use crate::repository::CatalogWriter;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CrawlStats {
    pub entries: usize,
    pub details: usize,
    pub downloads: usize,
    pub failed_downloads: usize,
}

async fn save_download<C>(
    crawler: &C,
    product: &ProductDetails,
    download: &Download,
    downloads_dir: &Path,
) -> CrawlerResult<PathBuf>
where
    C: CatalogCrawler + ?Sized,
{
    let bytes = crawler.get_document(&download.url).await?;
    let path = downloads_dir.join(download_file_name(
        &product.name,
        &download.name,
        &download.url,
    ));
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

/// Crawl the catalog listing, then every detail page, then every linked
/// document.
///
/// Listing and detail rows are written through `repo`; documents land in
/// `downloads_dir`. Individual page or download failures are logged and
/// skipped.
pub async fn process_crawl<C, R>(
    crawler: &C,
    repo: &R,
    downloads_dir: &Path,
) -> CrawlerResult<CrawlStats>
where
    C: CatalogCrawler + ?Sized,
    R: CatalogWriter,
{
    log::info!("Starting catalog crawl");
    let mut stats = CrawlStats::default();

    let entries = crawler.get_entries().await;
    stats.entries = entries.len();
    if let Err(e) = repo.write_entries(&entries) {
        log::error!("Error writing catalog entries: {e}");
    }

    let tasks = entries.iter().map(|entry| crawler.get_details(entry));
    let details: Vec<ProductDetails> = future::join_all(tasks)
        .await
        .into_iter()
        .flatten()
        .collect();
    stats.details = details.len();
    if let Err(e) = repo.write_details(&details) {
        log::error!("Error writing product details: {e}");
    }

    tokio::fs::create_dir_all(downloads_dir).await?;
    let tasks = details.iter().flat_map(move |product| {
        product
            .downloads
            .iter()
            .map(move |download| async move {
                let result = save_download(crawler, product, download, downloads_dir).await;
                (download, result)
            })
    });
    for (download, result) in future::join_all(tasks).await {
        match result {
            Ok(path) => {
                log::info!("Downloaded: {}", path.display());
                stats.downloads += 1;
            }
            Err(e) => {
                log::error!("Failed to download {}: {e}", download.url);
                stats.failed_downloads += 1;
            }
        }
    }

    log::info!(
        "Finished catalog crawl: entries={}, details={}, downloads={}, failed_downloads={}",
        stats.entries,
        stats.details,
        stats.downloads,
        stats.failed_downloads
    );

    Ok(stats)
}
