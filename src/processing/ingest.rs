use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::crawlers::html_to_text;
use crate::domain::assessment::HitMetadata;
use crate::domain::catalog::CombinedProduct;
use crate::error::{DocumentError, IngestError};
use crate::models::config::IngestConfig;
use crate::processing::embedding::Embedder;
use crate::repository::CatalogReader;
use crate::repository::index::UsearchIndex;

const SEPARATOR: &str = "\n\n";

#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub documents: usize,
    pub unmatched: usize,
    pub failed: usize,
    pub chunks: usize,
}

/// Split text on blank lines and merge the pieces into chunks of at most
/// `chunk_size` chars, carrying up to `chunk_overlap` chars of trailing
/// pieces into the next chunk.
///
/// A single piece longer than `chunk_size` becomes its own chunk.
pub fn split_text(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let separator_len = SEPARATOR.chars().count();
    let splits = text
        .split(SEPARATOR)
        .map(str::trim)
        .filter(|split| !split.is_empty());

    let mut chunks = Vec::new();
    let mut current: VecDeque<(&str, usize)> = VecDeque::new();
    let mut total = 0;

    let join = |current: &VecDeque<(&str, usize)>| {
        current
            .iter()
            .map(|(split, _)| *split)
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    };

    for split in splits {
        let len = split.chars().count();
        let joiner = |current: &VecDeque<(&str, usize)>| {
            if current.is_empty() { 0 } else { separator_len }
        };

        if total + len + joiner(&current) > chunk_size && !current.is_empty() {
            chunks.push(join(&current));
            while total > chunk_overlap
                || (total > 0 && total + len + joiner(&current) > chunk_size)
            {
                let Some((_, first_len)) = current.pop_front() else {
                    break;
                };
                total -= first_len + if current.is_empty() { 0 } else { separator_len };
            }
        }

        current.push_back((split, len));
        total += len + if current.len() > 1 { separator_len } else { 0 };
    }

    if !current.is_empty() {
        chunks.push(join(&current));
    }

    chunks
}

/// Find the catalog row a downloaded file belongs to: the first row whose
/// trimmed name prefixes the file stem.
pub fn match_metadata<'a>(
    stem: &str,
    products: &'a [CombinedProduct],
) -> Option<&'a CombinedProduct> {
    let stem = stem.trim();
    products.iter().find(|product| {
        let name = product.name.trim();
        !name.is_empty()
            && (stem.starts_with(name) || stem.starts_with(&name.replace(['/', '\\', ':'], "_")))
    })
}

fn flag(value: bool) -> String {
    if value { "True" } else { "False" }.to_string()
}

/// Metadata attached to every chunk of a product's documents.
pub fn chunk_metadata(product: &CombinedProduct) -> HitMetadata {
    HitMetadata {
        name: product.name.clone(),
        url: product.url.clone(),
        remote_testing: flag(product.remote_testing),
        adaptive_irt: flag(product.adaptive_irt),
        duration: product.assessment_length.clone(),
        test_type: product.test_types.clone(),
    }
}

/// Extract plain text from a downloaded document based on its extension.
pub fn extract_document_text(path: &Path) -> Result<String, DocumentError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => {
            let bytes = fs::read(path)?;
            pdf_extract::extract_text_from_mem(&bytes).map_err(|e| DocumentError::Pdf(e.to_string()))
        }
        "html" | "htm" => Ok(html_to_text(&fs::read_to_string(path)?)),
        "txt" => Ok(fs::read_to_string(path)?),
        other => Err(DocumentError::Unsupported(other.to_string())),
    }
}

/// Turn every supported file in `downloads_dir` into metadata-tagged chunks.
pub fn collect_chunks(
    downloads_dir: &Path,
    products: &[CombinedProduct],
    config: IngestConfig,
) -> Result<(Vec<(String, HitMetadata)>, IngestStats), IngestError> {
    let mut paths = fs::read_dir(downloads_dir)?
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<Result<Vec<_>, _>>()?;
    paths.sort();

    let mut stats = IngestStats::default();
    let mut chunks = Vec::new();

    for path in paths.iter().filter(|path| path.is_file()) {
        let text = match extract_document_text(path) {
            Ok(text) => text,
            Err(DocumentError::Unsupported(_)) => continue,
            Err(e) => {
                log::error!("Error processing {}: {e}", path.display());
                stats.failed += 1;
                continue;
            }
        };

        let stem = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        let Some(product) = match_metadata(&stem, products) else {
            log::warn!("No matching metadata found for document '{stem}'");
            stats.unmatched += 1;
            continue;
        };

        let metadata = chunk_metadata(product);
        let pieces = split_text(&text, config.chunk_size, config.chunk_overlap);
        log::info!(
            "Loaded {} as '{}' ({} chunks)",
            path.display(),
            product.name,
            pieces.len()
        );
        stats.documents += 1;
        chunks.extend(pieces.into_iter().map(|piece| (piece, metadata.clone())));
    }

    stats.chunks = chunks.len();
    Ok((chunks, stats))
}

/// Build and persist the vector index from the combined catalog table and
/// the downloaded documents.
pub fn process_ingest<R>(
    repo: &R,
    downloads_dir: &Path,
    index_dir: &Path,
    embedder: Arc<dyn Embedder>,
    config: IngestConfig,
) -> Result<IngestStats, IngestError>
where
    R: CatalogReader,
{
    let products = repo.list_combined()?;
    let (chunks, stats) = collect_chunks(downloads_dir, &products, config)?;

    if stats.unmatched > 0 || stats.failed > 0 {
        log::warn!(
            "Skipped documents during ingest: unmatched={}, failed={}",
            stats.unmatched,
            stats.failed
        );
    }

    let index = UsearchIndex::build(chunks, embedder)?;
    index.save(index_dir)?;

    log::info!(
        "Ingestion successful: processed {} documents into {} text chunks at {}",
        stats.documents,
        stats.chunks,
        index_dir.display()
    );

    Ok(stats)
}
