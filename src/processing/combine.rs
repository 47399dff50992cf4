use std::collections::{HashMap, HashSet};

use crate::domain::catalog::{CatalogEntry, CombinedProduct, ProductDetails};
use crate::repository::{CatalogReader, CatalogResult, CatalogWriter};

fn key(name: &str, url: &str) -> (String, String) {
    (name.to_string(), url.to_string())
}

/// Left-join detail rows with listing rows on trimmed `(name, url)`.
///
/// Both inputs are deduplicated on the key first (first row wins). The
/// detail `test_types` wins when non-empty; the detail remote flag wins when
/// the page reported one.
pub fn combine(details: &[ProductDetails], entries: &[CatalogEntry]) -> Vec<CombinedProduct> {
    let mut listing: HashMap<(String, String), CatalogEntry> = HashMap::new();
    for entry in entries {
        let name = entry.name.trim();
        let url = entry.url.trim();
        listing.entry(key(name, url)).or_insert_with(|| CatalogEntry {
            name: name.to_string(),
            url: url.to_string(),
            ..entry.clone()
        });
    }

    let mut seen = HashSet::new();
    let mut combined = Vec::new();
    for product in details {
        let name = product.name.trim();
        let url = product.url.trim();
        if !seen.insert(key(name, url)) {
            continue;
        }

        let entry = listing.get(&key(name, url));
        let test_types = if product.test_types.is_empty() {
            entry.map(|e| e.test_types.clone()).unwrap_or_default()
        } else {
            product.test_types.clone()
        };
        let remote_testing = product
            .remote_testing
            .or(entry.map(|e| e.remote_testing))
            .unwrap_or(false);

        combined.push(CombinedProduct {
            name: name.to_string(),
            url: url.to_string(),
            description: product.description.clone(),
            job_levels: product.job_levels.clone(),
            languages: product.languages.clone(),
            assessment_length: product.assessment_length.clone(),
            test_types,
            remote_testing,
            adaptive_irt: entry.is_some_and(|e| e.adaptive_irt),
        });
    }

    combined
}

/// Read the scraped tables, merge them and write the combined table.
pub fn process_combine<R>(repo: &R) -> CatalogResult<usize>
where
    R: CatalogReader + CatalogWriter,
{
    let details = repo.list_details()?;
    let entries = repo.list_entries()?;
    let combined = combine(&details, &entries);
    let written = repo.write_combined(&combined)?;

    log::info!(
        "Combined {} detail rows with {} listing rows into {written} products",
        details.len(),
        entries.len()
    );

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::{combine, process_combine};
    use crate::domain::catalog::{CatalogEntry, ProductDetails};
    use crate::repository::catalog::CsvCatalogRepository;
    use crate::repository::{CatalogReader, CatalogWriter};

    fn details(name: &str, url: &str) -> ProductDetails {
        ProductDetails {
            name: name.to_string(),
            url: url.to_string(),
            ..Default::default()
        }
    }

    fn entry(name: &str, url: &str) -> CatalogEntry {
        CatalogEntry {
            name: name.to_string(),
            url: url.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn join_trims_keys_and_fills_missing_test_types() {
        let mut product = details("  Java 8 ", " https://x/java/ ");
        product.assessment_length = "= 18".to_string();
        let mut listed = entry("Java 8", "https://x/java/");
        listed.test_types = "K".to_string();
        listed.adaptive_irt = true;
        listed.remote_testing = true;

        let combined = combine(&[product], &[listed]);

        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].name, "Java 8");
        assert_eq!(combined[0].url, "https://x/java/");
        assert_eq!(combined[0].test_types, "K");
        assert!(combined[0].adaptive_irt);
        assert!(combined[0].remote_testing);
        assert_eq!(combined[0].assessment_length, "= 18");
    }

    #[test]
    fn detail_values_take_precedence() {
        let mut product = details("A", "u");
        product.test_types = "P".to_string();
        product.remote_testing = Some(false);
        let mut listed = entry("A", "u");
        listed.test_types = "K".to_string();
        listed.remote_testing = true;

        let combined = combine(&[product], &[listed]);

        assert_eq!(combined[0].test_types, "P");
        assert!(!combined[0].remote_testing);
    }

    #[test]
    fn unmatched_details_are_kept_and_duplicates_dropped() {
        let mut first = details("A", "u");
        first.description = "first".to_string();
        let mut second = details("A", "u");
        second.description = "second".to_string();

        let combined = combine(&[first, second, details("B", "v")], &[entry("C", "w")]);

        assert_eq!(combined.len(), 2);
        assert_eq!(combined[0].description, "first");
        assert_eq!(combined[1].name, "B");
        assert!(!combined[1].adaptive_irt);
        assert_eq!(combined[1].test_types, "");
    }

    #[test]
    fn combine_round_trips_through_csv_tables() {
        let dir = tempfile::tempdir().expect("temp dir");
        let repo = CsvCatalogRepository::in_dir(dir.path());
        repo.write_details(&[details("A", "u")]).expect("details written");
        repo.write_entries(&[entry("A", "u")]).expect("entries written");

        let written = process_combine(&repo).expect("combine succeeds");

        assert_eq!(written, 1);
        assert_eq!(repo.list_combined().expect("combined table")[0].name, "A");
    }
}
