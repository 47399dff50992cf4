use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::catalog::{CatalogEntry, CombinedProduct, ProductDetails};
use crate::repository::{CatalogReader, CatalogResult, CatalogWriter};

/// CSV-backed catalog tables living in a single data directory.
pub struct CsvCatalogRepository {
    entries_path: PathBuf,
    details_path: PathBuf,
    combined_path: PathBuf,
}

impl CsvCatalogRepository {
    pub fn new(entries_path: PathBuf, details_path: PathBuf, combined_path: PathBuf) -> Self {
        Self {
            entries_path,
            details_path,
            combined_path,
        }
    }

    /// Use the default file names inside `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(
            data_dir.join("catalog.csv"),
            data_dir.join("details.csv"),
            data_dir.join("combined.csv"),
        )
    }
}

fn read_table<T: DeserializeOwned>(path: &Path) -> CatalogResult<Vec<T>> {
    let mut reader = csv::Reader::from_path(path)?;
    let rows = reader.deserialize().collect::<Result<Vec<T>, _>>()?;
    Ok(rows)
}

fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> CatalogResult<usize> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;

    Ok(rows.len())
}

impl CatalogReader for CsvCatalogRepository {
    fn list_entries(&self) -> CatalogResult<Vec<CatalogEntry>> {
        read_table(&self.entries_path)
    }

    fn list_details(&self) -> CatalogResult<Vec<ProductDetails>> {
        read_table(&self.details_path)
    }

    fn list_combined(&self) -> CatalogResult<Vec<CombinedProduct>> {
        read_table(&self.combined_path)
    }
}

impl CatalogWriter for CsvCatalogRepository {
    fn write_entries(&self, entries: &[CatalogEntry]) -> CatalogResult<usize> {
        write_table(&self.entries_path, entries)
    }

    fn write_details(&self, details: &[ProductDetails]) -> CatalogResult<usize> {
        write_table(&self.details_path, details)
    }

    fn write_combined(&self, products: &[CombinedProduct]) -> CatalogResult<usize> {
        write_table(&self.combined_path, products)
    }
}

#[cfg(test)]
mod tests {
    use super::CsvCatalogRepository;
    use crate::domain::catalog::{CatalogEntry, ProductDetails};
    use crate::repository::{CatalogReader, CatalogWriter};

    #[test]
    fn tables_survive_a_write_read_cycle() {
        let dir = tempfile::tempdir().expect("temp dir");
        let repo = CsvCatalogRepository::in_dir(&dir.path().join("nested"));

        let entries = vec![CatalogEntry {
            name: "Java 8 (New)".to_string(),
            url: "https://example.com/java-8".to_string(),
            remote_testing: true,
            adaptive_irt: false,
            test_types: "K, P".to_string(),
        }];
        let details = vec![ProductDetails {
            name: "Java 8 (New)".to_string(),
            url: "https://example.com/java-8".to_string(),
            assessment_length: "Approximate Completion Time in minutes = 18".to_string(),
            remote_testing: None,
            ..Default::default()
        }];

        assert_eq!(repo.write_entries(&entries).expect("write entries"), 1);
        assert_eq!(repo.write_details(&details).expect("write details"), 1);

        assert_eq!(repo.list_entries().expect("read entries"), entries);
        let loaded = repo.list_details().expect("read details");
        assert_eq!(loaded, details);
        assert_eq!(loaded[0].remote_testing, None);
    }

    #[test]
    fn missing_table_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let repo = CsvCatalogRepository::in_dir(dir.path());

        assert!(repo.list_combined().is_err());
    }
}
