use crate::domain::assessment::RetrievedHit;
use crate::domain::catalog::{CatalogEntry, CombinedProduct, ProductDetails};
use crate::error::{CatalogError, IndexError};

pub mod catalog;
pub mod index;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Read-only similarity search over embedded chunks.
pub trait VectorSearch: Send + Sync {
    /// Return up to `k` hits ordered from most to least relevant.
    fn similarity_search_with_score(
        &self,
        query_text: &str,
        k: usize,
    ) -> Result<Vec<RetrievedHit>, IndexError>;
}

pub trait CatalogReader {
    fn list_entries(&self) -> CatalogResult<Vec<CatalogEntry>>;
    fn list_details(&self) -> CatalogResult<Vec<ProductDetails>>;
    fn list_combined(&self) -> CatalogResult<Vec<CombinedProduct>>;
}

pub trait CatalogWriter {
    fn write_entries(&self, entries: &[CatalogEntry]) -> CatalogResult<usize>;
    fn write_details(&self, details: &[ProductDetails]) -> CatalogResult<usize>;
    fn write_combined(&self, products: &[CombinedProduct]) -> CatalogResult<usize>;
}
