use serde::{Deserialize, Serialize};

/// A row scraped from a catalog listing page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub url: String,
    pub remote_testing: bool,
    pub adaptive_irt: bool,
    pub test_types: String,
}

/// A downloadable document linked from a product page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Download {
    pub name: String,
    pub url: String,
}

/// A row scraped from a product detail page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    pub name: String,
    pub url: String,
    pub description: String,
    pub job_levels: String,
    pub languages: String,
    pub assessment_length: String,
    pub test_types: String,
    /// `None` when the detail page carries no remote-testing indicator.
    pub remote_testing: Option<bool>,
    #[serde(skip)]
    pub downloads: Vec<Download>,
}

/// Detail row joined with its listing row; the metadata source for indexing.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedProduct {
    pub name: String,
    pub url: String,
    pub description: String,
    pub job_levels: String,
    pub languages: String,
    pub assessment_length: String,
    pub test_types: String,
    pub remote_testing: bool,
    pub adaptive_irt: bool,
}
