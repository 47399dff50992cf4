pub mod crawlers;
pub mod domain;
pub mod error;
pub mod models;
pub mod processing;
pub mod repository;
pub mod routes;

/// Minimum similarity a hit must strictly exceed to be returned.
pub const SCORE_THRESHOLD: f32 = 0.1;

/// Number of candidates requested from the vector index per query.
///
/// Over-fetched so enough unique assessments survive thresholding and
/// deduplication.
pub const CANDIDATE_POOL: usize = 30;

/// Maximum number of unique assessments returned per query.
pub const MAX_RESULTS: usize = 10;
