pub mod combine;
pub mod crawler;
pub mod embedding;
pub mod ingest;
pub mod metadata;
pub mod query;
pub mod ranking;
