use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use crate::domain::assessment::{HitMetadata, RetrievedHit};
use crate::error::IndexError;
use crate::processing::embedding::Embedder;
use crate::repository::VectorSearch;

const INDEX_FILE: &str = "index.usearch";
const CHUNKS_FILE: &str = "chunks.json";
const MANIFEST_FILE: &str = "manifest.json";

/// A text chunk and the metadata it was indexed with.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredChunk {
    pub key: u64,
    pub text: String,
    pub metadata: HitMetadata,
}

/// Describes how an index on disk was produced.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexManifest {
    pub model: String,
    pub dimensions: usize,
    pub chunks: usize,
    pub built_at: DateTime<Utc>,
}

/// Cosine HNSW index over chunk embeddings, persisted as three files in a
/// directory. Read-only once built or loaded.
pub struct UsearchIndex {
    index: Index,
    chunks: HashMap<u64, StoredChunk>,
    manifest: IndexManifest,
    embedder: Arc<dyn Embedder>,
}

fn new_index(dimensions: usize) -> Result<Index, IndexError> {
    Index::new(&IndexOptions {
        dimensions,
        metric: MetricKind::Cos,
        quantization: ScalarKind::F32,
        ..Default::default()
    })
    .map_err(|e| IndexError::Usearch(e.to_string()))
}

impl UsearchIndex {
    /// Embed every chunk and build an in-memory index.
    pub fn build(
        documents: Vec<(String, HitMetadata)>,
        embedder: Arc<dyn Embedder>,
    ) -> Result<Self, IndexError> {
        if documents.is_empty() {
            return Err(IndexError::NoDocuments);
        }

        let texts: Vec<String> = documents.iter().map(|(text, _)| text.clone()).collect();
        let embeddings = embedder.embed(&texts)?;
        let dimensions = embeddings.first().map(Vec::len).unwrap_or_default();

        let index = new_index(dimensions)?;
        index
            .reserve(documents.len())
            .map_err(|e| IndexError::Usearch(e.to_string()))?;

        let mut chunks = HashMap::with_capacity(documents.len());
        for (key, ((text, metadata), embedding)) in
            (0_u64..).zip(documents.into_iter().zip(embeddings))
        {
            index
                .add(key, embedding.as_slice())
                .map_err(|e| IndexError::Usearch(e.to_string()))?;
            chunks.insert(
                key,
                StoredChunk {
                    key,
                    text,
                    metadata,
                },
            );
        }

        let manifest = IndexManifest {
            model: embedder.model_id().to_string(),
            dimensions,
            chunks: chunks.len(),
            built_at: Utc::now(),
        };

        Ok(Self {
            index,
            chunks,
            manifest,
            embedder,
        })
    }

    /// Write the index, chunk sidecar and manifest into `dir`.
    pub fn save(&self, dir: &Path) -> Result<(), IndexError> {
        fs::create_dir_all(dir)?;

        self.index
            .save(&dir.join(INDEX_FILE).to_string_lossy())
            .map_err(|e| IndexError::Usearch(e.to_string()))?;

        let mut chunks: Vec<&StoredChunk> = self.chunks.values().collect();
        chunks.sort_by_key(|chunk| chunk.key);
        fs::write(dir.join(CHUNKS_FILE), serde_json::to_vec(&chunks)?)?;
        fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_vec_pretty(&self.manifest)?,
        )?;

        Ok(())
    }

    /// Load an index saved by [`UsearchIndex::save`].
    ///
    /// Fails when the index was built with a different embedding model.
    pub fn load(dir: &Path, embedder: Arc<dyn Embedder>) -> Result<Self, IndexError> {
        let manifest: IndexManifest =
            serde_json::from_slice(&fs::read(dir.join(MANIFEST_FILE))?)?;

        if manifest.model != embedder.model_id() {
            return Err(IndexError::ModelMismatch {
                indexed: manifest.model,
                active: embedder.model_id().to_string(),
            });
        }

        let chunks: Vec<StoredChunk> = serde_json::from_slice(&fs::read(dir.join(CHUNKS_FILE))?)?;

        let index = new_index(manifest.dimensions)?;
        index
            .load(&dir.join(INDEX_FILE).to_string_lossy())
            .map_err(|e| IndexError::Usearch(e.to_string()))?;

        log::info!(
            "Loaded vector index from {}: model={}, dimensions={}, chunks={}",
            dir.display(),
            manifest.model,
            manifest.dimensions,
            chunks.len()
        );

        Ok(Self {
            index,
            chunks: chunks.into_iter().map(|chunk| (chunk.key, chunk)).collect(),
            manifest,
            embedder,
        })
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl VectorSearch for UsearchIndex {
    fn similarity_search_with_score(
        &self,
        query_text: &str,
        k: usize,
    ) -> Result<Vec<RetrievedHit>, IndexError> {
        if self.index.size() == 0 || k == 0 {
            return Ok(Vec::new());
        }

        let query = self.embedder.embed_one(query_text)?;
        if query.len() != self.manifest.dimensions {
            return Err(IndexError::DimensionMismatch {
                expected: self.manifest.dimensions,
                got: query.len(),
            });
        }

        let neighbors = self
            .index
            .search(query.as_slice(), k.min(self.index.size()))
            .map_err(|e| IndexError::Usearch(e.to_string()))?;

        let hits = neighbors
            .keys
            .iter()
            .zip(neighbors.distances.iter())
            .filter_map(|(key, distance)| {
                let Some(chunk) = self.chunks.get(key) else {
                    log::warn!("Vector index returned unknown chunk key {key}");
                    return None;
                };
                Some(RetrievedHit {
                    document: chunk.text.clone(),
                    metadata: chunk.metadata.clone(),
                    score: 1.0 - distance,
                })
            })
            .collect();

        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::UsearchIndex;
    use crate::domain::assessment::HitMetadata;
    use crate::error::{EmbeddingError, IndexError};
    use crate::processing::embedding::{Embedder, normalize_embedding};
    use crate::repository::VectorSearch;

    /// Maps known words to fixed axes so neighbors are predictable.
    struct AxisEmbedder(&'static str);

    impl Embedder for AxisEmbedder {
        fn model_id(&self) -> &str {
            self.0
        }

        fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
            Ok(texts
                .iter()
                .map(|text| {
                    let v = vec![
                        text.matches("java").count() as f32,
                        text.matches("sales").count() as f32,
                        text.matches("numerical").count() as f32 + 0.01,
                    ];
                    normalize_embedding(&v)
                })
                .collect())
        }
    }

    fn named(name: &str) -> HitMetadata {
        HitMetadata {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn sample_index(model: &'static str) -> UsearchIndex {
        UsearchIndex::build(
            vec![
                ("java java developer".to_string(), named("Java")),
                ("sales sales pitch".to_string(), named("Sales")),
                ("numerical reasoning".to_string(), named("Numerical")),
            ],
            Arc::new(AxisEmbedder(model)),
        )
        .expect("index builds")
    }

    #[test]
    fn nearest_chunk_comes_first_with_highest_score() {
        let index = sample_index("axis");

        let hits = index
            .similarity_search_with_score("java", 3)
            .expect("search succeeds");

        assert_eq!(hits[0].metadata.name, "Java");
        assert!(hits[0].score > 0.9);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn empty_document_set_is_rejected() {
        let result = UsearchIndex::build(Vec::new(), Arc::new(AxisEmbedder("axis")));

        assert!(matches!(result, Err(IndexError::NoDocuments)));
    }

    #[test]
    fn saved_index_reloads_with_same_model() {
        let dir = tempfile::tempdir().expect("temp dir");
        sample_index("axis").save(dir.path()).expect("index saves");

        let loaded =
            UsearchIndex::load(dir.path(), Arc::new(AxisEmbedder("axis"))).expect("index loads");
        let hits = loaded
            .similarity_search_with_score("sales", 1)
            .expect("search succeeds");

        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.manifest().dimensions, 3);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.name, "Sales");
    }

    #[test]
    fn loading_with_another_model_fails() {
        let dir = tempfile::tempdir().expect("temp dir");
        sample_index("axis").save(dir.path()).expect("index saves");

        let result = UsearchIndex::load(dir.path(), Arc::new(AxisEmbedder("other")));

        assert!(matches!(result, Err(IndexError::ModelMismatch { .. })));
    }
}
