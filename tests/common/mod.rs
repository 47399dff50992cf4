//! Helpers for integration tests.

use std::sync::Arc;

use assessment_finder::domain::assessment::HitMetadata;
use assessment_finder::error::EmbeddingError;
use assessment_finder::processing::embedding::{Embedder, normalize_embedding};
use assessment_finder::repository::index::UsearchIndex;

const VOCABULARY: [&str; 11] = [
    "java",
    "developer",
    "spring",
    "hibernate",
    "sales",
    "negotiation",
    "skills",
    "numerical",
    "reasoning",
    "python",
    "data",
];

/// Bag-of-words embedder over a fixed vocabulary.
///
/// The first axis carries a small constant so empty text still maps to a
/// non-zero vector.
pub struct VocabularyEmbedder;

pub const MODEL_ID: &str = "test-vocabulary";

impl Embedder for VocabularyEmbedder {
    fn model_id(&self) -> &str {
        MODEL_ID
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts
            .iter()
            .map(|text| {
                let mut v = vec![0.0_f32; VOCABULARY.len() + 1];
                v[0] = 0.05;
                for word in text.split(|c: char| !c.is_alphanumeric()) {
                    let word = word.to_lowercase();
                    if let Some(pos) = VOCABULARY.iter().position(|known| *known == word) {
                        v[pos + 1] += 1.0;
                    }
                }
                normalize_embedding(&v)
            })
            .collect())
    }
}

pub fn metadata(name: &str, remote: &str, duration: &str) -> HitMetadata {
    HitMetadata {
        name: name.to_string(),
        url: format!("https://catalog.example.com/{}/", name.to_lowercase().replace(' ', "-")),
        remote_testing: remote.to_string(),
        adaptive_irt: "False".to_string(),
        duration: duration.to_string(),
        test_type: "K".to_string(),
    }
}

/// Small index: two chunks for "Java 8", one each for "Sales" and
/// "Python", and one unnamed chunk.
pub fn sample_index() -> UsearchIndex {
    let chunks = vec![
        (
            "java developer spring".to_string(),
            metadata("Java 8", "True", "Approx. = 30 minutes"),
        ),
        (
            "java developer hibernate".to_string(),
            metadata("Java 8", "False", "60"),
        ),
        (
            "sales negotiation skills".to_string(),
            metadata("Sales", "false", "20"),
        ),
        (
            "python data developer".to_string(),
            metadata("Python", " TRUE ", "Max = 11"),
        ),
        (
            "numerical reasoning".to_string(),
            metadata("", "True", ""),
        ),
    ];

    UsearchIndex::build(chunks, Arc::new(VocabularyEmbedder)).expect("sample index builds")
}
