use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::error::{ConfigError, EmbeddingError};

/// Text-to-vector function shared by the indexer and the query path.
///
/// The same model must be used on both sides; [`Embedder::model_id`] is
/// persisted with the index and checked on load.
pub trait Embedder: Send + Sync {
    fn model_id(&self) -> &str;

    /// Embed a batch of texts, returning one unit-length vector per input.
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.embed(&[text.to_string()])?
            .into_iter()
            .next()
            .ok_or(EmbeddingError::CountMismatch {
                expected: 1,
                got: 0,
            })
    }
}

/// Resolve a configured model name to a fastembed model.
pub fn parse_model(name: &str) -> Result<EmbeddingModel, ConfigError> {
    match name {
        "paraphrase-multilingual-MiniLM-L12-v2" => Ok(EmbeddingModel::ParaphraseMLMiniLML12V2),
        "multilingual-e5-large" => Ok(EmbeddingModel::MultilingualE5Large),
        "all-MiniLM-L6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        other => Err(ConfigError::UnknownModel(other.to_string())),
    }
}

/// ONNX sentence embedder backed by fastembed.
///
/// Inference needs `&mut TextEmbedding`, so the session is guarded by a
/// mutex and requests embed one at a time.
pub struct FastEmbedder {
    model_id: String,
    inner: Mutex<TextEmbedding>,
}

impl FastEmbedder {
    pub fn try_new(model_id: &str, model: EmbeddingModel) -> Result<Self, EmbeddingError> {
        let inner = TextEmbedding::try_new(
            InitOptions::new(model).with_show_download_progress(false),
        )
        .map_err(|error| EmbeddingError::Init {
            model: model_id.to_string(),
            message: format!("{error:?}"),
        })?;

        Ok(Self {
            model_id: model_id.to_string(),
            inner: Mutex::new(inner),
        })
    }
}

impl Embedder for FastEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut session = self
            .inner
            .lock()
            .map_err(|_| EmbeddingError::Generate("embedding session poisoned".to_string()))?;
        let vectors = session
            .embed(texts.to_vec(), None)
            .map_err(|error| EmbeddingError::Generate(format!("{error:?}")))?;

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                got: vectors.len(),
            });
        }

        Ok(vectors.iter().map(|v| normalize_embedding(v)).collect())
    }
}

/// Normalize a vector to unit length.
///
/// Returns the original vector when the norm is zero.
pub fn normalize_embedding(vec: &[f32]) -> Vec<f32> {
    let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        vec.to_vec()
    } else {
        vec.iter().map(|x| x / norm).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_embedding, parse_model};

    #[test]
    fn normalize_produces_unit_length() {
        let v = normalize_embedding(&[3.0, 4.0]);

        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn normalize_leaves_zero_vector() {
        assert_eq!(normalize_embedding(&[0.0, 0.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn unknown_model_is_rejected() {
        assert!(parse_model("paraphrase-multilingual-MiniLM-L12-v2").is_ok());
        assert!(parse_model("word2vec").is_err());
    }
}
