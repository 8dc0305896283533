//! Embedding provider contract
//!
//! The index only ever sees text going in and a fixed-length vector coming
//! out. Providers are injected as `Arc<dyn Embedder>`.

use super::http::HttpEmbedder;
use super::{EmbeddingError, Result};
use crate::config::{EmbeddingProvider, EmbeddingSettings};
use std::sync::Arc;

/// Trait for embedding models (allows mocking)
#[cfg_attr(test, mockall::automock)]
pub trait Embedder: Send + Sync {
    /// Identifier recorded in the index manifest
    fn model_id(&self) -> String;

    /// Embedding dimension, if known before the first call
    fn embedding_dim(&self) -> Option<usize>;

    /// Generate embedding for a single text
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for a batch of texts
    fn embed_batch<'a>(&self, texts: &[&'a str]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }
}

/// Scale a vector to unit L2 norm in place. Zero vectors are left untouched.
pub fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        vector.iter_mut().for_each(|x| *x /= norm);
    }
}

/// Construct the provider described by the settings
pub fn build_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn Embedder>> {
    match settings.provider {
        EmbeddingProvider::Hashing => Ok(Arc::new(HashingEmbedder::new(settings.dimension)?)),
        EmbeddingProvider::Http => Ok(Arc::new(HttpEmbedder::new(settings.http.clone())?)),
    }
}

/// Offline embedder based on feature hashing
///
/// Each lowercased alphanumeric token is hashed (FNV-1a) into one of `dim`
/// buckets and counted. The count vector is L2-normalized, so components are
/// never negative and cosine scores fall in `[0, 1]`. Texts sharing words
/// score above zero; texts sharing nothing score zero, barring collisions.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
}

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

impl HashingEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(EmbeddingError::InvalidConfig(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }
        Ok(Self { dim })
    }

    fn bucket(&self, token: &str) -> usize {
        let hash = token.bytes().fold(FNV_OFFSET, |acc, b| {
            (acc ^ b as u64).wrapping_mul(FNV_PRIME)
        });
        (hash % self.dim as u64) as usize
    }

    fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_lowercase())
    }
}

impl Embedder for HashingEmbedder {
    fn model_id(&self) -> String {
        format!("hashing-fnv1a-{}", self.dim)
    }

    fn embedding_dim(&self) -> Option<usize> {
        Some(self.dim)
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embedding = vec![0.0f32; self.dim];
        for token in Self::tokens(text) {
            embedding[self.bucket(&token)] += 1.0;
        }
        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[test]
    fn test_hashing_embedding_deterministic() {
        let model = HashingEmbedder::new(384).unwrap();

        let embedding1 = model.embed("Hello world").unwrap();
        let embedding2 = model.embed("Hello world").unwrap();

        assert_eq!(embedding1, embedding2);
    }

    #[test]
    fn test_hashing_embedding_dimension() {
        let model = HashingEmbedder::new(384).unwrap();

        assert_eq!(model.embed("Test text").unwrap().len(), 384);
        assert_eq!(model.embedding_dim(), Some(384));
    }

    #[test]
    fn test_hashing_embedding_normalized() {
        let model = HashingEmbedder::new(384).unwrap();

        let embedding = model.embed("Test text with several words").unwrap();

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5, "Embedding should be L2 normalized");
    }

    #[test]
    fn test_hashing_is_case_and_punctuation_insensitive() {
        let model = HashingEmbedder::new(128).unwrap();

        let a = model.embed("Shares, CAPITAL!").unwrap();
        let b = model.embed("shares capital").unwrap();

        assert!((dot(&a, &b) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_shared_words_score_higher() {
        let model = HashingEmbedder::new(512).unwrap();

        let query = model.embed("how many shares").unwrap();
        let related = model.embed("The charter capital is 724,934,300 shares.").unwrap();

        assert!(dot(&query, &related) > 0.0);
        assert!(query.iter().all(|x| *x >= 0.0));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        let model = HashingEmbedder::new(16).unwrap();

        let embedding = model.embed("   ").unwrap();

        assert!(embedding.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(HashingEmbedder::new(0).is_err());
    }

    #[test]
    fn test_default_embed_batch() {
        let model = HashingEmbedder::new(32).unwrap();

        let embeddings = model.embed_batch(&["Hello", "World"]).unwrap();

        assert_eq!(embeddings.len(), 2);
        assert_eq!(embeddings[0], model.embed("Hello").unwrap());
        assert_eq!(embeddings[1], model.embed("World").unwrap());
    }

    #[test]
    fn test_embedder_trait_object() {
        let model: Box<dyn Embedder> = Box::new(HashingEmbedder::new(384).unwrap());

        assert_eq!(model.embed("Test").unwrap().len(), 384);
        assert_eq!(model.model_id(), "hashing-fnv1a-384");
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[test]
    fn test_build_hashing_embedder_from_settings() {
        let settings = EmbeddingSettings {
            dimension: 64,
            ..EmbeddingSettings::default()
        };

        let embedder = build_embedder(&settings).unwrap();

        assert_eq!(embedder.embedding_dim(), Some(64));
    }
}
