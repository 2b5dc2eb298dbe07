// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Deterministic local embedder
//!
//! Token-frequency hashing: each lowercased token is hashed into a bucket
//! of the output vector with a hash-derived sign. Texts sharing vocabulary
//! land in overlapping buckets and score high cosine similarity, which is
//! enough signal for retrieval without any model download or API key.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::{Embedding, EmbeddingError, EmbeddingProvider};

pub const HASH_MODEL_ID: &str = "hash-embedder-v1";

pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| t.to_string())
            .collect()
    }

    fn embed_tokens(&self, tokens: &[String]) -> Embedding {
        let mut data = vec![0.0f32; self.dimension];

        for token in tokens {
            let mut hasher = Sha256::new();
            hasher.update(token.as_bytes());
            let hash = hasher.finalize();

            let bucket = u64::from_le_bytes(hash[0..8].try_into().unwrap()) as usize % self.dimension;
            let sign = if hash[8] & 1 == 0 { 1.0 } else { -1.0 };
            data[bucket] += sign;

            // Second bucket softens hash collisions between unrelated tokens
            let bucket2 =
                u64::from_le_bytes(hash[9..17].try_into().unwrap()) as usize % self.dimension;
            let sign2 = if hash[17] & 1 == 0 { 1.0 } else { -1.0 };
            data[bucket2] += 0.5 * sign2;
        }

        let mut embedding = Embedding::new(data);
        embedding.normalize();
        embedding
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    fn model_id(&self) -> &str {
        HASH_MODEL_ID
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Cannot embed empty text".to_string(),
            ));
        }
        let tokens = Self::tokenize(text);
        Ok(self.embed_tokens(&tokens))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_embedding_is_deterministic() {
        let embedder = HashEmbedder::new(384);
        let a = embedder.embed("maximum axle load").await.unwrap();
        let b = embedder.embed("maximum axle load").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_dimension_matches_config() {
        let embedder = HashEmbedder::new(128);
        let e = embedder.embed("some text").await.unwrap();
        assert_eq!(e.dimension(), 128);
    }

    #[tokio::test]
    async fn test_output_is_normalized() {
        let embedder = HashEmbedder::new(384);
        let e = embedder.embed("normalized output vector").await.unwrap();
        assert!((e.magnitude() - 1.0).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_scores_higher() {
        let embedder = HashEmbedder::new(384);
        let doc = embedder
            .embed("The maximum axle load is 11,500 kg for this truck")
            .await
            .unwrap();
        let related = embedder.embed("What is the maximum axle load?").await.unwrap();
        let unrelated = embedder
            .embed("Recipe for sourdough bread with rye flour")
            .await
            .unwrap();

        assert!(doc.cosine_similarity(&related) > doc.cosine_similarity(&unrelated));
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let embedder = HashEmbedder::new(384);
        let result = embedder.embed("   ").await;
        assert!(matches!(result, Err(EmbeddingError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_batch_matches_single() {
        let embedder = HashEmbedder::new(64);
        let texts = vec!["first text".to_string(), "second text".to_string()];
        let batch = embedder.embed_batch(&texts).await.unwrap();
        let single = embedder.embed("first text").await.unwrap();
        assert_eq!(batch[0], single);
    }
}
