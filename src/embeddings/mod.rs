// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Embedding vectors and embedding providers
//!
//! A collection records the `model_id` of the provider that built it, and
//! retrieval refuses to mix models: comparing vectors from two different
//! embedding spaces is a silent-correctness hazard, so the mismatch is
//! surfaced as a hard error instead.

pub mod hash;
pub mod remote;

pub use hash::HashEmbedder;
pub use remote::RemoteEmbedder;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("Missing API key for embedding service")]
    MissingApiKey,
    #[error("Embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Fixed-dimension embedding vector
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    data: Vec<f32>,
    dimension: usize,
}

impl Embedding {
    pub fn new(data: Vec<f32>) -> Self {
        let dimension = data.len();
        Self { data, dimension }
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn magnitude(&self) -> f32 {
        self.data.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        if self.dimension != other.dimension {
            return 0.0;
        }

        let dot_product: f32 = self
            .data
            .iter()
            .zip(other.data.iter())
            .map(|(a, b)| a * b)
            .sum();

        let magnitude_self = self.magnitude();
        let magnitude_other = other.magnitude();

        if magnitude_self == 0.0 || magnitude_other == 0.0 {
            0.0
        } else {
            dot_product / (magnitude_self * magnitude_other)
        }
    }

    pub fn normalize(&mut self) {
        let magnitude = self.magnitude();
        if magnitude > 0.0 {
            for value in &mut self.data {
                *value /= magnitude;
            }
        }
    }
}

/// An embedding backend. Implementations must be deterministic: the same
/// text always maps to the same vector for a given `model_id`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Stable identifier recorded in collection manifests
    fn model_id(&self) -> &str;

    /// Output vector dimension
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical_vectors() {
        let a = Embedding::new(vec![0.5, 0.5, 0.0]);
        let b = Embedding::new(vec![0.5, 0.5, 0.0]);
        assert!((a.cosine_similarity(&b) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal_vectors() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![0.0, 1.0]);
        assert!(a.cosine_similarity(&b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_dimension_mismatch_is_zero() {
        let a = Embedding::new(vec![1.0, 0.0]);
        let b = Embedding::new(vec![1.0, 0.0, 0.0]);
        assert_eq!(a.cosine_similarity(&b), 0.0);
    }

    #[test]
    fn test_normalize_produces_unit_vector() {
        let mut e = Embedding::new(vec![3.0, 4.0]);
        e.normalize();
        assert!((e.magnitude() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector_is_noop() {
        let mut e = Embedding::new(vec![0.0, 0.0]);
        e.normalize();
        assert_eq!(e.data(), &[0.0, 0.0]);
    }
}
