// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Remote embedder backed by an OpenAI-compatible `/embeddings` endpoint

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{Embedding, EmbeddingError, EmbeddingProvider};

#[derive(serde::Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<&'a str>,
}

#[derive(serde::Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(serde::Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

pub struct RemoteEmbedder {
    client: Client,
    api_base: String,
    api_key: String,
    model: String,
    dimension: usize,
}

impl RemoteEmbedder {
    pub fn new(
        api_base: &str,
        api_key: &str,
        model: &str,
        dimension: usize,
    ) -> Result<Self, EmbeddingError> {
        if api_key.is_empty() {
            return Err(EmbeddingError::MissingApiKey);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            dimension,
        })
    }

    async fn request_embeddings(&self, inputs: Vec<&str>) -> Result<Vec<Embedding>, EmbeddingError> {
        let count = inputs.len();
        let request = EmbeddingRequest {
            model: &self.model,
            input: inputs,
        };

        let response = self
            .client
            .post(format!("{}/embeddings", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let mut parsed: EmbeddingResponse = response.json().await?;
        // The API is documented to preserve order, but sort by index anyway
        parsed.data.sort_by_key(|d| d.index);

        if parsed.data.len() != count {
            return Err(EmbeddingError::InvalidInput(format!(
                "Expected {} embeddings, got {}",
                count,
                parsed.data.len()
            )));
        }

        let mut embeddings = Vec::with_capacity(parsed.data.len());
        for data in parsed.data {
            if data.embedding.len() != self.dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimension,
                    actual: data.embedding.len(),
                });
            }
            embeddings.push(Embedding::new(data.embedding));
        }

        debug!("Embedded {} texts with model {}", count, self.model);
        Ok(embeddings)
    }
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbedder {
    fn model_id(&self) -> &str {
        &self.model
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
        let mut embeddings = self.request_embeddings(vec![text]).await?;
        Ok(embeddings.remove(0))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request_embeddings(texts.iter().map(|t| t.as_str()).collect())
            .await
    }
}
