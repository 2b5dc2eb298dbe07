// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Retrieval over a persisted collection
//!
//! The engine binds a collection and an embedder at construction and
//! refuses the pairing if the collection was built in a different embedding
//! space. A query that matches nothing returns a fixed no-match text; the
//! router is expected to answer anyway and flag the response as not
//! document-based.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use crate::agent::{Tool, ToolError};
use crate::embeddings::EmbeddingProvider;
use crate::index::{CollectionStore, IndexError, OpenCollection, ScoredChunk};

pub const NO_MATCH_TEXT: &str = "No relevant passages found in the indexed documents.";

/// Configuration for retrieval queries
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Number of passages returned per query
    pub top_k: usize,
    /// Minimum cosine similarity for a passage to count as a match
    pub min_score: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            min_score: 0.25,
        }
    }
}

/// Similarity search over one collection, bound at construction
pub struct RetrievalEngine {
    collection: OpenCollection,
    embedder: Arc<dyn EmbeddingProvider>,
    config: RetrievalConfig,
}

impl RetrievalEngine {
    /// Open a collection for querying.
    ///
    /// Fails with `ModelMismatch` if the collection manifest records a
    /// different embedding model than `embedder`.
    pub fn open(
        store: &CollectionStore,
        collection_id: &str,
        embedder: Arc<dyn EmbeddingProvider>,
        config: RetrievalConfig,
    ) -> Result<Self, IndexError> {
        let collection = store.open(collection_id)?;

        let manifest = collection.manifest();
        if manifest.embedding_model != embedder.model_id() {
            return Err(IndexError::ModelMismatch {
                collection_model: manifest.embedding_model.clone(),
                query_model: embedder.model_id().to_string(),
            });
        }
        if manifest.dimension != embedder.dimension() {
            return Err(IndexError::DimensionMismatch {
                expected: manifest.dimension,
                actual: embedder.dimension(),
            });
        }

        Ok(Self {
            collection,
            embedder,
            config,
        })
    }

    pub fn collection_name(&self) -> &str {
        &self.collection.manifest().name
    }

    /// Top-ranked chunks for a free-text query
    pub async fn search(&self, query: &str) -> Result<Vec<ScoredChunk>, IndexError> {
        let embedding = self.embedder.embed(query).await?;
        let results = self
            .collection
            .search(&embedding, self.config.top_k, Some(self.config.min_score))?;
        debug!(
            "Query matched {} chunk(s) in {}",
            results.len(),
            self.collection_name()
        );
        Ok(results)
    }

    /// Query formatted as passage text for the router.
    /// No matches is a low-confidence result, not an error.
    pub async fn query(&self, query: &str) -> Result<String, IndexError> {
        let results = self.search(query).await?;
        if results.is_empty() {
            return Ok(NO_MATCH_TEXT.to_string());
        }

        let passages: Vec<String> = results
            .iter()
            .map(|chunk| {
                format!(
                    "[source: {} | relevance: {:.2}]\n{}",
                    chunk.source, chunk.score, chunk.text
                )
            })
            .collect();
        Ok(passages.join("\n\n"))
    }
}

/// `document_search` tool exposed to the router
pub struct DocumentSearchTool {
    engine: RetrievalEngine,
}

impl DocumentSearchTool {
    pub fn new(engine: RetrievalEngine) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl Tool for DocumentSearchTool {
    fn name(&self) -> &str {
        "document_search"
    }

    fn description(&self) -> &str {
        "Search for relevant information in the user's indexed documents. \
         Input: a free-text query. Output: the most relevant document passages, \
         or a no-match notice."
    }

    async fn call(&self, input: &str) -> Result<String, ToolError> {
        self.engine
            .query(input)
            .await
            .map_err(|e| ToolError::Execution(e.user_message()))
    }
}
