// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Document indexer: uploads directory -> persisted collection

use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use super::collection::{CollectionManifest, StoredChunk};
use super::errors::IndexError;
use super::store::CollectionStore;
use crate::documents::{chunk_document, load_directory, ChunkerConfig};
use crate::embeddings::EmbeddingProvider;

/// Builds collections from directories of uploaded documents.
///
/// Re-running the same files under a new identifier produces an independent
/// collection; there is no deduplication across collections.
pub struct DocumentIndexer {
    store: CollectionStore,
    embedder: Arc<dyn EmbeddingProvider>,
    chunker: ChunkerConfig,
}

impl DocumentIndexer {
    pub fn new(
        store: CollectionStore,
        embedder: Arc<dyn EmbeddingProvider>,
        chunker: ChunkerConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            chunker,
        }
    }

    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    /// Build and persist a collection from all supported files in `dir`.
    ///
    /// Nothing is written until every chunk has been embedded; a failure at
    /// any point leaves no queryable collection behind.
    pub async fn build(
        &self,
        dir: &Path,
        collection_id: &str,
    ) -> Result<CollectionManifest, IndexError> {
        let dir = dir.to_path_buf();
        let documents =
            tokio::task::spawn_blocking(move || load_directory(&dir))
                .await
                .map_err(|e| IndexError::Io(std::io::Error::other(e)))??;

        if documents.is_empty() {
            return Err(IndexError::EmptyCorpus);
        }

        let mut chunks = Vec::new();
        let mut sources = Vec::new();
        for document in &documents {
            sources.push(document.name.clone());
            chunks.extend(chunk_document(document, &self.chunker));
        }
        if chunks.is_empty() {
            return Err(IndexError::EmptyCorpus);
        }

        info!(
            "Indexing {} chunks from {} documents into {}",
            chunks.len(),
            documents.len(),
            collection_id
        );

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let expected = self.embedder.dimension();
        let mut stored = Vec::with_capacity(chunks.len());
        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            if embedding.dimension() != expected {
                return Err(IndexError::DimensionMismatch {
                    expected,
                    actual: embedding.dimension(),
                });
            }
            stored.push(StoredChunk {
                id: Uuid::new_v4().to_string(),
                text: chunk.text,
                source: chunk.source,
                vector: embedding.into_data(),
            });
        }

        let manifest = CollectionManifest {
            name: collection_id.to_string(),
            embedding_model: self.embedder.model_id().to_string(),
            dimension: expected,
            chunk_count: stored.len(),
            sources,
            created_at: Utc::now(),
        };

        self.store.create(collection_id, &manifest, &stored)?;
        Ok(manifest)
    }
}
