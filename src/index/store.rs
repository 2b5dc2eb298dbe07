// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Persistent collection store
//!
//! Layout: `<base>/<collection_id>/manifest.json` + `chunks.json`. A build
//! is staged into a `.tmp` sibling directory and renamed into place once
//! complete, so readers never observe a partially written collection and an
//! abandoned build never becomes queryable.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::collection::{CollectionManifest, StoredChunk};
use super::errors::IndexError;
use crate::embeddings::Embedding;

const MANIFEST_FILE: &str = "manifest.json";
const CHUNKS_FILE: &str = "chunks.json";
const STAGING_SUFFIX: &str = ".tmp";

/// Result from a similarity search over a collection
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub id: String,
    pub text: String,
    pub source: String,
    pub score: f32,
}

/// Store of persisted collections under a base directory.
/// Collections are immutable once created; ids never share directories.
#[derive(Debug, Clone)]
pub struct CollectionStore {
    base: PathBuf,
}

impl CollectionStore {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base
    }

    fn collection_dir(&self, id: &str) -> PathBuf {
        self.base.join(id)
    }

    pub fn exists(&self, id: &str) -> bool {
        !id.ends_with(STAGING_SUFFIX) && self.collection_dir(id).join(MANIFEST_FILE).is_file()
    }

    /// List ids of all fully committed collections, sorted by name
    /// (timestamp prefix makes this creation order).
    ///
    /// A staging directory left by a crashed build may already hold a
    /// manifest; only the rename commits it, so staging names are never
    /// reported.
    pub fn list(&self) -> Result<Vec<String>, IndexError> {
        if !self.base.is_dir() {
            return Ok(Vec::new());
        }
        let mut ids: Vec<String> = fs::read_dir(&self.base)?
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| !name.ends_with(STAGING_SUFFIX))
            .filter(|name| self.collection_dir(name).join(MANIFEST_FILE).is_file())
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Persist a new collection atomically.
    ///
    /// Writes manifest and chunks into a staging directory, then renames it
    /// to the final id. Fails without side effects on the final path if the
    /// id already exists.
    pub fn create(
        &self,
        id: &str,
        manifest: &CollectionManifest,
        chunks: &[StoredChunk],
    ) -> Result<(), IndexError> {
        let final_dir = self.collection_dir(id);
        if final_dir.exists() {
            return Err(IndexError::CollectionExists(id.to_string()));
        }

        fs::create_dir_all(&self.base)?;
        let staging = self.base.join(format!("{}{}", id, STAGING_SUFFIX));
        if staging.exists() {
            // Leftover from an abandoned build
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        let result = (|| -> Result<(), IndexError> {
            fs::write(
                staging.join(MANIFEST_FILE),
                serde_json::to_vec_pretty(manifest)?,
            )?;
            fs::write(staging.join(CHUNKS_FILE), serde_json::to_vec(chunks)?)?;
            fs::rename(&staging, &final_dir)?;
            Ok(())
        })();

        if result.is_err() {
            let _ = fs::remove_dir_all(&staging);
        } else {
            info!(
                "Persisted collection {} ({} chunks, model {})",
                id, manifest.chunk_count, manifest.embedding_model
            );
        }
        result
    }

    /// Load a collection's manifest without its vectors
    pub fn load_manifest(&self, id: &str) -> Result<CollectionManifest, IndexError> {
        // Uncommitted staging content is not a collection
        if id.ends_with(STAGING_SUFFIX) {
            return Err(IndexError::CollectionNotFound(id.to_string()));
        }
        let path = self.collection_dir(id).join(MANIFEST_FILE);
        if !path.is_file() {
            return Err(IndexError::CollectionNotFound(id.to_string()));
        }
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Load a full collection into memory for querying
    pub fn open(&self, id: &str) -> Result<OpenCollection, IndexError> {
        let manifest = self.load_manifest(id)?;
        let bytes = fs::read(self.collection_dir(id).join(CHUNKS_FILE))?;
        let chunks: Vec<StoredChunk> = serde_json::from_slice(&bytes)?;
        debug!("Opened collection {} with {} chunks", id, chunks.len());
        Ok(OpenCollection { manifest, chunks })
    }
}

/// A collection loaded into memory, supporting cosine-similarity search
#[derive(Debug)]
pub struct OpenCollection {
    manifest: CollectionManifest,
    chunks: Vec<StoredChunk>,
}

impl OpenCollection {
    pub fn manifest(&self) -> &CollectionManifest {
        &self.manifest
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Top-k chunks by cosine similarity, sorted descending, filtered by an
    /// optional minimum score. An empty collection or no matches above the
    /// threshold returns an empty vec, never an error.
    pub fn search(
        &self,
        query: &Embedding,
        k: usize,
        min_score: Option<f32>,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        if query.dimension() != self.manifest.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.manifest.dimension,
                actual: query.dimension(),
            });
        }

        if self.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let mut results: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .map(|chunk| {
                let score = query.cosine_similarity(&Embedding::new(chunk.vector.clone()));
                ScoredChunk {
                    id: chunk.id.clone(),
                    text: chunk.text.clone(),
                    source: chunk.source.clone(),
                    score,
                }
            })
            .collect();

        if let Some(min) = min_score {
            results.retain(|r| r.score >= min);
        }

        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        results.truncate(k);

        Ok(results)
    }
}
