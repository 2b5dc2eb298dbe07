// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Collection identity and on-disk record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generate a unique collection identifier.
///
/// Keeps the human-readable `documents_<timestamp>` prefix but uses a full
/// UUID as the random suffix; a short hex suffix leaves collision handling
/// to luck, and a collision here would silently overwrite another build.
pub fn new_collection_id() -> String {
    format!(
        "documents_{}_{}",
        Utc::now().format("%Y%m%d_%H%M%S"),
        Uuid::new_v4().simple()
    )
}

/// Manifest persisted alongside a collection's vectors.
///
/// `embedding_model` and `dimension` pin the embedding space the collection
/// was built in; retrieval checks both before any similarity comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionManifest {
    pub name: String,
    pub embedding_model: String,
    pub dimension: usize,
    pub chunk_count: usize,
    pub sources: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// One embedded chunk as persisted in a collection
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub id: String,
    pub text: String,
    pub source: String,
    pub vector: Vec<f32>,
}
