// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Node configuration loaded from environment variables

use std::env;
use std::path::PathBuf;

/// Which embedding backend the node uses for indexing and retrieval.
///
/// The backend is pinned into every collection it builds; a collection can
/// only be queried with the backend that built it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// Deterministic local embedder, no API key required
    Local,
    /// OpenAI-compatible `/v1/embeddings` endpoint
    Remote,
}

/// Configuration for the document assistant node
#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// API listen address, e.g. `0.0.0.0:8080`
    pub listen_addr: String,
    /// Base directory for persisted vector collections
    pub vector_store_dir: PathBuf,
    /// Path of the append-only note log
    pub notes_path: PathBuf,
    /// API key for the reasoning/embedding service
    pub openai_api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API
    pub openai_api_base: String,
    /// Chat model used by the planner
    pub chat_model: String,
    /// Embedding backend selection
    pub embedding_backend: EmbeddingBackend,
    /// Remote embedding model name
    pub embedding_model: String,
    /// Embedding vector dimension
    pub embedding_dimension: usize,
    /// Target chunk size in characters
    pub chunk_target_chars: usize,
    /// Overlap between adjacent chunks in characters
    pub chunk_overlap_chars: usize,
    /// Number of passages returned per retrieval
    pub retrieval_top_k: usize,
    /// Minimum cosine similarity for a passage to count as a match
    pub retrieval_min_score: f32,
    /// Maximum planner steps per query turn
    pub max_router_steps: usize,
    /// Retry attempts for transient reasoning-service failures
    pub planner_max_retries: usize,
}

impl NodeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            listen_addr: env::var("API_LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            vector_store_dir: env::var("VECTOR_STORE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("vector_store")),
            notes_path: env::var("NOTES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data").join("notes.txt")),
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            openai_api_base: env::var("OPENAI_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            chat_model: env::var("CHAT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            embedding_backend: match env::var("EMBEDDING_BACKEND").as_deref() {
                Ok("remote") => EmbeddingBackend::Remote,
                _ => EmbeddingBackend::Local,
            },
            embedding_model: env::var("EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            embedding_dimension: env::var("EMBEDDING_DIMENSION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(384),
            chunk_target_chars: env::var("CHUNK_TARGET_CHARS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1024),
            chunk_overlap_chars: env::var("CHUNK_OVERLAP_CHARS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(128),
            retrieval_top_k: env::var("RETRIEVAL_TOP_K")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(4),
            retrieval_min_score: env::var("RETRIEVAL_MIN_SCORE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(0.25),
            max_router_steps: env::var("MAX_ROUTER_STEPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8),
            planner_max_retries: env::var("PLANNER_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.embedding_dimension == 0 {
            return Err("Embedding dimension must be greater than 0".to_string());
        }
        if self.chunk_target_chars == 0 {
            return Err("Chunk size must be greater than 0".to_string());
        }
        if self.chunk_overlap_chars >= self.chunk_target_chars {
            return Err("Chunk overlap must be smaller than chunk size".to_string());
        }
        if self.max_router_steps == 0 {
            return Err("Router step ceiling must be greater than 0".to_string());
        }
        if self.embedding_backend == EmbeddingBackend::Remote && self.openai_api_key.is_none() {
            return Err("Remote embedding backend requires OPENAI_API_KEY".to_string());
        }
        Ok(())
    }

    /// Check whether query operations can reach the reasoning service
    pub fn has_api_key(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            vector_store_dir: PathBuf::from("vector_store"),
            notes_path: PathBuf::from("data").join("notes.txt"),
            openai_api_key: None,
            openai_api_base: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            embedding_backend: EmbeddingBackend::Local,
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimension: 384,
            chunk_target_chars: 1024,
            chunk_overlap_chars: 128,
            retrieval_top_k: 4,
            retrieval_min_score: 0.25,
            max_router_steps: 8,
            planner_max_retries: 3,
        }
    }
}
