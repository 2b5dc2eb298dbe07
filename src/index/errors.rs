// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Error types for collection building and loading

use thiserror::Error;

use crate::documents::DocumentError;
use crate::embeddings::EmbeddingError;

/// Errors that can occur while building or opening a collection
#[derive(Error, Debug)]
pub enum IndexError {
    /// No files uploaded, or none of them contained extractable text
    #[error("No extractable text in uploaded documents")]
    EmptyCorpus,

    /// Collection directory or manifest missing
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),

    /// A collection with this identifier already exists on disk
    #[error("Collection already exists: {0}")]
    CollectionExists(String),

    /// Collection was built with a different embedding model
    #[error("Embedding model mismatch: collection was built with '{collection_model}', query uses '{query_model}'")]
    ModelMismatch {
        collection_model: String,
        query_model: String,
    },

    /// Embedder returned a vector of the wrong dimension
    #[error("Dimension mismatch: manifest records {expected}D, got {actual}D vectors")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Document loading failed: {0}")]
    Document(#[from] DocumentError),

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IndexError {
    /// Get user-friendly error message for API responses
    pub fn user_message(&self) -> String {
        match self {
            IndexError::EmptyCorpus => {
                "No text could be extracted from the uploaded files. Upload at least one PDF or text file with content.".to_string()
            }
            IndexError::CollectionNotFound(id) => {
                format!("Collection not found: {}", id)
            }
            IndexError::ModelMismatch {
                collection_model,
                query_model,
            } => {
                format!(
                    "This collection was indexed with '{}' and cannot be queried with '{}'",
                    collection_model, query_model
                )
            }
            _ => self.to_string(),
        }
    }

    /// Get error code for logging and metrics
    pub fn error_code(&self) -> &'static str {
        match self {
            IndexError::EmptyCorpus => "EMPTY_CORPUS",
            IndexError::CollectionNotFound(_) => "COLLECTION_NOT_FOUND",
            IndexError::CollectionExists(_) => "COLLECTION_EXISTS",
            IndexError::ModelMismatch { .. } => "MODEL_MISMATCH",
            IndexError::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
            IndexError::Document(_) => "DOCUMENT_ERROR",
            IndexError::Embedding(_) => "EMBEDDING_ERROR",
            IndexError::Serialization(_) => "SERIALIZATION_ERROR",
            IndexError::Io(_) => "IO_ERROR",
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IndexError::Embedding(EmbeddingError::Http(_))
                | IndexError::Embedding(EmbeddingError::Api { status: 429, .. })
                | IndexError::Embedding(EmbeddingError::Api { status: 500..=599, .. })
        )
    }
}
