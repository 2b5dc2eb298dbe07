// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod agent;
pub mod api;
pub mod config;
pub mod documents;
pub mod embeddings;
pub mod index;
pub mod notes;
pub mod retrieval;
pub mod session;
pub mod version;

// Re-export main types from core modules
pub use agent::{
    AgentError, AgentOutcome, AgentRouter, OpenAiPlanner, Planner, PlannerDecision, PlannerError,
    RouterConfig, ScriptedPlanner, Tool, ToolError, ToolInvocation, ToolRegistry, ToolSpec,
    ASSISTANT_CONTEXT,
};
pub use documents::{ChunkerConfig, DocumentChunk, DocumentError, RawDocument};
pub use embeddings::{Embedding, EmbeddingError, EmbeddingProvider, HashEmbedder, RemoteEmbedder};
pub use index::{
    new_collection_id, CollectionManifest, CollectionStore, DocumentIndexer, IndexError,
    OpenCollection, ScoredChunk, StoredChunk,
};
pub use notes::{NoteError, NoteSaverTool, NoteStore};
pub use retrieval::{DocumentSearchTool, RetrievalConfig, RetrievalEngine};
pub use session::{SessionController, SessionError};

// Re-export configuration
pub use config::{EmbeddingBackend, NodeConfig};
