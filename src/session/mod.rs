// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Session controller: upload -> build -> query lifecycle
//!
//! Holds the ordered history of collections built this session and an
//! explicit active-collection selection. A fresh build becomes active
//! automatically (latest-wins, matching the upload flow), but any earlier
//! collection can be re-activated by id.

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::agent::{
    AgentError, AgentOutcome, AgentRouter, Planner, RouterConfig, ToolRegistry, ASSISTANT_CONTEXT,
};
use crate::documents::ChunkerConfig;
use crate::embeddings::EmbeddingProvider;
use crate::index::{new_collection_id, CollectionStore, DocumentIndexer, IndexError};
use crate::notes::{NoteSaverTool, NoteStore};
use crate::retrieval::{DocumentSearchTool, RetrievalConfig, RetrievalEngine};

#[derive(Error, Debug)]
pub enum SessionError {
    /// Query issued before any collection was built or selected
    #[error("No collection has been built yet - upload documents first")]
    NoActiveCollection,

    /// Requested collection id is not part of this session
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error("Note store error: {0}")]
    Note(#[from] crate::notes::NoteError),
}

/// Per-session orchestration of index builds and queries
pub struct SessionController {
    store: CollectionStore,
    embedder: Arc<dyn EmbeddingProvider>,
    planner: Arc<dyn Planner>,
    notes: Arc<NoteStore>,
    chunker: ChunkerConfig,
    retrieval: RetrievalConfig,
    router: RouterConfig,
    /// Collection ids in build order
    collections: Vec<String>,
    /// Index into `collections`; `None` until the first build
    active: Option<usize>,
}

impl SessionController {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: CollectionStore,
        embedder: Arc<dyn EmbeddingProvider>,
        planner: Arc<dyn Planner>,
        notes: Arc<NoteStore>,
        chunker: ChunkerConfig,
        retrieval: RetrievalConfig,
        router: RouterConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            planner,
            notes,
            chunker,
            retrieval,
            router,
            collections: Vec::new(),
            active: None,
        }
    }

    /// Ids of all collections built this session, in build order
    pub fn collections(&self) -> &[String] {
        &self.collections
    }

    /// Id of the collection queries currently resolve against
    pub fn active_collection(&self) -> Option<&str> {
        self.active.map(|i| self.collections[i].as_str())
    }

    /// Select a previously built collection for subsequent queries
    pub fn set_active(&mut self, id: &str) -> Result<(), SessionError> {
        match self.collections.iter().position(|c| c == id) {
            Some(index) => {
                self.active = Some(index);
                info!("Active collection set to {}", id);
                Ok(())
            }
            None => Err(SessionError::UnknownCollection(id.to_string())),
        }
    }

    /// Build a new collection from a directory of uploaded files.
    ///
    /// The collection is registered (and made active) only after the build
    /// fully commits; a failed build leaves the session unchanged.
    pub async fn build_collection(&mut self, uploads: &Path) -> Result<String, SessionError> {
        let id = new_collection_id();
        let indexer = DocumentIndexer::new(
            self.store.clone(),
            self.embedder.clone(),
            self.chunker.clone(),
        );

        let manifest = indexer.build(uploads, &id).await?;
        info!(
            "Built collection {} ({} chunks from {} file(s))",
            id,
            manifest.chunk_count,
            manifest.sources.len()
        );

        self.collections.push(id.clone());
        self.active = Some(self.collections.len() - 1);
        Ok(id)
    }

    /// Answer a free-text prompt with the tool router over the active
    /// collection.
    pub async fn query(&self, prompt: &str) -> Result<AgentOutcome, SessionError> {
        let collection_id = self
            .active_collection()
            .ok_or(SessionError::NoActiveCollection)?;

        let engine = RetrievalEngine::open(
            &self.store,
            collection_id,
            self.embedder.clone(),
            self.retrieval.clone(),
        )?;

        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(NoteSaverTool::new(self.notes.clone())));
        registry.register(Arc::new(DocumentSearchTool::new(engine)));

        let agent = AgentRouter::new(
            self.planner.clone(),
            registry,
            ASSISTANT_CONTEXT,
            self.router.clone(),
        );
        Ok(agent.run(prompt).await?)
    }

    /// Save a note directly, bypassing the router
    pub async fn save_note(&self, note: &str) -> Result<&'static str, SessionError> {
        Ok(self.notes.save(note).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{PlannerDecision, ScriptedPlanner};
    use crate::embeddings::HashEmbedder;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;

    fn controller(store_dir: &Path, notes_dir: &Path, planner: ScriptedPlanner) -> SessionController {
        SessionController::new(
            CollectionStore::new(store_dir),
            Arc::new(HashEmbedder::new(64)),
            Arc::new(planner),
            Arc::new(NoteStore::new(notes_dir.join("notes.txt"))),
            ChunkerConfig::default(),
            RetrievalConfig::default(),
            RouterConfig::default(),
        )
    }

    fn write_upload(dir: &Path, name: &str, text: &str) {
        let mut f = File::create(dir.join(name)).unwrap();
        writeln!(f, "{}", text).unwrap();
    }

    #[tokio::test]
    async fn test_query_before_build_is_rejected() {
        let store_dir = TempDir::new().unwrap();
        let notes_dir = TempDir::new().unwrap();
        let controller = controller(
            store_dir.path(),
            notes_dir.path(),
            ScriptedPlanner::new(vec![]),
        );

        let err = controller.query("anything").await;
        assert!(matches!(err, Err(SessionError::NoActiveCollection)));
    }

    #[tokio::test]
    async fn test_build_registers_and_activates() {
        let store_dir = TempDir::new().unwrap();
        let notes_dir = TempDir::new().unwrap();
        let uploads = TempDir::new().unwrap();
        write_upload(uploads.path(), "a.txt", "Some transport rules text");

        let mut controller = controller(
            store_dir.path(),
            notes_dir.path(),
            ScriptedPlanner::new(vec![]),
        );

        let id = controller.build_collection(uploads.path()).await.unwrap();
        assert_eq!(controller.collections(), &[id.clone()]);
        assert_eq!(controller.active_collection(), Some(id.as_str()));
    }

    #[tokio::test]
    async fn test_latest_build_becomes_active() {
        let store_dir = TempDir::new().unwrap();
        let notes_dir = TempDir::new().unwrap();
        let uploads = TempDir::new().unwrap();
        write_upload(uploads.path(), "a.txt", "Some transport rules text");

        let mut controller = controller(
            store_dir.path(),
            notes_dir.path(),
            ScriptedPlanner::new(vec![]),
        );

        let first = controller.build_collection(uploads.path()).await.unwrap();
        let second = controller.build_collection(uploads.path()).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(controller.active_collection(), Some(second.as_str()));

        // Earlier collections stay selectable
        controller.set_active(&first).unwrap();
        assert_eq!(controller.active_collection(), Some(first.as_str()));
    }

    #[tokio::test]
    async fn test_set_active_rejects_unknown_id() {
        let store_dir = TempDir::new().unwrap();
        let notes_dir = TempDir::new().unwrap();
        let mut controller = controller(
            store_dir.path(),
            notes_dir.path(),
            ScriptedPlanner::new(vec![]),
        );

        let err = controller.set_active("documents_unknown");
        assert!(matches!(err, Err(SessionError::UnknownCollection(_))));
    }

    #[tokio::test]
    async fn test_failed_build_leaves_session_unchanged() {
        let store_dir = TempDir::new().unwrap();
        let notes_dir = TempDir::new().unwrap();
        let empty_uploads = TempDir::new().unwrap();

        let mut controller = controller(
            store_dir.path(),
            notes_dir.path(),
            ScriptedPlanner::new(vec![]),
        );

        let err = controller.build_collection(empty_uploads.path()).await;
        assert!(matches!(err, Err(SessionError::Index(IndexError::EmptyCorpus))));
        assert!(controller.collections().is_empty());
        assert_eq!(controller.active_collection(), None);
    }

    #[tokio::test]
    async fn test_query_runs_router_over_active_collection() {
        let store_dir = TempDir::new().unwrap();
        let notes_dir = TempDir::new().unwrap();
        let uploads = TempDir::new().unwrap();
        write_upload(
            uploads.path(),
            "rules.txt",
            "Maximum axle load is 11,500 kg for a standard truck",
        );

        let planner = ScriptedPlanner::new(vec![
            PlannerDecision::CallTool {
                tool: "document_search".to_string(),
                input: "maximum axle load".to_string(),
            },
            PlannerDecision::Finish {
                answer: "The maximum axle load is 11,500 kg.".to_string(),
            },
        ]);

        let mut controller = controller(store_dir.path(), notes_dir.path(), planner);
        controller.build_collection(uploads.path()).await.unwrap();

        let outcome = controller.query("What is the maximum axle load?").await.unwrap();
        assert!(outcome.answer.contains("11,500 kg"));
        assert_eq!(outcome.invocations.len(), 1);
        assert!(outcome.invocations[0].output.contains("11,500 kg"));
    }
}
