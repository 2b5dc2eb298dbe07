// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use clap::Parser;
use doc_assistant_node::{
    api::{start_server, ApiConfig},
    agent::OpenAiPlanner,
    config::{EmbeddingBackend, NodeConfig},
    documents::ChunkerConfig,
    embeddings::{EmbeddingProvider, HashEmbedder, RemoteEmbedder},
    index::CollectionStore,
    notes::NoteStore,
    retrieval::RetrievalConfig,
    session::SessionController,
    RouterConfig,
};
use std::{env, sync::Arc};
use tokio::sync::RwLock;

/// Document question-answering assistant node
#[derive(Parser, Debug)]
#[command(version = doc_assistant_node::version::VERSION_NUMBER)]
struct Args {
    /// API listen address (overrides API_LISTEN_ADDR)
    #[arg(long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    println!("🚀 Starting Document Assistant Node...\n");
    println!("📦 {}", doc_assistant_node::version::get_version_string());
    println!();

    let mut config = NodeConfig::from_env();
    if let Some(listen) = args.listen {
        config.listen_addr = listen;
    }
    if let Err(e) = config.validate() {
        eprintln!("❌ Invalid configuration: {}", e);
        std::process::exit(1);
    }

    if !config.has_api_key() {
        eprintln!("⚠️  API key is missing (OPENAI_API_KEY not set)");
        eprintln!("   Uploading and indexing documents will still work with the local embedder,");
        eprintln!("   but /v1/query will fail until a key is provided.");
    }

    // Embedding backend
    let embedder: Arc<dyn EmbeddingProvider> = match config.embedding_backend {
        EmbeddingBackend::Local => {
            println!("🧠 Embeddings: local deterministic embedder ({}D)", config.embedding_dimension);
            Arc::new(HashEmbedder::new(config.embedding_dimension))
        }
        EmbeddingBackend::Remote => {
            println!(
                "🧠 Embeddings: remote model {} ({}D)",
                config.embedding_model, config.embedding_dimension
            );
            Arc::new(RemoteEmbedder::new(
                &config.openai_api_base,
                config.openai_api_key.as_deref().unwrap_or_default(),
                &config.embedding_model,
                config.embedding_dimension,
            )?)
        }
    };

    // Planner for the tool router
    let planner = Arc::new(OpenAiPlanner::new(
        &config.openai_api_base,
        config.openai_api_key.clone(),
        &config.chat_model,
        config.planner_max_retries,
    )?);
    println!("🤖 Planner model: {}", config.chat_model);

    let store = CollectionStore::new(config.vector_store_dir.clone());
    println!("💾 Vector store: {}", config.vector_store_dir.display());

    let existing = store.list()?;
    if !existing.is_empty() {
        println!("   Found {} existing collection(s) on disk", existing.len());
    }

    let notes = Arc::new(NoteStore::new(config.notes_path.clone()));
    println!("📝 Note log: {}", config.notes_path.display());

    let session = SessionController::new(
        store,
        embedder,
        planner,
        notes,
        ChunkerConfig {
            target_chars: config.chunk_target_chars,
            overlap_chars: config.chunk_overlap_chars,
        },
        RetrievalConfig {
            top_k: config.retrieval_top_k,
            min_score: config.retrieval_min_score,
        },
        RouterConfig {
            max_steps: config.max_router_steps,
        },
    );

    let separator = "=".repeat(60);
    println!("\n{}", separator);
    println!("🎉 Document Assistant Node is running!");
    println!("{}", separator);
    println!("API Address:    http://{}", config.listen_addr);
    println!("\nAPI Endpoints:");
    println!("  Health:       GET  /health");
    println!("  Build:        POST /v1/collections (multipart file upload)");
    println!("  Collections:  GET  /v1/collections");
    println!("  Select:       POST /v1/collections/active");
    println!("  Query:        POST /v1/query");
    println!("  Notes:        POST /v1/notes");
    println!("\nPress Ctrl+C to shutdown...");
    println!("{}\n", separator);

    start_server(
        ApiConfig {
            listen_addr: config.listen_addr.clone(),
        },
        Arc::new(RwLock::new(session)),
    )
    .await?;

    println!("👋 Goodbye!");
    Ok(())
}
