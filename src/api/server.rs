// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP surface of the node
//!
//! Upload/build, query, and note endpoints over one shared session. The
//! session is behind an `RwLock`: builds take the write half, queries only
//! read, so queries against the current collection keep flowing while no
//! build is in progress.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::Multipart;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use super::errors::ApiError;
use crate::session::SessionController;
use crate::version;

/// Configuration for the API server
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub listen_addr: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Clone)]
struct AppState {
    session: Arc<RwLock<SessionController>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BuildResponse {
    pub collection: String,
    pub files: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CollectionsResponse {
    pub collections: Vec<String>,
    pub active: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SetActiveRequest {
    pub collection: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolCallSummary {
    pub tool: String,
    pub input: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
    pub tool_calls: Vec<ToolCallSummary>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NoteRequest {
    pub note: String,
}

pub fn build_router(session: Arc<RwLock<SessionController>>) -> Router {
    let state = AppState { session };

    Router::new()
        .route("/health", get(health_handler))
        .route("/v1/collections", post(build_handler).get(collections_handler))
        .route("/v1/collections/active", post(set_active_handler))
        .route("/v1/query", post(query_handler))
        .route("/v1/notes", post(note_handler))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

pub async fn start_server(
    config: ApiConfig,
    session: Arc<RwLock<SessionController>>,
) -> anyhow::Result<()> {
    let app = build_router(session);
    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("API server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let session = state.session.read().await;
    Json(json!({
        "status": "healthy",
        "version": version::get_version_info(),
        "active_collection": session.active_collection(),
        "collections_built": session.collections().len(),
    }))
}

/// Upload one or more documents and build a new collection from them.
///
/// Files are staged into a temporary directory that is dropped as soon as
/// the build finishes, successful or not; only the embedded vectors
/// persist.
async fn build_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BuildResponse>, ApiError> {
    let staging = tempfile::tempdir()
        .map_err(|e| ApiError::Internal(format!("Failed to create staging dir: {}", e)))?;

    let mut file_count = 0usize;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field
            .file_name()
            .map(sanitize_file_name)
            .unwrap_or_else(|| format!("upload_{}.pdf", file_count));

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to read upload: {}", e)))?;
        if bytes.is_empty() {
            continue;
        }

        tokio::fs::write(staging.path().join(&name), &bytes)
            .await
            .map_err(|e| ApiError::Internal(format!("Failed to stage upload: {}", e)))?;
        file_count += 1;
    }

    if file_count == 0 {
        return Err(ApiError::InvalidRequest(
            "No files uploaded - attach at least one PDF or text file".to_string(),
        ));
    }

    let mut session = state.session.write().await;
    let collection = session.build_collection(staging.path()).await?;

    Ok(Json(BuildResponse {
        collection,
        files: file_count,
    }))
}

/// Strip any path components a client smuggles into the file name
fn sanitize_file_name(name: &str) -> String {
    Path::new(name)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty() && n != "." && n != "..")
        .unwrap_or_else(|| "upload.pdf".to_string())
}

async fn collections_handler(
    State(state): State<AppState>,
) -> Result<Json<CollectionsResponse>, ApiError> {
    let session = state.session.read().await;
    Ok(Json(CollectionsResponse {
        collections: session.collections().to_vec(),
        active: session.active_collection().map(|s| s.to_string()),
    }))
}

async fn set_active_handler(
    State(state): State<AppState>,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<CollectionsResponse>, ApiError> {
    let mut session = state.session.write().await;
    session.set_active(&request.collection)?;
    Ok(Json(CollectionsResponse {
        collections: session.collections().to_vec(),
        active: session.active_collection().map(|s| s.to_string()),
    }))
}

async fn query_handler(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>, ApiError> {
    if request.prompt.trim().is_empty() {
        return Err(ApiError::InvalidRequest("Prompt must not be empty".to_string()));
    }

    let session = state.session.read().await;
    let outcome = session.query(&request.prompt).await?;

    Ok(Json(QueryResponse {
        response: outcome.answer,
        tool_calls: outcome
            .invocations
            .into_iter()
            .map(|i| ToolCallSummary {
                tool: i.tool,
                input: i.input,
            })
            .collect(),
    }))
}

async fn note_handler(
    State(state): State<AppState>,
    Json(request): Json<NoteRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if request.note.trim().is_empty() {
        return Err(ApiError::InvalidRequest("Note must not be empty".to_string()));
    }

    let session = state.session.read().await;
    let result = session.save_note(&request.note).await?;
    Ok(Json(json!({ "result": result })))
}
