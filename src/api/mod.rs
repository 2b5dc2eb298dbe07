// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// HTTP API for the document assistant node

pub mod errors;
pub mod server;

pub use errors::{ApiError, ErrorResponse};
pub use server::{
    build_router, start_server, ApiConfig, BuildResponse, CollectionsResponse, NoteRequest,
    QueryRequest, QueryResponse, SetActiveRequest, ToolCallSummary,
};
