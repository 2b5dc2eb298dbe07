// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Document loading and chunking for index builds

pub mod chunker;
pub mod extract;

pub use chunker::{chunk_document, ChunkerConfig, DocumentChunk};
pub use extract::{load_directory, DocumentError, RawDocument};
