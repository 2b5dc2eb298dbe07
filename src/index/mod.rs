// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Document indexing and persistent collection storage

pub mod collection;
pub mod errors;
pub mod indexer;
pub mod store;

pub use collection::{new_collection_id, CollectionManifest, StoredChunk};
pub use errors::IndexError;
pub use indexer::DocumentIndexer;
pub use store::{CollectionStore, OpenCollection, ScoredChunk};
