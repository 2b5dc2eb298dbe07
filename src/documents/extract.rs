// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text extraction from uploaded documents
//!
//! PDF extraction is delegated to the `pdf-extract` crate; plain-text and
//! markdown files are read as UTF-8. Other extensions are skipped with a
//! warning so one stray file does not fail a whole upload batch.

use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while loading uploaded documents
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Upload directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Failed to extract text from PDF '{file}': {message}")]
    PdfExtraction { file: String, message: String },

    #[error("File '{file}' is not valid UTF-8")]
    InvalidEncoding { file: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw uploaded document: a file name plus its extracted text.
/// Ephemeral, exists only while a collection is being built.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub name: String,
    pub text: String,
}

/// Extract text from a single file, returning `None` for unsupported types.
pub fn extract_file(path: &Path) -> Result<Option<String>, DocumentError> {
    let file = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "pdf" => {
            let text = pdf_extract::extract_text(path).map_err(|e| {
                DocumentError::PdfExtraction {
                    file: file.clone(),
                    message: e.to_string(),
                }
            })?;
            Ok(Some(text))
        }
        "txt" | "md" => {
            let bytes = fs::read(path)?;
            let text = String::from_utf8(bytes)
                .map_err(|_| DocumentError::InvalidEncoding { file: file.clone() })?;
            Ok(Some(text))
        }
        _ => {
            warn!("Skipping unsupported file type: {}", file);
            Ok(None)
        }
    }
}

/// Load all supported files from a directory of uploads.
///
/// Files with no extractable text are dropped here; an entirely empty
/// result is the indexer's empty-corpus case, not an error at this level.
pub fn load_directory(dir: &Path) -> Result<Vec<RawDocument>, DocumentError> {
    if !dir.is_dir() {
        return Err(DocumentError::DirectoryNotFound(
            dir.to_string_lossy().into_owned(),
        ));
    }

    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    // Stable order so chunk indices are reproducible across rebuilds
    entries.sort();

    let mut documents = Vec::new();
    for path in entries {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match extract_file(&path)? {
            Some(text) if !text.trim().is_empty() => {
                debug!("Extracted {} chars from {}", text.len(), name);
                documents.push(RawDocument { name, text });
            }
            Some(_) => {
                warn!("No extractable text in {}", name);
            }
            None => {}
        }
    }

    Ok(documents)
}
