// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Append-only note log
//!
//! Each saved note becomes one timestamped, word-wrapped record in a shared
//! text file. Writers are serialized with a mutex so concurrent saves never
//! interleave partial lines.

use async_trait::async_trait;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::agent::{Tool, ToolError};

/// Fixed confirmation returned on every successful save
pub const NOTE_SAVED: &str = "note saved";

/// Wrap width in display columns
const WRAP_WIDTH: usize = 80;

#[derive(Error, Debug)]
pub enum NoteError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Append-only store of timestamped notes
pub struct NoteStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl NoteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one note record: `\n[YYYY-MM-DD HH:MM:SS] <wrapped note>\n`
    pub async fn save(&self, note: &str) -> Result<&'static str, NoteError> {
        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let wrapped = wrap(note, WRAP_WIDTH);
        let record = format!("\n[{}] {}\n", timestamp, wrapped);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(record.as_bytes()).await?;
        file.flush().await?;

        debug!("Saved note ({} chars)", note.len());
        Ok(NOTE_SAVED)
    }
}

/// Wrap text to `width` columns, breaking only at whitespace boundaries.
/// Collapses runs of whitespace; a single token longer than `width` is
/// placed on its own line unbroken.
fn wrap(text: &str, width: usize) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let current_len = current.chars().count();

        if current.is_empty() {
            current.push_str(word);
        } else if current_len + 1 + word_len <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }

    lines.join("\n")
}

/// `note_saver` tool exposed to the router
pub struct NoteSaverTool {
    store: Arc<NoteStore>,
}

impl NoteSaverTool {
    pub fn new(store: Arc<NoteStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for NoteSaverTool {
    fn name(&self) -> &str {
        "note_saver"
    }

    fn description(&self) -> &str {
        "Saves a text-based note to a file for the user. \
         Input: the note text to save. Only use when the user asks to save, \
         note down, or remember something."
    }

    async fn call(&self, input: &str) -> Result<String, ToolError> {
        let confirmation = self
            .store
            .save(input)
            .await
            .map_err(|e| match e {
                NoteError::Io(io) => ToolError::Storage(io),
            })?;
        Ok(confirmation.to_string())
    }
}
