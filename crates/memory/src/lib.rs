//! Persistent note storage — a flat topic → content mapping in one JSON
//! file.
//!
//! Topics are lowercased and trimmed on every access so "Aniversário" and
//! "aniversário " land on the same key. Collisions are last-write-wins; no
//! versioning, no concurrent-writer protection beyond the in-process lock.
//!
//! Storage location: `~/.mordomo/notas.json`
//!
//! Notes are loaded into memory on creation and flushed to disk on every
//! write. This gives fast reads with durable writes.

use mordomo_core::error::NoteError;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// A file-backed note store.
pub struct NoteStore {
    path: PathBuf,
    notes: RwLock<BTreeMap<String, String>>,
}

impl NoteStore {
    /// Create a store at the given path.
    ///
    /// If the file exists, notes are loaded from it. If it does not exist
    /// (or is unreadable), the store starts empty and the file is created
    /// on first write.
    pub fn new(path: PathBuf) -> Self {
        let notes = Self::load_from_disk(&path);
        debug!(path = %path.display(), count = notes.len(), "Note store loaded");
        Self {
            path,
            notes: RwLock::new(notes),
        }
    }

    fn load_from_disk(path: &PathBuf) -> BTreeMap<String, String> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(_) => return BTreeMap::new(), // File doesn't exist yet — start empty
        };

        match serde_json::from_str(&content) {
            Ok(notes) => notes,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Corrupted note file, starting empty");
                BTreeMap::new()
            }
        }
    }

    fn normalize(topic: &str) -> String {
        topic.trim().to_lowercase()
    }

    /// Save a note under a topic. Last write wins on collision.
    pub async fn save(&self, topic: &str, content: &str) -> Result<(), NoteError> {
        let key = Self::normalize(topic);
        self.notes.write().await.insert(key, content.to_string());
        self.flush().await
    }

    /// Read a note by topic. `None` means no note — callers surface that as
    /// a not-found result, never an error.
    pub async fn read(&self, topic: &str) -> Option<String> {
        self.notes.read().await.get(&Self::normalize(topic)).cloned()
    }

    /// All known topics, sorted.
    pub async fn topics(&self) -> Vec<String> {
        self.notes.read().await.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.notes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.notes.read().await.is_empty()
    }

    /// Write the whole mapping to disk.
    async fn flush(&self) -> Result<(), NoteError> {
        let notes = self.notes.read().await;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                NoteError::Storage(format!("Failed to create note directory: {e}"))
            })?;
        }

        let content = serde_json::to_string_pretty(&*notes)
            .map_err(|e| NoteError::Storage(format!("Failed to serialize notes: {e}")))?;

        std::fs::write(&self.path, content)
            .map_err(|e| NoteError::Storage(format!("Failed to write note file: {e}")))?;

        Ok(())
    }
}
