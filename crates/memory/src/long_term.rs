//! In-memory long-term store: global, unbounded, substring-searchable.
//!
//! Holds high-confidence query→agent associations for reuse across sessions.
//! `search` matches case-insensitively over both key and serialized value;
//! results come back in insertion order among matches.

use async_trait::async_trait;
use std::sync::Arc;
use switchboard_core::error::MemoryError;
use switchboard_core::memory::{LongTermMemory, MemoryEntry};
use tokio::sync::RwLock;

/// Global key/value store backed by an insertion-ordered Vec.
pub struct InMemoryLongTerm {
    entries: Arc<RwLock<Vec<MemoryEntry>>>,
}

impl InMemoryLongTerm {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Number of stored entries.
    pub async fn count(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for InMemoryLongTerm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LongTermMemory for InMemoryLongTerm {
    async fn store(
        &self,
        key: &str,
        value: serde_json::Value,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), MemoryError> {
        let entry = MemoryEntry::new(key, value).with_metadata(metadata);
        let mut entries = self.entries.write().await;
        // Overwrite keeps the original insertion position
        if let Some(existing) = entries.iter_mut().find(|e| e.key == key) {
            *existing = entry;
        } else {
            entries.push(entry);
        }
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Option<serde_json::Value>, MemoryError> {
        let entries = self.entries.read().await;
        Ok(entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.clone()))
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<MemoryEntry>, MemoryError> {
        let query_lower = query.to_lowercase();
        let entries = self.entries.read().await;

        let mut results: Vec<MemoryEntry> = entries
            .iter()
            .filter(|e| {
                let key_match = e.key.to_lowercase().contains(&query_lower);
                let value_match = serde_json::to_string(&e.value)
                    .map(|s| s.to_lowercase().contains(&query_lower))
                    .unwrap_or(false);
                key_match || value_match
            })
            .cloned()
            .collect();

        results.truncate(limit);
        Ok(results)
    }

    async fn delete(&self, key: &str) -> Result<bool, MemoryError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| e.key != key);
        Ok(entries.len() < before)
    }
}
