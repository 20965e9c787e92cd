//! In-memory short-term store: session-scoped, TTL-bound.
//!
//! Entries expire strictly after their TTL; expiry is evaluated lazily on
//! read, and `sweep` may reclaim memory proactively but correctness never
//! depends on it running.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use switchboard_core::error::MemoryError;
use switchboard_core::memory::{MemoryEntry, ShortTermMemory};
use tokio::sync::RwLock;
use tracing::debug;

/// Session-scoped TTL store backed by a nested map.
pub struct InMemoryShortTerm {
    sessions: Arc<RwLock<HashMap<String, HashMap<String, MemoryEntry>>>>,
}

impl InMemoryShortTerm {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Drop every expired entry across all sessions. Optional: reads are
    /// already filtered lazily.
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Utc::now()).await
    }

    async fn sweep_at(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let mut removed = 0;
        for entries in sessions.values_mut() {
            let before = entries.len();
            entries.retain(|_, e| !e.is_expired_at(now));
            removed += before - entries.len();
        }
        sessions.retain(|_, entries| !entries.is_empty());
        if removed > 0 {
            debug!(removed, "Swept expired short-term entries");
        }
        removed
    }

    async fn retrieve_at(
        &self,
        session_id: &str,
        key: &str,
        now: DateTime<Utc>,
    ) -> Option<serde_json::Value> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .and_then(|entries| entries.get(key))
            .filter(|e| !e.is_expired_at(now))
            .map(|e| e.value.clone())
    }
}

impl Default for InMemoryShortTerm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ShortTermMemory for InMemoryShortTerm {
    async fn store(
        &self,
        session_id: &str,
        key: &str,
        value: serde_json::Value,
        ttl_seconds: u64,
    ) -> Result<(), MemoryError> {
        let entry = MemoryEntry::new(key, value).with_ttl(ttl_seconds);
        self.sessions
            .write()
            .await
            .entry(session_id.to_string())
            .or_default()
            .insert(key.to_string(), entry);
        Ok(())
    }

    async fn retrieve(
        &self,
        session_id: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, MemoryError> {
        Ok(self.retrieve_at(session_id, key, Utc::now()).await)
    }

    async fn get_all(
        &self,
        session_id: &str,
    ) -> Result<serde_json::Map<String, serde_json::Value>, MemoryError> {
        let now = Utc::now();
        let sessions = self.sessions.read().await;
        let mut map = serde_json::Map::new();
        if let Some(entries) = sessions.get(session_id) {
            for (key, entry) in entries {
                if !entry.is_expired_at(now) {
                    map.insert(key.clone(), entry.value.clone());
                }
            }
        }
        Ok(map)
    }

    async fn clear(&self, session_id: &str) -> Result<(), MemoryError> {
        self.sessions.write().await.remove(session_id);
        Ok(())
    }
}
