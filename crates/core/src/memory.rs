//! Memory traits: the two persistent stores behind the engine.
//!
//! Short-term memory is TTL-bound and scoped by session; long-term memory is
//! global, never expires, and supports substring search. The engine depends
//! only on these traits; backing them with a concurrent map, an embedded
//! key/value database, or a managed service are all conforming choices.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;

/// Default short-term TTL: one hour.
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// A single stored entry, shared by both stores.
///
/// `ttl_seconds` is `None` for long-term entries, which never expire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Lookup key
    pub key: String,

    /// Stored value
    pub value: serde_json::Value,

    /// Free-form metadata
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,

    /// When the entry was written
    pub created_at: DateTime<Utc>,

    /// Time-to-live; absent means no expiry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_seconds: Option<u64>,
}

impl MemoryEntry {
    /// Create an entry stamped now.
    pub fn new(key: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            key: key.into(),
            value,
            metadata: serde_json::Map::new(),
            created_at: Utc::now(),
            ttl_seconds: None,
        }
    }

    /// Attach a TTL.
    pub fn with_ttl(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = Some(ttl_seconds);
        self
    }

    /// Attach metadata.
    pub fn with_metadata(mut self, metadata: serde_json::Map<String, serde_json::Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Whether the entry is no longer visible at `now`.
    ///
    /// An entry is never visible after `created_at + ttl_seconds` has
    /// elapsed; entries without a TTL never expire.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.ttl_seconds {
            Some(ttl) => now > self.created_at + Duration::seconds(ttl as i64),
            None => false,
        }
    }
}

/// Per-session, TTL-bound storage.
///
/// Expiry is evaluated lazily at read time. Implementations may sweep
/// expired entries proactively, but correctness never depends on the sweep
/// running. Concurrent sessions are fully independent.
#[async_trait]
pub trait ShortTermMemory: Send + Sync {
    /// Store a value under `(session_id, key)` with the given TTL.
    async fn store(
        &self,
        session_id: &str,
        key: &str,
        value: serde_json::Value,
        ttl_seconds: u64,
    ) -> std::result::Result<(), MemoryError>;

    /// Retrieve a live value, or `None` if absent or expired.
    async fn retrieve(
        &self,
        session_id: &str,
        key: &str,
    ) -> std::result::Result<Option<serde_json::Value>, MemoryError>;

    /// All live entries for a session, keyed by entry key.
    async fn get_all(
        &self,
        session_id: &str,
    ) -> std::result::Result<serde_json::Map<String, serde_json::Value>, MemoryError>;

    /// Drop all entries for a session.
    async fn clear(&self, session_id: &str) -> std::result::Result<(), MemoryError>;
}

/// Cross-session, unbounded storage with substring search.
#[async_trait]
pub trait LongTermMemory: Send + Sync {
    /// Store a value globally under `key`.
    async fn store(
        &self,
        key: &str,
        value: serde_json::Value,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> std::result::Result<(), MemoryError>;

    /// Retrieve a value, or `None` if absent.
    async fn retrieve(
        &self,
        key: &str,
    ) -> std::result::Result<Option<serde_json::Value>, MemoryError>;

    /// Case-insensitive substring search over key and serialized value.
    ///
    /// Returns at most `limit` entries in insertion order among matches.
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> std::result::Result<Vec<MemoryEntry>, MemoryError>;

    /// Remove an entry. Returns whether anything was deleted.
    async fn delete(&self, key: &str) -> std::result::Result<bool, MemoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_without_ttl_never_expires() {
        let entry = MemoryEntry::new("k", serde_json::json!("v"));
        let far_future = Utc::now() + Duration::days(365 * 100);
        assert!(!entry.is_expired_at(far_future));
    }

    #[test]
    fn entry_expires_strictly_after_ttl() {
        let entry = MemoryEntry::new("k", serde_json::json!("v")).with_ttl(60);
        let at_boundary = entry.created_at + Duration::seconds(60);
        let just_past = at_boundary + Duration::milliseconds(100);

        assert!(!entry.is_expired_at(at_boundary));
        assert!(entry.is_expired_at(just_past));
    }

    #[test]
    fn entry_serialization_skips_absent_ttl() {
        let entry = MemoryEntry::new("pattern:sales", serde_json::json!({"agent": "sales"}));
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("ttl_seconds"));
    }
}
