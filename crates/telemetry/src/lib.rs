//! Trace records and sinks for Switchboard.
//!
//! The engine emits one trace record per request (the full final session
//! state plus a duration metric) to a fire-and-forget sink. A sink failure
//! must never affect the user-visible response, so `emit` is infallible at
//! the call site: implementations log and swallow their own errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

/// One audit record emitted after a request leaves the workflow graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceRecord {
    /// Unique id for this emission
    pub trace_id: String,

    /// The conversation this request belonged to
    pub session_id: String,

    /// The user utterance that started the request
    pub query: String,

    /// Terminal status ("completed" or "failed")
    pub status: String,

    /// Agents selected by the routing decision, in invocation order
    #[serde(default)]
    pub selected_agents: Vec<String>,

    /// Wall-clock duration of the request
    pub elapsed_seconds: f64,

    /// When the record was emitted
    pub recorded_at: DateTime<Utc>,

    /// Full final session state, serialized for audit
    pub state: serde_json::Value,
}

impl TraceRecord {
    /// Create a record stamped now with a fresh trace id.
    pub fn new(
        session_id: impl Into<String>,
        query: impl Into<String>,
        status: impl Into<String>,
        selected_agents: Vec<String>,
        elapsed_seconds: f64,
        state: serde_json::Value,
    ) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            query: query.into(),
            status: status.into(),
            selected_agents,
            elapsed_seconds,
            recorded_at: Utc::now(),
            state,
        }
    }
}

/// Fire-and-forget destination for trace records.
#[async_trait]
pub trait TraceSink: Send + Sync {
    /// Deliver one record. Implementations swallow their own failures.
    async fn emit(&self, record: TraceRecord);
}

/// Sink that writes records to the process log via `tracing`.
pub struct LogSink;

#[async_trait]
impl TraceSink for LogSink {
    async fn emit(&self, record: TraceRecord) {
        tracing::info!(
            trace_id = %record.trace_id,
            session_id = %record.session_id,
            status = %record.status,
            agents = ?record.selected_agents,
            elapsed_seconds = record.elapsed_seconds,
            "Request trace"
        );
    }
}

/// Sink that keeps records in memory, for tests and diagnostics.
pub struct CollectingSink {
    records: Mutex<Vec<TraceRecord>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of everything emitted so far.
    pub async fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().await.clone()
    }
}

impl Default for CollectingSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TraceSink for CollectingSink {
    async fn emit(&self, record: TraceRecord) {
        self.records.lock().await.push(record);
    }
}
