//! Agent invocation trait and response value objects.
//!
//! An agent is an external, independently hosted query-answering service
//! invoked by name. The invoker sends one query plus conversation context
//! and returns the agent's answer and any source citations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::InvocationError;
use crate::state::HistoryMessage;

/// Placeholder answer text substituted when one agent of a multi-agent
/// round fails.
pub const UNAVAILABLE_MARKER: &str = "<unavailable>";

/// A source citation attached to an agent's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Display title
    pub title: String,

    /// Optional link
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl SourceRef {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// One agent's answer for the current invocation round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Which agent answered
    pub agent_name: String,

    /// The answer text
    pub response_text: String,

    /// Source citations, possibly empty
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

impl AgentResponse {
    /// The degraded placeholder returned when an agent in a multi-agent
    /// round is unreachable.
    pub fn unavailable(agent_name: impl Into<String>) -> Self {
        Self {
            agent_name: agent_name.into(),
            response_text: UNAVAILABLE_MARKER.into(),
            sources: Vec::new(),
        }
    }

    /// Whether this response is the degraded placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.response_text == UNAVAILABLE_MARKER
    }
}

/// The agent invocation client.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    /// A human-readable name for this invoker (e.g. "http").
    fn name(&self) -> &str;

    /// Whether `agent_name` is resolvable by this invoker.
    fn knows(&self, agent_name: &str) -> bool;

    /// Send `query` to the named agent with session context and history.
    async fn invoke(
        &self,
        agent_name: &str,
        query: &str,
        session_id: &str,
        context: &serde_json::Map<String, serde_json::Value>,
        history: &[HistoryMessage],
    ) -> std::result::Result<AgentResponse, InvocationError>;
}
