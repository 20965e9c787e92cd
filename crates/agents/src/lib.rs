//! HTTP agent invocation client.
//!
//! Each downstream agent is an independently hosted query-answering service
//! reached by name through a configured endpoint. The invoker POSTs the
//! query plus conversation context and returns the agent's answer and
//! source citations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use switchboard_config::AgentConfig;
use switchboard_core::error::InvocationError;
use switchboard_core::invoker::{AgentInvoker, AgentResponse, SourceRef};
use switchboard_core::state::HistoryMessage;
use tracing::{debug, warn};

/// One resolvable agent endpoint.
#[derive(Debug, Clone)]
struct AgentEndpoint {
    endpoint: String,
    timeout_secs: u64,
}

/// Invokes downstream agents over HTTP, resolving names through the
/// configured registry.
pub struct HttpAgentInvoker {
    endpoints: HashMap<String, AgentEndpoint>,
    client: reqwest::Client,
}

impl HttpAgentInvoker {
    /// Build the registry from the configured agent catalog.
    pub fn new(agents: &[AgentConfig]) -> Result<Self, InvocationError> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            InvocationError::Network {
                agent: "<registry>".into(),
                reason: e.to_string(),
            }
        })?;

        let endpoints = agents
            .iter()
            .map(|a| {
                (
                    a.name.clone(),
                    AgentEndpoint {
                        endpoint: a.endpoint.clone(),
                        timeout_secs: a.timeout_secs,
                    },
                )
            })
            .collect();

        let invoker = Self { endpoints, client };
        debug!(agents = ?invoker.registered(), "Agent registry built");
        Ok(invoker)
    }

    /// Names of all registered agents.
    pub fn registered(&self) -> Vec<&str> {
        self.endpoints.keys().map(String::as_str).collect()
    }
}

#[async_trait]
impl AgentInvoker for HttpAgentInvoker {
    fn name(&self) -> &str {
        "http"
    }

    fn knows(&self, agent_name: &str) -> bool {
        self.endpoints.contains_key(agent_name)
    }

    async fn invoke(
        &self,
        agent_name: &str,
        query: &str,
        session_id: &str,
        context: &serde_json::Map<String, serde_json::Value>,
        history: &[HistoryMessage],
    ) -> Result<AgentResponse, InvocationError> {
        let endpoint = self
            .endpoints
            .get(agent_name)
            .ok_or_else(|| InvocationError::UnknownAgent(agent_name.to_string()))?;

        let body = AgentRequestWire {
            query,
            session_id,
            context,
            history,
        };

        debug!(agent = %agent_name, endpoint = %endpoint.endpoint, "Invoking agent");

        let response = self
            .client
            .post(&endpoint.endpoint)
            .timeout(std::time::Duration::from_secs(endpoint.timeout_secs))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InvocationError::Timeout {
                        agent: agent_name.to_string(),
                        timeout_secs: endpoint.timeout_secs,
                    }
                } else {
                    InvocationError::Network {
                        agent: agent_name.to_string(),
                        reason: e.to_string(),
                    }
                }
            })?;

        let status = response.status().as_u16();
        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(agent = %agent_name, status, body = %error_body, "Agent returned error");
            return Err(InvocationError::AgentError {
                agent: agent_name.to_string(),
                status_code: status,
                message: error_body,
            });
        }

        let wire: AgentResponseWire =
            response
                .json()
                .await
                .map_err(|e| InvocationError::InvalidResponse {
                    agent: agent_name.to_string(),
                    reason: e.to_string(),
                })?;

        Ok(AgentResponse {
            agent_name: agent_name.to_string(),
            response_text: wire.response,
            sources: wire
                .sources
                .into_iter()
                .map(|s| SourceRef {
                    title: s.title,
                    url: s.url,
                })
                .collect(),
        })
    }
}

// --- Wire types (internal) ---

#[derive(Serialize)]
struct AgentRequestWire<'a> {
    query: &'a str,
    session_id: &'a str,
    context: &'a serde_json::Map<String, serde_json::Value>,
    history: &'a [HistoryMessage],
}

#[derive(Deserialize)]
struct AgentResponseWire {
    response: String,
    #[serde(default)]
    sources: Vec<SourceWire>,
}

#[derive(Deserialize)]
struct SourceWire {
    title: String,
    #[serde(default)]
    url: Option<String>,
}
