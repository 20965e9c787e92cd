//! The response object returned from `process_request`.
//!
//! Callers never see a thrown error: a failed request still returns a
//! well-formed response with `status = failed` and a non-empty `error`
//! field, carrying the session id so the caller can retry.

use serde::{Deserialize, Serialize};
use switchboard_core::invoker::SourceRef;
use switchboard_core::state::{SessionState, SessionStatus};

use crate::combine::merge_sources;

/// The consolidated result of one supervised request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorResponse {
    /// The combined answer text (empty when the request failed)
    pub response_text: String,

    /// Agents invoked for this request, in invocation order
    #[serde(default)]
    pub selected_agents: Vec<String>,

    /// Routing rationale from the executor
    #[serde(default)]
    pub routing_reason: String,

    /// Routing confidence in [0, 1]
    #[serde(default)]
    pub confidence: f32,

    /// Merged source citations across all agent responses
    #[serde(default)]
    pub sources: Vec<SourceRef>,

    /// Wall-clock duration of the request
    pub elapsed_seconds: f64,

    /// The conversation this request belonged to
    pub session_id: String,

    /// Terminal status: `completed` or `failed`
    pub status: SessionStatus,

    /// Diagnostic message, present exactly when `status = failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SupervisorResponse {
    /// Project the terminal session state into the caller-facing response.
    pub fn from_state(state: &SessionState) -> Self {
        let (selected_agents, routing_reason, confidence) = match &state.routing_decision {
            Some(decision) => (
                decision.agents_to_call.clone(),
                decision.routing_reason.clone(),
                decision.confidence,
            ),
            None => (Vec::new(), String::new(), 0.0),
        };

        Self {
            response_text: state.final_response.clone().unwrap_or_default(),
            selected_agents,
            routing_reason,
            confidence,
            sources: merge_sources(&state.agent_responses),
            elapsed_seconds: state.elapsed_seconds(),
            session_id: state.session_id.clone(),
            status: state.status,
            error: state.error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use switchboard_core::plan::RoutingDecision;

    #[test]
    fn failed_state_projects_to_well_formed_response() {
        let mut state = SessionState::new("q", "sess-3", serde_json::Map::new());
        state.fail("planner exploded");

        let response = SupervisorResponse::from_state(&state);
        assert_eq!(response.status, SessionStatus::Failed);
        assert_eq!(response.session_id, "sess-3");
        assert!(response.response_text.is_empty());
        assert!(!response.error.as_deref().unwrap_or_default().is_empty());
    }

    #[test]
    fn completed_state_carries_routing_fields() {
        let mut state = SessionState::new("q", "sess-4", serde_json::Map::new());
        state.routing_decision = Some(RoutingDecision {
            agents_to_call: vec!["structured_data".into()],
            routing_reason: "numeric question".into(),
            confidence: 0.9,
        });
        state.final_response = Some("$1,234,567".into());
        state.status = SessionStatus::Completed;

        let response = SupervisorResponse::from_state(&state);
        assert_eq!(response.response_text, "$1,234,567");
        assert_eq!(response.selected_agents, vec!["structured_data".to_string()]);
        assert!((response.confidence - 0.9).abs() < f32::EPSILON);
        assert!(response.error.is_none());
    }
}
