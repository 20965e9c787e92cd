//! Session state: the single mutable record a request carries through the
//! workflow graph.
//!
//! One `SessionState` is created per request, owned exclusively by the engine
//! for the request's lifetime, and destroyed when the engine returns. Only
//! `history` and the plan data explicitly written into the memory stores
//! survive between requests for the same `session_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::invoker::AgentResponse;
use crate::plan::{PlanStep, RoutingDecision};

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created, not yet entered the graph
    Pending,
    /// Somewhere inside the workflow graph
    Processing,
    /// Terminal: final response produced
    Completed,
    /// Terminal: error recorded
    Failed,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// The speaker of a history entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn in the bounded conversational history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryMessage {
    /// Who spoke
    pub role: Role,

    /// The text content
    pub content: String,

    /// When the turn happened
    pub timestamp: DateTime<Utc>,
}

impl HistoryMessage {
    /// Create a user turn stamped with the current time.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create an assistant turn stamped with the current time.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The per-request state record mutated by the workflow engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    /// Opaque conversation identifier, stable across requests
    pub session_id: String,

    /// The current user utterance
    pub query: String,

    /// Ordered user/assistant turns, truncated to the most recent
    /// entries before storage
    #[serde(default)]
    pub history: Vec<HistoryMessage>,

    /// The plan produced by the planner, consumed by the executor
    #[serde(default)]
    pub plan: Vec<PlanStep>,

    /// Cursor into `plan`
    #[serde(default)]
    pub plan_current_step: usize,

    /// When true, control returns to the planner instead of advancing
    #[serde(default)]
    pub replan_flag: bool,

    /// Normalized executor output, present once agents have been selected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_decision: Option<RoutingDecision>,

    /// Responses collected during the current invocation round
    #[serde(default)]
    pub agent_responses: Vec<AgentResponse>,

    /// Written only by the combiner; the final write covers every
    /// invocation round of the surviving plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_response: Option<String>,

    /// Lifecycle status
    pub status: SessionStatus,

    /// Diagnostic string, set only when `status == Failed`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Free-form key/value map passed in by the caller and enriched by the
    /// engine before being forwarded to agents
    #[serde(default)]
    pub context: serde_json::Map<String, serde_json::Value>,

    /// Name of the node most recently executed (diagnostics)
    #[serde(default)]
    pub current_step: String,

    /// When this request entered the engine
    pub started_at: DateTime<Utc>,
}

impl SessionState {
    /// Create a fresh state record for one request.
    pub fn new(
        query: impl Into<String>,
        session_id: impl Into<String>,
        context: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            query: query.into(),
            history: Vec::new(),
            plan: Vec::new(),
            plan_current_step: 0,
            replan_flag: false,
            routing_decision: None,
            agent_responses: Vec::new(),
            final_response: None,
            status: SessionStatus::Pending,
            error: None,
            context,
            current_step: String::new(),
            started_at: Utc::now(),
        }
    }

    /// The plan step the cursor currently points at, if any.
    pub fn current_plan_step(&self) -> Option<&PlanStep> {
        self.plan.get(self.plan_current_step)
    }

    /// Whether steps remain beyond the cursor.
    pub fn has_remaining_steps(&self) -> bool {
        self.plan_current_step + 1 < self.plan.len()
    }

    /// Record a failure: sets status, error, and the diagnostic step marker.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = SessionStatus::Failed;
        self.error = Some(error.into());
        self.current_step = "error_handled".into();
    }

    /// Append a turn and keep only the most recent `limit` entries.
    pub fn push_history(&mut self, message: HistoryMessage, limit: usize) {
        self.history.push(message);
        if self.history.len() > limit {
            let excess = self.history.len() - limit;
            self.history.drain(..excess);
        }
    }

    /// Seconds elapsed since the request entered the engine.
    pub fn elapsed_seconds(&self) -> f64 {
        let micros = Utc::now()
            .signed_duration_since(self.started_at)
            .num_microseconds()
            .unwrap_or(0)
            .max(0);
        micros as f64 / 1_000_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_pending() {
        let state = SessionState::new("hello", "sess-1", serde_json::Map::new());
        assert_eq!(state.status, SessionStatus::Pending);
        assert!(state.history.is_empty());
        assert!(state.final_response.is_none());
        assert_eq!(state.plan_current_step, 0);
    }

    #[test]
    fn fail_records_error_and_step() {
        let mut state = SessionState::new("q", "s", serde_json::Map::new());
        state.fail("planner exploded");
        assert_eq!(state.status, SessionStatus::Failed);
        assert_eq!(state.error.as_deref(), Some("planner exploded"));
        assert_eq!(state.current_step, "error_handled");
    }

    #[test]
    fn history_bounded_to_limit() {
        let mut state = SessionState::new("q", "s", serde_json::Map::new());
        for i in 0..35 {
            state.push_history(HistoryMessage::user(format!("turn {i}")), 30);
        }
        assert_eq!(state.history.len(), 30);
        // Oldest retained entry is turn 5, newest is turn 34
        assert_eq!(state.history[0].content, "turn 5");
        assert_eq!(state.history[29].content, "turn 34");
    }

    #[test]
    fn plan_cursor_helpers() {
        use crate::plan::PlanStep;
        let mut state = SessionState::new("q", "s", serde_json::Map::new());
        state.plan = vec![
            PlanStep {
                step_index: 0,
                agent_hint: "sales".into(),
                action_description: "look up sales".into(),
            },
            PlanStep {
                step_index: 1,
                agent_hint: "docs".into(),
                action_description: "check the docs".into(),
            },
        ];
        assert!(state.has_remaining_steps());
        assert_eq!(state.current_plan_step().unwrap().agent_hint, "sales");

        state.plan_current_step = 1;
        assert!(!state.has_remaining_steps());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&SessionStatus::Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }

    #[test]
    fn state_serialization_roundtrip() {
        let mut state = SessionState::new("What were sales?", "sess-9", serde_json::Map::new());
        state.status = SessionStatus::Completed;
        state.final_response = Some("$1,234,567".into());

        let json = serde_json::to_string(&state).unwrap();
        let back: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back.session_id, "sess-9");
        assert_eq!(back.final_response.as_deref(), Some("$1,234,567"));
        assert_eq!(back.status, SessionStatus::Completed);
    }
}
