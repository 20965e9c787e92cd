//! Plan and routing value objects.
//!
//! A plan is an ordered set of steps produced by the planner, each naming a
//! candidate agent and an action. The executor consumes one step at a time
//! and emits a decision that the engine normalizes into a `RoutingDecision`.

use serde::{Deserialize, Serialize};

/// One step of a numbered plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Position in the plan (0-based)
    pub step_index: usize,

    /// Which agent the planner expects to handle this step
    pub agent_hint: String,

    /// What the step should accomplish
    pub action_description: String,
}

/// A catalog entry describing one downstream agent to the planner.
///
/// Agent identity is a plain string name resolved via configuration; nothing
/// here is hardcoded to a specific agent implementation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDescriptor {
    /// Registered agent name (e.g. "structured_data", "doc_search")
    pub name: String,

    /// What the agent is good at, shown to the planner
    pub description: String,
}

/// The raw next-action output of the executor for one plan step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorDecision {
    /// The agent to invoke next
    pub agent_name: String,

    /// The sub-query to send that agent
    pub sub_query: String,

    /// Why this agent was chosen
    pub reason: String,

    /// When true, the engine returns control to the planner
    #[serde(default)]
    pub replan: bool,

    /// Executor self-reported confidence, clamped to [0, 1]
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    0.5
}

/// The normalized routing output consumed by invocation and combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// Agents to invoke, in order
    pub agents_to_call: Vec<String>,

    /// Human-readable routing rationale
    pub routing_reason: String,

    /// Confidence in [0, 1]; values above the configured threshold trigger
    /// a long-term memory write
    pub confidence: f32,
}

impl RoutingDecision {
    /// Build a routing decision from an executor decision, clamping the
    /// confidence into [0, 1].
    ///
    /// The executor may name several agents separated by commas
    /// (`"structured_data,doc_search"`); each becomes one invocation, in
    /// the order written.
    pub fn from_decision(decision: &ExecutorDecision) -> Self {
        let agents_to_call = decision
            .agent_name
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            agents_to_call,
            routing_reason: decision.reason.clone(),
            confidence: decision.confidence.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_defaults_apply() {
        let json = r#"{"agent_name":"docs","sub_query":"find the manual","reason":"doc question"}"#;
        let decision: ExecutorDecision = serde_json::from_str(json).unwrap();
        assert!(!decision.replan);
        assert!((decision.confidence - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn routing_decision_clamps_confidence() {
        let decision = ExecutorDecision {
            agent_name: "sales".into(),
            sub_query: "q".into(),
            reason: "r".into(),
            replan: false,
            confidence: 1.7,
        };
        let routing = RoutingDecision::from_decision(&decision);
        assert_eq!(routing.agents_to_call, vec!["sales".to_string()]);
        assert!((routing.confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn comma_separated_agents_fan_out_in_order() {
        let decision = ExecutorDecision {
            agent_name: "structured_data, doc_search".into(),
            sub_query: "q".into(),
            reason: "needs both".into(),
            replan: false,
            confidence: 0.6,
        };
        let routing = RoutingDecision::from_decision(&decision);
        assert_eq!(
            routing.agents_to_call,
            vec!["structured_data".to_string(), "doc_search".to_string()]
        );
    }

    #[test]
    fn empty_agent_name_yields_no_agents() {
        let decision = ExecutorDecision {
            agent_name: " ".into(),
            sub_query: "q".into(),
            reason: "nothing fits".into(),
            replan: false,
            confidence: 0.2,
        };
        let routing = RoutingDecision::from_decision(&decision);
        assert!(routing.agents_to_call.is_empty());
    }

    #[test]
    fn plan_step_roundtrip() {
        let step = PlanStep {
            step_index: 2,
            agent_hint: "doc_search".into(),
            action_description: "Find the Q3 report".into(),
        };
        let json = serde_json::to_string(&step).unwrap();
        let back: PlanStep = serde_json::from_str(&json).unwrap();
        assert_eq!(back, step);
    }
}
