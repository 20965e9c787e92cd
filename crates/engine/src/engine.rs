//! The supervisor workflow engine.
//!
//! Executes a fixed directed graph of nodes against a single per-request
//! `SessionState` record. Nodes run strictly sequentially; every external
//! call is the sole suspension point of its node, and execution resumes
//! deterministically with that node's result before any edge is evaluated.
//!
//! The "loop back to plan_request / execute_plan" edges are implemented as
//! an explicit bounded iteration counter, not call-stack recursion, so
//! termination and stack usage stay predictable.

use std::sync::Arc;
use switchboard_config::EngineConfig;
use switchboard_core::error::EngineError;
use switchboard_core::invoker::{AgentInvoker, AgentResponse};
use switchboard_core::memory::{LongTermMemory, ShortTermMemory};
use switchboard_core::plan::{AgentDescriptor, RoutingDecision};
use switchboard_core::planner::Planner;
use switchboard_core::state::{HistoryMessage, SessionState, SessionStatus};
use switchboard_telemetry::{LogSink, TraceRecord, TraceSink};
use tracing::{debug, info, warn};

use crate::combine::{combine_responses, merge_sources};
use crate::response::SupervisorResponse;

/// Short-term memory key holding the bounded conversational history.
const HISTORY_KEY: &str = "history";
/// Short-term memory key holding the current plan.
const PLAN_KEY: &str = "plan";
/// How many long-term pattern records are surfaced into agent context.
const PATTERN_RECALL_LIMIT: usize = 3;

/// One unit of work in the workflow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowNode {
    LoadState,
    PlanRequest,
    ExecutePlan,
    InvokeAgents,
    CombineResponses,
    AdvancePlan,
    UpdateMemory,
    LogObservability,
    HandleError,
    End,
}

impl WorkflowNode {
    /// The node name recorded on the state record for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadState => "load_state",
            Self::PlanRequest => "plan_request",
            Self::ExecutePlan => "execute_plan",
            Self::InvokeAgents => "invoke_agents",
            Self::CombineResponses => "combine_responses",
            Self::AdvancePlan => "advance_plan",
            Self::UpdateMemory => "update_memory",
            Self::LogObservability => "log_observability",
            Self::HandleError => "handle_error",
            Self::End => "end",
        }
    }
}

/// The supervisor engine: sequences planner, agents, combiner, and memory
/// per request.
pub struct SupervisorEngine {
    /// Planner/executor client
    planner: Arc<dyn Planner>,

    /// Agent invocation client
    invoker: Arc<dyn AgentInvoker>,

    /// Session-scoped TTL store
    short_term: Arc<dyn ShortTermMemory>,

    /// Cross-session pattern store
    long_term: Arc<dyn LongTermMemory>,

    /// Trace destination (fire-and-forget)
    trace_sink: Arc<dyn TraceSink>,

    /// Agent catalog handed to the planner
    catalog: Vec<AgentDescriptor>,

    /// Static routing guidelines embedded in planner prompts
    guidelines: String,

    /// Limits and thresholds
    config: EngineConfig,
}

impl SupervisorEngine {
    /// Create an engine over the given collaborators and agent catalog.
    pub fn new(
        planner: Arc<dyn Planner>,
        invoker: Arc<dyn AgentInvoker>,
        short_term: Arc<dyn ShortTermMemory>,
        long_term: Arc<dyn LongTermMemory>,
        catalog: Vec<AgentDescriptor>,
    ) -> Self {
        Self {
            planner,
            invoker,
            short_term,
            long_term,
            trace_sink: Arc::new(LogSink),
            catalog,
            guidelines: String::new(),
            config: EngineConfig::default(),
        }
    }

    /// Replace the default log-based trace sink.
    pub fn with_trace_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.trace_sink = sink;
        self
    }

    /// Set routing guidelines passed to the planner.
    pub fn with_guidelines(mut self, guidelines: impl Into<String>) -> Self {
        self.guidelines = guidelines.into();
        self
    }

    /// Override engine limits and thresholds.
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// The sole entry point: run one request through the workflow graph.
    ///
    /// Never returns an error: a failed request produces a well-formed
    /// response with `status = failed` and a non-empty `error` field.
    pub async fn process_request(
        &self,
        query: &str,
        session_id: &str,
        context: serde_json::Map<String, serde_json::Value>,
        metadata: serde_json::Map<String, serde_json::Value>,
    ) -> SupervisorResponse {
        let mut state = SessionState::new(query, session_id, context);
        if !metadata.is_empty() {
            state
                .context
                .insert("metadata".into(), serde_json::Value::Object(metadata));
        }

        info!(session_id = %state.session_id, "Processing request");

        // Sub-query chosen by the executor for the current invocation round
        let mut sub_query: Option<String> = None;
        // Agent responses accumulated across all rounds of the current plan;
        // a replan discards them along with the plan they answered
        let mut collected: Vec<AgentResponse> = Vec::new();
        let mut iterations: u32 = 0;
        let mut node = WorkflowNode::LoadState;

        loop {
            if node != WorkflowNode::End && node != WorkflowNode::HandleError {
                state.current_step = node.name().into();
            }
            debug!(session_id = %state.session_id, node = node.name(), "Entering node");

            node = match node {
                WorkflowNode::LoadState => {
                    self.load_state(&mut state).await;
                    WorkflowNode::PlanRequest
                }

                WorkflowNode::PlanRequest => {
                    iterations += 1;
                    if iterations > self.config.max_iterations {
                        state.fail(
                            EngineError::IterationLimit {
                                iterations,
                                max: self.config.max_iterations,
                            }
                            .to_string(),
                        );
                        WorkflowNode::HandleError
                    } else {
                        match self.plan_request(&mut state).await {
                            Ok(()) => WorkflowNode::ExecutePlan,
                            Err(e) => {
                                state.fail(e.to_string());
                                WorkflowNode::HandleError
                            }
                        }
                    }
                }

                WorkflowNode::ExecutePlan => {
                    iterations += 1;
                    if iterations > self.config.max_iterations {
                        state.fail(
                            EngineError::IterationLimit {
                                iterations,
                                max: self.config.max_iterations,
                            }
                            .to_string(),
                        );
                        WorkflowNode::HandleError
                    } else {
                        match self.execute_plan(&mut state).await {
                            Ok(chosen) => {
                                sub_query = chosen;
                                WorkflowNode::InvokeAgents
                            }
                            Err(e) => {
                                state.fail(e.to_string());
                                WorkflowNode::HandleError
                            }
                        }
                    }
                }

                WorkflowNode::InvokeAgents => {
                    let round_query = sub_query.as_deref().unwrap_or(&state.query).to_string();
                    match self.invoke_agents(&mut state, &round_query).await {
                        Ok(()) => WorkflowNode::CombineResponses,
                        Err(e) => {
                            state.fail(e.to_string());
                            WorkflowNode::HandleError
                        }
                    }
                }

                WorkflowNode::CombineResponses => {
                    let unavailable: Vec<String> = state
                        .agent_responses
                        .iter()
                        .filter(|r| r.is_placeholder())
                        .map(|r| r.agent_name.clone())
                        .collect();
                    if !unavailable.is_empty() {
                        warn!(agents = ?unavailable, "Answer degraded, some agents unavailable");
                    }

                    collected.extend(state.agent_responses.iter().cloned());
                    let (text, sources) = combine_responses(&collected);
                    debug!(
                        responses = collected.len(),
                        sources = sources.len(),
                        "Combined agent responses"
                    );
                    state.final_response = Some(text);
                    WorkflowNode::AdvancePlan
                }

                WorkflowNode::AdvancePlan => {
                    if state.replan_flag {
                        state.replan_flag = false;
                        collected.clear();
                        debug!(session_id = %state.session_id, "Replan signaled, returning to planner");
                        WorkflowNode::PlanRequest
                    } else if state.has_remaining_steps() {
                        state.plan_current_step += 1;
                        WorkflowNode::ExecutePlan
                    } else {
                        WorkflowNode::UpdateMemory
                    }
                }

                WorkflowNode::UpdateMemory => match self.update_memory(&mut state).await {
                    Ok(()) => WorkflowNode::LogObservability,
                    Err(e) => {
                        state.fail(e.to_string());
                        WorkflowNode::HandleError
                    }
                },

                WorkflowNode::LogObservability => {
                    state.status = SessionStatus::Completed;
                    state.current_step = WorkflowNode::LogObservability.name().into();
                    self.emit_trace(&state).await;
                    WorkflowNode::End
                }

                WorkflowNode::HandleError => {
                    warn!(
                        session_id = %state.session_id,
                        error = state.error.as_deref().unwrap_or("unknown"),
                        "Request failed"
                    );
                    self.emit_trace(&state).await;
                    WorkflowNode::End
                }

                WorkflowNode::End => break,
            };

            if node == WorkflowNode::End {
                break;
            }
        }

        info!(
            session_id = %state.session_id,
            status = %state.status,
            "Request finished"
        );

        let mut response = SupervisorResponse::from_state(&state);
        // Sources span every combined round, not just the final one
        response.sources = merge_sources(&collected);
        response
    }

    /// `load_state`: pull prior history from short-term memory, append the
    /// current query, and seed the agent context.
    ///
    /// Memory recall failures are warnings, not request failures; a fresh
    /// session and an unreadable one look the same from here.
    async fn load_state(&self, state: &mut SessionState) {
        state.status = SessionStatus::Processing;

        match self.short_term.retrieve(&state.session_id, HISTORY_KEY).await {
            Ok(Some(value)) => {
                match serde_json::from_value::<Vec<HistoryMessage>>(value) {
                    Ok(history) => {
                        debug!(turns = history.len(), "Recalled session history");
                        state.history = history;
                    }
                    Err(e) => warn!("Stored history is unreadable: {e}"),
                }
            }
            Ok(None) => {}
            Err(e) => warn!("Short-term memory recall failed: {e}"),
        }

        state.push_history(
            HistoryMessage::user(state.query.clone()),
            self.config.history_limit,
        );

        // Context enrichment forwarded to agents: recent turns and any
        // matching long-term patterns.
        if let Ok(history_value) = serde_json::to_value(&state.history) {
            state.context.insert("history".into(), history_value);
        }
        match self.long_term.search(&state.query, PATTERN_RECALL_LIMIT).await {
            Ok(patterns) if !patterns.is_empty() => {
                let values: Vec<serde_json::Value> =
                    patterns.into_iter().map(|p| p.value).collect();
                state
                    .context
                    .insert("memory_patterns".into(), serde_json::Value::Array(values));
            }
            Ok(_) => {}
            Err(e) => warn!("Long-term pattern recall failed: {e}"),
        }
    }

    /// `plan_request`: ask the planner for a numbered plan.
    async fn plan_request(&self, state: &mut SessionState) -> Result<(), EngineError> {
        let steps = self
            .planner
            .plan(&state.query, &self.catalog, &self.guidelines)
            .await
            .map_err(|e| EngineError::PlanParse(e.to_string()))?;

        info!(steps = steps.len(), "Plan produced");
        state.plan = steps;
        state.plan_current_step = 0;
        Ok(())
    }

    /// `execute_plan`: ask the executor for the next action and normalize it
    /// into the routing decision. Returns the sub-query for the round.
    ///
    /// An executor decision naming an agent outside the configured registry
    /// fails the request here, before any invocation is attempted.
    async fn execute_plan(&self, state: &mut SessionState) -> Result<Option<String>, EngineError> {
        let step = state
            .current_plan_step()
            .cloned()
            .ok_or_else(|| EngineError::ExecutorDecision("plan cursor past end of plan".into()))?;

        let decision = self
            .planner
            .decide_next(&state.query, &step, &self.guidelines)
            .await
            .map_err(|e| EngineError::ExecutorDecision(e.to_string()))?;

        let routing = RoutingDecision::from_decision(&decision);

        for agent in &routing.agents_to_call {
            if !self.invoker.knows(agent) {
                return Err(EngineError::UnknownAgent {
                    agent: agent.clone(),
                });
            }
        }

        info!(
            agents = ?routing.agents_to_call,
            confidence = routing.confidence,
            replan = decision.replan,
            "Routing decision"
        );

        state.replan_flag = decision.replan;
        state.routing_decision = Some(routing);
        Ok(Some(decision.sub_query).filter(|q| !q.is_empty()))
    }

    /// `invoke_agents`: call each selected agent in list order.
    ///
    /// With several agents, a single failure degrades to a placeholder so a
    /// partial answer is still possible; with exactly one agent there is no
    /// partial result, so the failure propagates.
    async fn invoke_agents(
        &self,
        state: &mut SessionState,
        round_query: &str,
    ) -> Result<(), EngineError> {
        let agents = state
            .routing_decision
            .as_ref()
            .map(|r| r.agents_to_call.clone())
            .unwrap_or_default();

        state.agent_responses.clear();

        let multi = agents.len() > 1;
        for agent_name in &agents {
            let result = self
                .invoker
                .invoke(
                    agent_name,
                    round_query,
                    &state.session_id,
                    &state.context,
                    &state.history,
                )
                .await;

            match result {
                Ok(response) => {
                    debug!(agent = %agent_name, "Agent responded");
                    state.agent_responses.push(response);
                }
                Err(e) if multi => {
                    warn!(agent = %agent_name, error = %e, "Agent unavailable, substituting placeholder");
                    state
                        .agent_responses
                        .push(AgentResponse::unavailable(agent_name.clone()));
                }
                Err(e) => {
                    return Err(EngineError::AgentInvocation(e.to_string()));
                }
            }
        }

        Ok(())
    }

    /// `update_memory`: persist the assistant turn and the plan to
    /// short-term memory; record a long-term pattern when routing
    /// confidence clears the threshold.
    async fn update_memory(&self, state: &mut SessionState) -> Result<(), EngineError> {
        if let Some(final_response) = state.final_response.clone() {
            state.push_history(
                HistoryMessage::assistant(final_response),
                self.config.history_limit,
            );
        }

        let history_value = serde_json::to_value(&state.history)
            .map_err(|e| EngineError::MemoryWrite(e.to_string()))?;
        self.short_term
            .store(
                &state.session_id,
                HISTORY_KEY,
                history_value,
                self.config.short_term_ttl_secs,
            )
            .await
            .map_err(|e| EngineError::MemoryWrite(e.to_string()))?;

        let plan_value = serde_json::to_value(&state.plan)
            .map_err(|e| EngineError::MemoryWrite(e.to_string()))?;
        self.short_term
            .store(
                &state.session_id,
                PLAN_KEY,
                plan_value,
                self.config.short_term_ttl_secs,
            )
            .await
            .map_err(|e| EngineError::MemoryWrite(e.to_string()))?;

        if let Some(routing) = &state.routing_decision {
            if routing.confidence > self.config.confidence_threshold {
                let key = format!("pattern:{}", state.query);
                let value = serde_json::json!({
                    "query": state.query,
                    "agents": routing.agents_to_call,
                    "reason": routing.routing_reason,
                    "confidence": routing.confidence,
                });
                let mut metadata = serde_json::Map::new();
                metadata.insert(
                    "session_id".into(),
                    serde_json::Value::String(state.session_id.clone()),
                );

                self.long_term
                    .store(&key, value, metadata)
                    .await
                    .map_err(|e| EngineError::MemoryWrite(e.to_string()))?;
                info!(
                    confidence = routing.confidence,
                    "Recorded high-confidence routing pattern"
                );
            }
        }

        Ok(())
    }

    /// Emit the audit trace. Fire-and-forget: the sink swallows its own
    /// failures and the user-visible response is never affected.
    async fn emit_trace(&self, state: &SessionState) {
        let selected_agents = state
            .routing_decision
            .as_ref()
            .map(|r| r.agents_to_call.clone())
            .unwrap_or_default();

        let snapshot = serde_json::to_value(state).unwrap_or(serde_json::Value::Null);
        let record = TraceRecord::new(
            state.session_id.clone(),
            state.query.clone(),
            state.status.to_string(),
            selected_agents,
            state.elapsed_seconds(),
            snapshot,
        );
        self.trace_sink.emit(record).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_names_match_graph() {
        assert_eq!(WorkflowNode::LoadState.name(), "load_state");
        assert_eq!(WorkflowNode::PlanRequest.name(), "plan_request");
        assert_eq!(WorkflowNode::InvokeAgents.name(), "invoke_agents");
        assert_eq!(WorkflowNode::HandleError.name(), "handle_error");
    }
}
