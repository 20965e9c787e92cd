//! Planner trait: the abstraction over the external reasoning service.
//!
//! The planner does two things: produce a numbered plan from a query, and
//! decide the next action for one plan step. Both calls are synchronous
//! round-trips from the engine's perspective; a timeout is surfaced as an
//! error indistinguishable (to the engine) from a parse failure.

use async_trait::async_trait;

use crate::error::PlannerError;
use crate::plan::{AgentDescriptor, ExecutorDecision, PlanStep};

/// The planner/executor client.
///
/// Implementations: HTTP client against a reasoning-model endpoint, scripted
/// mocks for tests. The engine calls through this trait without knowing
/// which is behind it.
#[async_trait]
pub trait Planner: Send + Sync {
    /// A human-readable name for this planner (e.g. "openai_compat").
    fn name(&self) -> &str;

    /// Produce an ordered plan for `query` given the agent catalog.
    ///
    /// Fails with [`PlannerError::PlanParse`] when the response cannot be
    /// parsed into the expected step schema.
    async fn plan(
        &self,
        query: &str,
        catalog: &[AgentDescriptor],
        guidelines: &str,
    ) -> std::result::Result<Vec<PlanStep>, PlannerError>;

    /// Decide the next agent, sub-query, and replan signal for one step.
    async fn decide_next(
        &self,
        query: &str,
        current_step: &PlanStep,
        guidelines: &str,
    ) -> std::result::Result<ExecutorDecision, PlannerError>;
}
