//! Error types for the Switchboard domain.
//!
//! Uses `thiserror` for ergonomic error definitions. Each bounded context
//! has its own error enum; there is no shared top-level wrapper, callers
//! handle the enum of the subsystem they talk to.

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PlannerError {
    #[error("Plan parse failure: {0}")]
    PlanParse(String),

    #[error("Executor decision failure: {0}")]
    DecisionParse(String),

    #[error("Reasoning request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by reasoning endpoint, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

#[derive(Debug, Clone, Error)]
pub enum InvocationError {
    #[error("Agent not registered: {0}")]
    UnknownAgent(String),

    #[error("Agent '{agent}' returned error: {message} (status: {status_code})")]
    AgentError {
        agent: String,
        status_code: u16,
        message: String,
    },

    #[error("Agent '{agent}' timed out after {timeout_secs}s")]
    Timeout { agent: String, timeout_secs: u64 },

    #[error("Network error reaching agent '{agent}': {reason}")]
    Network { agent: String, reason: String },

    #[error("Unparseable agent response from '{agent}': {reason}")]
    InvalidResponse { agent: String, reason: String },
}

#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Write failed for key '{key}': {reason}")]
    WriteFailed { key: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Plan parse error: {0}")]
    PlanParse(String),

    #[error("Executor decision error: {0}")]
    ExecutorDecision(String),

    #[error("Unknown agent '{agent}': not in the configured registry")]
    UnknownAgent { agent: String },

    #[error("Agent invocation failed: {0}")]
    AgentInvocation(String),

    #[error("Memory write error: {0}")]
    MemoryWrite(String),

    #[error("Iteration limit reached: {iterations} iterations exceed the bound of {max}")]
    IterationLimit { iterations: u32, max: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn planner_error_displays_correctly() {
        let err = PlannerError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn unknown_agent_error_names_the_agent() {
        let err = EngineError::UnknownAgent {
            agent: "sql_oracle".into(),
        };
        assert!(err.to_string().contains("sql_oracle"));
        assert!(err.to_string().contains("registry"));
    }

    #[test]
    fn iteration_limit_error_carries_bound() {
        let err = EngineError::IterationLimit {
            iterations: 11,
            max: 10,
        };
        assert!(err.to_string().contains("11"));
        assert!(err.to_string().contains("10"));
    }

    #[test]
    fn invocation_timeout_names_agent_and_bound() {
        let err = InvocationError::Timeout {
            agent: "docs".into(),
            timeout_secs: 30,
        };
        assert!(err.to_string().contains("docs"));
        assert!(err.to_string().contains("30"));
    }
}
